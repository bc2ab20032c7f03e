//! Stream generator leaves. Stream elements are map records of
//! `{data, idx, last}`: the payload, its zero-based position in the
//! batch and whether it closes the batch.

use arcstr::literal;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use weft_runtime::{CreateError, FuncIO, FuncProcess, FuncRegistry, Msg};

pub fn register(registry: &mut FuncRegistry) {
    registry.register("streamIntRange", stream_int_range);
}

pub fn stream_item(data: Msg, idx: i64, last: bool) -> Msg {
    Msg::map(IndexMap::from([
        (literal!("data"), data),
        (literal!("idx"), Msg::int(idx)),
        (literal!("last"), Msg::bool(last)),
    ]))
}

/// `{from, to -> data}`: per `(from, to)` pair, emit one batch of ints.
/// Ascending ranges exclude `to`; descending ranges include it, so
/// `(3, 0)` emits `3, 2, 1, 0` and `(n, n)` emits the single element
/// `n`. `idx` restarts at zero for every batch and `last` is true only
/// on the final element.
fn stream_int_range(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let from = io.input.single("from")?;
    let to = io.input.single("to")?;
    let data = io.output.single("data")?;
    Ok(Box::pin(async move {
        loop {
            let Some(from_msg) = from.receive(&token).await else {
                return;
            };
            let Some(to_msg) = to.receive(&token).await else {
                return;
            };
            let from_value = from_msg.as_int();
            let to_value = to_msg.as_int();
            let ascending = from_value < to_value;

            let mut idx: i64 = 0;
            let mut value = from_value;
            loop {
                let last = if ascending {
                    value == to_value - 1
                } else {
                    value == to_value
                };
                if !data.send(&token, stream_item(Msg::int(value), idx, last)).await {
                    return;
                }
                if last {
                    break;
                }
                idx += 1;
                value += if ascending { 1 } else { -1 };
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use weft_runtime::PortQueue;

    use super::*;

    fn scalar_io(
        input: &[(&str, Arc<PortQueue>)],
        output: &[(&str, Arc<PortQueue>)],
    ) -> FuncIO {
        let build = |spec: &[(&str, Arc<PortQueue>)]| {
            spec.iter()
                .map(|(name, queue)| (arcstr::ArcStr::from(*name), vec![queue.clone()]))
                .collect::<IndexMap<_, _>>()
        };
        FuncIO::new(build(input), build(output))
    }

    async fn batch_of(from_value: i64, to_value: i64) -> Vec<(i64, i64, bool)> {
        let from = PortQueue::bounded(1);
        let to = PortQueue::bounded(1);
        let data = PortQueue::bounded(16);
        let token = CancellationToken::new();
        let io = scalar_io(
            &[("from", from.clone()), ("to", to.clone())],
            &[("data", data.clone())],
        );
        let leaf = tokio::spawn(stream_int_range(io, None, token.clone()).unwrap());

        assert!(from.send(&token, Msg::int(from_value)).await);
        assert!(to.send(&token, Msg::int(to_value)).await);

        let mut batch = Vec::new();
        loop {
            let item = data.receive(&token).await.unwrap();
            let record = item.as_map();
            let last = record["last"].as_bool();
            batch.push((record["data"].as_int(), record["idx"].as_int(), last));
            if last {
                break;
            }
        }
        token.cancel();
        leaf.await.unwrap();
        batch
    }

    #[tokio::test]
    async fn ascending_range_excludes_the_upper_bound() {
        let batch = batch_of(0, 3).await;
        assert_eq!(
            batch,
            vec![(0, 0, false), (1, 1, false), (2, 2, true)]
        );
    }

    #[tokio::test]
    async fn descending_range_includes_the_lower_bound() {
        let batch = batch_of(3, 0).await;
        assert_eq!(
            batch,
            vec![(3, 0, false), (2, 1, false), (1, 2, false), (0, 3, true)]
        );
    }

    #[tokio::test]
    async fn degenerate_range_emits_a_single_final_element() {
        let batch = batch_of(5, 5).await;
        assert_eq!(batch, vec![(5, 0, true)]);
    }
}
