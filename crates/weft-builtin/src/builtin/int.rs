//! Integer arithmetic and comparison leaves. Binary leaves read `a`
//! before `b`, which keeps their I/O trace deterministic for a given
//! input sequence.

use tokio_util::sync::CancellationToken;
use weft_runtime::{CreateError, FuncIO, FuncProcess, FuncRegistry, Msg};

pub fn register(registry: &mut FuncRegistry) {
    registry.register("intAdd", int_add);
    registry.register("intSub", int_sub);
    registry.register("intDecrement", int_decrement);
    registry.register("intEq", int_eq);
    registry.register("intGreater", int_greater);
}

fn int_add(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let a = io.input.single("a")?;
    let b = io.input.single("b")?;
    let res = io.output.single("res")?;
    Ok(Box::pin(async move {
        loop {
            let Some(a_msg) = a.receive(&token).await else {
                return;
            };
            let Some(b_msg) = b.receive(&token).await else {
                return;
            };
            let sum = Msg::int(a_msg.as_int() + b_msg.as_int());
            if !res.send(&token, sum).await {
                return;
            }
        }
    }))
}

fn int_sub(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let a = io.input.single("a")?;
    let b = io.input.single("b")?;
    let res = io.output.single("res")?;
    Ok(Box::pin(async move {
        loop {
            let Some(a_msg) = a.receive(&token).await else {
                return;
            };
            let Some(b_msg) = b.receive(&token).await else {
                return;
            };
            let diff = Msg::int(a_msg.as_int() - b_msg.as_int());
            if !res.send(&token, diff).await {
                return;
            }
        }
    }))
}

/// `{data -> res}`: emit `data - 1`.
fn int_decrement(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let data = io.input.single("data")?;
    let res = io.output.single("res")?;
    Ok(Box::pin(async move {
        loop {
            let Some(msg) = data.receive(&token).await else {
                return;
            };
            if !res.send(&token, Msg::int(msg.as_int() - 1)).await {
                return;
            }
        }
    }))
}

fn int_eq(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let a = io.input.single("a")?;
    let b = io.input.single("b")?;
    let res = io.output.single("res")?;
    Ok(Box::pin(async move {
        loop {
            let Some(a_msg) = a.receive(&token).await else {
                return;
            };
            let Some(b_msg) = b.receive(&token).await else {
                return;
            };
            let equal = Msg::bool(a_msg.as_int() == b_msg.as_int());
            if !res.send(&token, equal).await {
                return;
            }
        }
    }))
}

fn int_greater(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let a = io.input.single("a")?;
    let b = io.input.single("b")?;
    let res = io.output.single("res")?;
    Ok(Box::pin(async move {
        loop {
            let Some(a_msg) = a.receive(&token).await else {
                return;
            };
            let Some(b_msg) = b.receive(&token).await else {
                return;
            };
            let greater = Msg::bool(a_msg.as_int() > b_msg.as_int());
            if !res.send(&token, greater).await {
                return;
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;
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

    #[tokio::test]
    async fn int_decrement_decrements() {
        let data = PortQueue::bounded(4);
        let res = PortQueue::bounded(4);
        let token = CancellationToken::new();
        let io = scalar_io(&[("data", data.clone())], &[("res", res.clone())]);
        let leaf = tokio::spawn(int_decrement(io, None, token.clone()).unwrap());

        for value in [3, 0, -5] {
            assert!(data.send(&token, Msg::int(value)).await);
            assert_eq!(res.receive(&token).await, Some(Msg::int(value - 1)));
        }

        token.cancel();
        leaf.await.unwrap();
    }

    #[tokio::test]
    async fn binary_leaves_compute_per_pair() {
        let a = PortQueue::bounded(1);
        let b = PortQueue::bounded(1);
        let res = PortQueue::bounded(1);
        let token = CancellationToken::new();
        let io = scalar_io(
            &[("a", a.clone()), ("b", b.clone())],
            &[("res", res.clone())],
        );
        let leaf = tokio::spawn(int_add(io, None, token.clone()).unwrap());

        assert!(a.send(&token, Msg::int(2)).await);
        assert!(b.send(&token, Msg::int(40)).await);
        assert_eq!(res.receive(&token).await, Some(Msg::int(42)));

        token.cancel();
        leaf.await.unwrap();
    }

    #[tokio::test]
    async fn comparisons_emit_bools() {
        let a = PortQueue::bounded(1);
        let b = PortQueue::bounded(1);
        let res = PortQueue::bounded(1);
        let token = CancellationToken::new();
        let io = scalar_io(
            &[("a", a.clone()), ("b", b.clone())],
            &[("res", res.clone())],
        );
        let leaf = tokio::spawn(int_greater(io, None, token.clone()).unwrap());

        assert!(a.send(&token, Msg::int(5)).await);
        assert!(b.send(&token, Msg::int(3)).await);
        assert_eq!(res.receive(&token).await, Some(Msg::bool(true)));

        token.cancel();
        leaf.await.unwrap();
    }
}
