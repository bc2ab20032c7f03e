//! Control-flow leaves: constant givers, triggers and sinks.

use tokio_util::sync::CancellationToken;
use weft_runtime::{CreateError, FuncIO, FuncProcess, FuncRegistry, Msg};

use super::MissingConfig;

pub fn register(registry: &mut FuncRegistry) {
    registry.register("const", constant);
    registry.register("trigger", trigger);
    registry.register("void", void);
}

/// `{ -> res}`: emit the configuration message forever.
fn constant(
    io: FuncIO,
    config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let res = io.output.single("res")?;
    let Some(msg) = config else {
        return Err(MissingConfig("const").into());
    };
    Ok(Box::pin(async move {
        loop {
            if !res.send(&token, msg.clone()).await {
                return;
            }
        }
    }))
}

/// `{sigs, v -> v}`: latch `v` once at start, then emit the latched
/// message once per signal received on `sigs`.
fn trigger(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let sigs = io.input.single("sigs")?;
    let latch = io.input.single("v")?;
    let out = io.output.single("v")?;
    Ok(Box::pin(async move {
        let Some(latched) = latch.receive(&token).await else {
            return;
        };
        loop {
            if sigs.receive(&token).await.is_none() {
                return;
            }
            if !out.send(&token, latched.clone()).await {
                return;
            }
        }
    }))
}

/// `{msg -> }`: discard everything.
fn void(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let input = io.input.single("msg")?;
    Ok(Box::pin(async move {
        while input.receive(&token).await.is_some() {}
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
    async fn const_emits_its_config_repeatedly() {
        let out = PortQueue::bounded(0);
        let token = CancellationToken::new();
        let io = scalar_io(&[], &[("res", out.clone())]);
        let process = constant(io, Some(Msg::int(9)), token.clone()).unwrap();
        let leaf = tokio::spawn(process);

        assert_eq!(out.receive(&token).await, Some(Msg::int(9)));
        assert_eq!(out.receive(&token).await, Some(Msg::int(9)));

        token.cancel();
        leaf.await.unwrap();
    }

    #[test]
    fn const_without_config_fails_construction() {
        let out = PortQueue::bounded(0);
        let io = scalar_io(&[], &[("res", out)]);
        let result = constant(io, None, CancellationToken::new());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn trigger_latches_once_and_fires_per_signal() {
        let sigs = PortQueue::bounded(2);
        let latch = PortQueue::bounded(1);
        let out = PortQueue::bounded(2);
        let token = CancellationToken::new();
        let io = scalar_io(
            &[("sigs", sigs.clone()), ("v", latch.clone())],
            &[("v", out.clone())],
        );
        let process = trigger(io, None, token.clone()).unwrap();
        let leaf = tokio::spawn(process);

        assert!(latch.send(&token, Msg::str("latched")).await);
        assert!(sigs.send(&token, Msg::sig()).await);
        assert!(sigs.send(&token, Msg::sig()).await);

        assert_eq!(out.receive(&token).await, Some(Msg::str("latched")));
        assert_eq!(out.receive(&token).await, Some(Msg::str("latched")));

        token.cancel();
        leaf.await.unwrap();
    }

    #[tokio::test]
    async fn trigger_with_missing_port_fails_construction() {
        let out = PortQueue::bounded(1);
        let io = scalar_io(&[], &[("v", out)]);
        assert!(trigger(io, None, CancellationToken::new()).is_err());
    }

    #[tokio::test]
    async fn void_discards_until_cancelled() {
        let input = PortQueue::bounded(1);
        let token = CancellationToken::new();
        let io = scalar_io(&[("msg", input.clone())], &[]);
        let process = void(io, None, token.clone()).unwrap();
        let leaf = tokio::spawn(process);

        assert!(input.send(&token, Msg::int(1)).await);
        assert!(input.send(&token, Msg::int(2)).await);

        token.cancel();
        leaf.await.unwrap();
    }
}
