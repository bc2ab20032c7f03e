//! Console leaves.

use tokio_util::sync::CancellationToken;
use weft_runtime::{CreateError, FuncIO, FuncProcess, FuncRegistry, Msg};

pub fn register(registry: &mut FuncRegistry) {
    registry.register("printer", printer);
}

/// `{v -> v}`: print the textual form of every message, then forward
/// it unchanged. `println!` locks stdout per call, which serializes
/// output across concurrent printers.
fn printer(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let input = io.input.single("v")?;
    let output = io.output.single("v")?;
    Ok(Box::pin(async move {
        loop {
            let Some(msg) = input.receive(&token).await else {
                return;
            };
            println!("{msg}");
            if !output.send(&token, msg).await {
                return;
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use weft_runtime::PortQueue;

    use super::*;

    #[tokio::test]
    async fn printer_forwards_what_it_prints() {
        let input = PortQueue::bounded(1);
        let output = PortQueue::bounded(1);
        let token = CancellationToken::new();
        let io = FuncIO::new(
            IndexMap::from([(arcstr::literal!("v"), vec![input.clone()])]),
            IndexMap::from([(arcstr::literal!("v"), vec![output.clone()])]),
        );
        let leaf = tokio::spawn(printer(io, None, token.clone()).unwrap());

        let msg = Msg::str("hello");
        assert!(input.send(&token, msg.clone()).await);
        assert_eq!(output.receive(&token).await, Some(msg));

        token.cancel();
        leaf.await.unwrap();
    }

    #[tokio::test]
    async fn printer_without_outport_fails_construction() {
        let input = PortQueue::bounded(1);
        let io = FuncIO::new(
            IndexMap::from([(arcstr::literal!("v"), vec![input])]),
            IndexMap::new(),
        );
        assert!(printer(io, None, CancellationToken::new()).is_err());
    }
}
