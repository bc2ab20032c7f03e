//! File-system leaves, built on `tokio::fs` so the runtime's worker
//! threads never block on the OS.

use tokio_util::sync::CancellationToken;
use weft_runtime::{CreateError, FuncIO, FuncProcess, FuncRegistry, Msg};

pub fn register(registry: &mut FuncRegistry) {
    registry.register("writeAll", write_all);
    registry.register("readAll", read_all);
}

/// `{filename, data -> sig, err}`: write `data` to `filename`. Emits a
/// signal on `sig` on success or the error text on `err` on failure,
/// never both in one iteration.
fn write_all(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let filename = io.input.single("filename")?;
    let data = io.input.single("data")?;
    let sig = io.output.single("sig")?;
    let err = io.output.single("err")?;
    Ok(Box::pin(async move {
        loop {
            let Some(name) = filename.receive(&token).await else {
                return;
            };
            let Some(body) = data.receive(&token).await else {
                return;
            };
            match tokio::fs::write(name.as_str(), body.as_str().as_bytes()).await {
                Ok(()) => {
                    if !sig.send(&token, Msg::sig()).await {
                        return;
                    }
                }
                Err(error) => {
                    if !err.send(&token, Msg::str(error.to_string())).await {
                        return;
                    }
                }
            }
        }
    }))
}

/// `{filename -> res, err}`: read `filename` to a string message.
fn read_all(
    io: FuncIO,
    _config: Option<Msg>,
    token: CancellationToken,
) -> Result<FuncProcess, CreateError> {
    let filename = io.input.single("filename")?;
    let res = io.output.single("res")?;
    let err = io.output.single("err")?;
    Ok(Box::pin(async move {
        loop {
            let Some(name) = filename.receive(&token).await else {
                return;
            };
            match tokio::fs::read_to_string(name.as_str()).await {
                Ok(contents) => {
                    if !res.send(&token, Msg::str(contents)).await {
                        return;
                    }
                }
                Err(error) => {
                    if !err.send(&token, Msg::str(error.to_string())).await {
                        return;
                    }
                }
            }
        }
    }))
}
