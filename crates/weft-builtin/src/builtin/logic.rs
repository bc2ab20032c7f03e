//! Boolean leaves. Binary leaves read `a` before `b`.

use tokio_util::sync::CancellationToken;
use weft_runtime::{CreateError, FuncIO, FuncProcess, FuncRegistry, Msg};

pub fn register(registry: &mut FuncRegistry) {
    registry.register("or", or);
    registry.register("and", and);
    registry.register("not", not);
}

fn or(
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
            let either = Msg::bool(a_msg.as_bool() || b_msg.as_bool());
            if !res.send(&token, either).await {
                return;
            }
        }
    }))
}

fn and(
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
            let both = Msg::bool(a_msg.as_bool() && b_msg.as_bool());
            if !res.send(&token, both).await {
                return;
            }
        }
    }))
}

fn not(
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
            if !res.send(&token, Msg::bool(!msg.as_bool())).await {
                return;
            }
        }
    }))
}
