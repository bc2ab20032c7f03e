//! The runtime driver: composes network transport and function runner,
//! observes the root `exit` port and turns a program into an exit code.

use std::fmt;
use std::pin::pin;

use tokio_util::sync::CancellationToken;

use crate::msg::Msg;
use crate::network::Network;
use crate::program::Program;
use crate::queue::PortAddr;
use crate::runner::{FuncError, FuncRegistry, FuncRunner};

#[derive(Debug)]
pub enum RunError {
    /// The program has no root `exit` port to observe.
    NoExitPort,
    Func(FuncError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExitPort => write!(f, "program has no exit port"),
            Self::Func(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Func(error) => Some(error),
            Self::NoExitPort => None,
        }
    }
}

pub struct Runtime {
    runner: FuncRunner,
}

impl Runtime {
    pub fn new(registry: FuncRegistry) -> Self {
        Self {
            runner: FuncRunner::new(registry),
        }
    }

    /// Run a program to completion.
    ///
    /// Starts the network and the function runner on their own child
    /// tokens, kicks the program off with a signal on the root `start`
    /// port when it has one, then waits for the first of: a message on
    /// the root `exit` port (its Int payload becomes the exit code,
    /// passed through unmodified), a runner error (everything is
    /// cancelled and the error propagates), or cancellation of `token`
    /// (normal shutdown, exit code 0). Always drains both the network
    /// and the runner before returning.
    pub async fn run(
        &self,
        token: CancellationToken,
        program: Program,
    ) -> Result<i64, RunError> {
        let Program {
            ports,
            connections,
            funcs,
        } = program;

        let exit = ports
            .get(&PortAddr::root("exit"))
            .cloned()
            .ok_or(RunError::NoExitPort)?;

        let net_token = token.child_token();
        let func_token = token.child_token();

        let network = Network::new(&connections);
        let net_task = tokio::spawn(network.run(net_token.clone()));

        if let Some(start) = ports.get(&PortAddr::root("start")).cloned() {
            tracing::debug!("signalling start port");
            let start_token = func_token.clone();
            tokio::spawn(async move {
                start.send(&start_token, Msg::sig()).await;
            });
        }

        let mut runner_fut = pin!(self.runner.run(&func_token, funcs));
        let mut runner_done = false;
        let result = loop {
            tokio::select! {
                outcome = &mut runner_fut, if !runner_done => {
                    runner_done = true;
                    if let Err(error) = outcome {
                        break Err(RunError::Func(error));
                    }
                    // All leaves returned cleanly; keep observing exit.
                }
                received = exit.receive(&token) => {
                    break Ok(match received {
                        Some(Msg::Int(code)) => {
                            tracing::info!("exit port received {code}");
                            code
                        }
                        Some(other) => {
                            tracing::warn!(
                                "exit port received non-int message `{other}`, exiting with 0"
                            );
                            0
                        }
                        None => 0,
                    });
                }
            }
        };

        func_token.cancel();
        net_token.cancel();
        if !runner_done {
            if let Err(error) = runner_fut.await {
                tracing::debug!("function runner finished with `{error}` during shutdown");
            }
        }
        let _ = net_task.await;

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use arcstr::ArcStr;
    use indexmap::IndexMap;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::io::FuncIO;
    use crate::program::{Connection, ConnectionMeta, FuncCall};
    use crate::queue::PortQueue;
    use crate::runner::{CreateError, FuncProcess};

    fn emit_config(
        io: FuncIO,
        config: Option<Msg>,
        token: CancellationToken,
    ) -> Result<FuncProcess, CreateError> {
        let out = io.output.single("res")?;
        let msg = config.expect("emitConfig needs a config message");
        Ok(Box::pin(async move {
            loop {
                if !out.send(&token, msg.clone()).await {
                    return;
                }
            }
        }))
    }

    /// Program with a single leaf whose `res` port feeds `exit`.
    fn exit_program(config: Msg) -> Program {
        let giver_out = PortQueue::bounded(0);
        let exit = PortQueue::bounded(0);
        let giver_addr = PortAddr::new("giver", "res");
        let exit_addr = PortAddr::root("exit");

        let ports = IndexMap::from([
            (giver_addr.clone(), giver_out.clone()),
            (exit_addr.clone(), exit),
        ]);
        let connections = vec![Connection {
            sender: giver_out.clone(),
            receivers: vec![ports[&exit_addr].clone()],
            meta: ConnectionMeta {
                sender: giver_addr,
                receivers: vec![exit_addr],
            },
        }];
        let funcs = vec![FuncCall {
            func_ref: ArcStr::from("emitConfig"),
            io: FuncIO::new(
                IndexMap::new(),
                IndexMap::from([(arcstr::literal!("res"), vec![giver_out])]),
            ),
            config: Some(config),
        }];
        Program {
            ports,
            connections,
            funcs,
        }
    }

    fn registry() -> FuncRegistry {
        let mut registry = FuncRegistry::new();
        registry.register("emitConfig", emit_config);
        registry
    }

    #[tokio::test]
    async fn int_exit_payload_becomes_the_exit_code() {
        let runtime = Runtime::new(registry());
        let code = runtime
            .run(CancellationToken::new(), exit_program(Msg::int(7)))
            .await
            .unwrap();
        assert_eq!(code, 7);
    }

    #[tokio::test]
    async fn zero_exit_payload_yields_zero() {
        let runtime = Runtime::new(registry());
        let code = runtime
            .run(CancellationToken::new(), exit_program(Msg::int(0)))
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn non_int_exit_payload_yields_zero_with_warning() {
        let runtime = Runtime::new(registry());
        let code = runtime
            .run(CancellationToken::new(), exit_program(Msg::str("oops")))
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn missing_exit_port_is_an_error() {
        let runtime = Runtime::new(registry());
        let program = Program {
            ports: IndexMap::new(),
            connections: vec![],
            funcs: vec![],
        };
        assert!(matches!(
            runtime.run(CancellationToken::new(), program).await,
            Err(RunError::NoExitPort)
        ));
    }

    #[tokio::test]
    async fn missing_function_reference_propagates() {
        let runtime = Runtime::new(FuncRegistry::new());
        let result = runtime
            .run(CancellationToken::new(), exit_program(Msg::int(1)))
            .await;
        match result {
            Err(RunError::Func(FuncError::Missing(func_ref))) => {
                assert_eq!(func_ref, "emitConfig");
            }
            other => panic!("expected missing-func error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn external_cancellation_shuts_down_promptly() {
        // A leaf that never emits, so exit never fires.
        fn never(
            _io: FuncIO,
            _config: Option<Msg>,
            token: CancellationToken,
        ) -> Result<FuncProcess, CreateError> {
            Ok(Box::pin(async move { token.cancelled().await }))
        }

        let mut registry = FuncRegistry::new();
        registry.register("never", never);
        let runtime = Arc::new(Runtime::new(registry));

        let exit_addr = PortAddr::root("exit");
        let program = Program {
            ports: IndexMap::from([(exit_addr, PortQueue::bounded(0))]),
            connections: vec![],
            funcs: vec![FuncCall {
                func_ref: ArcStr::from("never"),
                io: FuncIO::new(IndexMap::new(), IndexMap::new()),
                config: None,
            }],
        };

        let token = CancellationToken::new();
        let run_token = token.clone();
        let run = tokio::spawn(async move { runtime.run(run_token, program).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
        let code = tokio::time::timeout(Duration::from_millis(50), run)
            .await
            .expect("run should return promptly after cancellation")
            .unwrap()
            .unwrap();
        assert_eq!(code, 0);
    }
}
