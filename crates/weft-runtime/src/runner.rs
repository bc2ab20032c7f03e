//! Leaf function registry and runner.
//!
//! A leaf is registered as a constructor: given its I/O façade, the
//! optional configuration message and the cancellation token, it either
//! returns the long-running process to spawn or fails with a cause. The
//! runner builds every call first, then drives all processes to
//! completion; the first failure anywhere cancels the rest.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use arcstr::ArcStr;
use futures::FutureExt;
use indexmap::IndexMap;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::io::FuncIO;
use crate::msg::Msg;
use crate::program::FuncCall;

/// A running leaf: loops until a send or receive observes cancellation.
pub type FuncProcess = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Whatever a constructor can fail with, typically an [`crate::IOError`]
/// from port lookup or a missing/ill-shaped configuration message.
pub type CreateError = Box<dyn std::error::Error + Send + Sync>;

pub type FuncCreator =
    fn(FuncIO, Option<Msg>, CancellationToken) -> Result<FuncProcess, CreateError>;

#[derive(Debug)]
pub enum FuncError {
    /// Function reference absent from the registry.
    Missing(ArcStr),
    /// A constructor returned an error.
    Construct(ArcStr, CreateError),
    /// A leaf's run loop panicked.
    Panicked(ArcStr),
}

impl fmt::Display for FuncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(func_ref) => write!(f, "function not found in registry: {func_ref}"),
            Self::Construct(func_ref, cause) => {
                write!(f, "failed to construct function {func_ref}: {cause}")
            }
            Self::Panicked(func_ref) => write!(f, "function {func_ref} panicked"),
        }
    }
}

impl std::error::Error for FuncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Construct(_, cause) => Some(&**cause),
            _ => None,
        }
    }
}

/// Mapping from function reference to constructor. Built once at
/// startup, read-only afterwards; open to user extension by design.
#[derive(Clone, Default)]
pub struct FuncRegistry {
    creators: IndexMap<ArcStr, FuncCreator>,
}

impl FuncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, func_ref: impl Into<ArcStr>, creator: FuncCreator) {
        self.creators.insert(func_ref.into(), creator);
    }

    pub fn get(&self, func_ref: &str) -> Option<FuncCreator> {
        self.creators.get(func_ref).copied()
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

pub struct FuncRunner {
    registry: FuncRegistry,
}

impl FuncRunner {
    pub fn new(registry: FuncRegistry) -> Self {
        Self { registry }
    }

    /// Construct and run every function call, joining all processes.
    ///
    /// Construction happens in call order; the first missing reference
    /// or constructor failure cancels the child token so peers already
    /// spawned observe cancellation and drain before the error returns.
    /// A panic inside a running leaf is captured the same way.
    pub async fn run(
        &self,
        token: &CancellationToken,
        calls: Vec<FuncCall>,
    ) -> Result<(), FuncError> {
        let child = token.child_token();
        let mut tasks = JoinSet::new();
        let mut failure = None;

        for call in calls {
            let Some(creator) = self.registry.get(&call.func_ref) else {
                failure = Some(FuncError::Missing(call.func_ref));
                break;
            };
            let process = match creator(call.io, call.config, child.clone()) {
                Ok(process) => process,
                Err(cause) => {
                    failure = Some(FuncError::Construct(call.func_ref, cause));
                    break;
                }
            };
            tracing::debug!("runner: starting {}", call.func_ref);
            let func_ref = call.func_ref;
            tasks.spawn(async move {
                match AssertUnwindSafe(process).catch_unwind().await {
                    Ok(()) => None,
                    Err(_) => Some(func_ref),
                }
            });
        }

        if failure.is_some() {
            child.cancel();
        }

        while let Some(joined) = tasks.join_next().await {
            if let Ok(Some(func_ref)) = joined {
                tracing::error!("runner: {func_ref} panicked, cancelling peers");
                child.cancel();
                if failure.is_none() {
                    failure = Some(FuncError::Panicked(func_ref));
                }
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
