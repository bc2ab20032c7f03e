//! Typed I/O façade handed to leaf functions.
//!
//! A leaf never sees queues or addresses directly: it looks its ports up
//! by name and direction and gets back a handle whose every send and
//! receive honours the cancellation token. Looking up a port that is
//! missing or wired with the wrong shape fails here, at construction
//! time, so a miswired function call dies during setup instead of at
//! steady state.

use std::fmt;
use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::msg::Msg;
use crate::queue::PortQueue;

#[derive(Debug, Clone)]
pub enum IOError {
    MissingInport(ArcStr),
    MissingOutport(ArcStr),
    NotSingle(ArcStr, usize),
}

impl fmt::Display for IOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInport(name) => write!(f, "no inport named `{name}`"),
            Self::MissingOutport(name) => write!(f, "no outport named `{name}`"),
            Self::NotSingle(name, slots) => {
                write!(f, "port `{name}` is wired as an array of {slots} slots, not a scalar")
            }
        }
    }
}

impl std::error::Error for IOError {}

/// The ports of one function call, grouped by direction.
#[derive(Debug)]
pub struct FuncIO {
    pub input: Inports,
    pub output: Outports,
}

impl FuncIO {
    pub fn new(
        input: IndexMap<ArcStr, Vec<Arc<PortQueue>>>,
        output: IndexMap<ArcStr, Vec<Arc<PortQueue>>>,
    ) -> Self {
        Self {
            input: Inports::new(input),
            output: Outports::new(output),
        }
    }
}

/// Input ports by name; slots ordered by array index.
#[derive(Default, Debug)]
pub struct Inports {
    ports: IndexMap<ArcStr, Vec<Arc<PortQueue>>>,
}

impl Inports {
    pub fn new(ports: IndexMap<ArcStr, Vec<Arc<PortQueue>>>) -> Self {
        Self { ports }
    }

    pub fn single(&self, name: &str) -> Result<SingleInport, IOError> {
        match self.slots(name)? {
            [queue] => Ok(SingleInport {
                queue: queue.clone(),
            }),
            slots => Err(IOError::NotSingle(ArcStr::from(name), slots.len())),
        }
    }

    pub fn array(&self, name: &str) -> Result<ArrayInport, IOError> {
        Ok(ArrayInport {
            queues: self.slots(name)?.to_vec(),
        })
    }

    fn slots(&self, name: &str) -> Result<&[Arc<PortQueue>], IOError> {
        self.ports
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| IOError::MissingInport(ArcStr::from(name)))
    }
}

/// Output ports by name; slots ordered by array index.
#[derive(Default, Debug)]
pub struct Outports {
    ports: IndexMap<ArcStr, Vec<Arc<PortQueue>>>,
}

impl Outports {
    pub fn new(ports: IndexMap<ArcStr, Vec<Arc<PortQueue>>>) -> Self {
        Self { ports }
    }

    pub fn single(&self, name: &str) -> Result<SingleOutport, IOError> {
        match self.slots(name)? {
            [queue] => Ok(SingleOutport {
                queue: queue.clone(),
            }),
            slots => Err(IOError::NotSingle(ArcStr::from(name), slots.len())),
        }
    }

    pub fn array(&self, name: &str) -> Result<ArrayOutport, IOError> {
        Ok(ArrayOutport {
            queues: self.slots(name)?.to_vec(),
        })
    }

    fn slots(&self, name: &str) -> Result<&[Arc<PortQueue>], IOError> {
        self.ports
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| IOError::MissingOutport(ArcStr::from(name)))
    }
}

/// Handle to a scalar input port.
#[derive(Clone, Debug)]
pub struct SingleInport {
    queue: Arc<PortQueue>,
}

impl SingleInport {
    /// Returns `None` iff cancelled before a message arrived.
    pub async fn receive(&self, token: &CancellationToken) -> Option<Msg> {
        self.queue.receive(token).await
    }
}

/// Handle to a scalar output port.
#[derive(Clone)]
pub struct SingleOutport {
    queue: Arc<PortQueue>,
}

impl SingleOutport {
    /// Returns `false` iff cancelled before delivery.
    pub async fn send(&self, token: &CancellationToken, msg: Msg) -> bool {
        self.queue.send(token, msg).await
    }
}

/// Handle to an array input port, indexed `0..len()`.
#[derive(Clone)]
pub struct ArrayInport {
    queues: Vec<Arc<PortQueue>>,
}

impl ArrayInport {
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub async fn receive(&self, token: &CancellationToken, slot: usize) -> Option<Msg> {
        self.queues[slot].receive(token).await
    }
}

/// Handle to an array output port, indexed `0..len()`.
#[derive(Clone)]
pub struct ArrayOutport {
    queues: Vec<Arc<PortQueue>>,
}

impl ArrayOutport {
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub async fn send(&self, token: &CancellationToken, slot: usize, msg: Msg) -> bool {
        self.queues[slot].send(token, msg).await
    }
}
