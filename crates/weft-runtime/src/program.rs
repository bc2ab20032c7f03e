use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::io::FuncIO;
use crate::msg::Msg;
use crate::queue::{PortAddr, PortQueue};

/// A runtime-ready program: every port's queue, every connection and
/// every function call, as assembled by the adapter. The port registry
/// is never mutated after adaptation; all mutation happens inside the
/// queues.
#[derive(Debug)]
pub struct Program {
    pub ports: IndexMap<PortAddr, Arc<PortQueue>>,
    pub connections: Vec<Connection>,
    pub funcs: Vec<FuncCall>,
}

/// Directed transport from one sender queue to one or more receiver
/// queues. The connection owns no data; the network services it.
#[derive(Debug)]
pub struct Connection {
    pub sender: Arc<PortQueue>,
    pub receivers: Vec<Arc<PortQueue>>,
    pub meta: ConnectionMeta,
}

/// Port addresses of a connection's endpoints, kept for observability.
#[derive(Clone, Debug)]
pub struct ConnectionMeta {
    pub sender: PortAddr,
    pub receivers: Vec<PortAddr>,
}

/// One leaf function call: the registry reference, its I/O façade and
/// the optional configuration message lowered from the IR.
#[derive(Debug)]
pub struct FuncCall {
    pub func_ref: ArcStr,
    pub io: FuncIO,
    pub config: Option<Msg>,
}
