//! Lowers the compiler's IR into a runtime-ready [`Program`]: one queue
//! per port, connections resolved against the queue registry, function
//! calls grouped by port name and configuration messages lowered into
//! runtime values. Beyond reference resolution the IR is trusted; type
//! and structural validation happened in the front-end.

use std::fmt;
use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::io::FuncIO;
use crate::msg::Msg;
use crate::program::{Connection, ConnectionMeta, FuncCall, Program};
use crate::queue::{PortAddr, PortQueue};

#[derive(Debug, Clone)]
pub enum AdapterError {
    SenderPortNotFound(PortAddr),
    ReceiverPortNotFound(PortAddr),
    EmptyReceivers(PortAddr),
    FuncPortNotFound { func: ArcStr, addr: PortAddr },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SenderPortNotFound(addr) => write!(f, "sender port not found: {addr}"),
            Self::ReceiverPortNotFound(addr) => write!(f, "receiver port not found: {addr}"),
            Self::EmptyReceivers(addr) => {
                write!(f, "connection from {addr} has no receivers")
            }
            Self::FuncPortNotFound { func, addr } => {
                write!(f, "function {func}: port not found: {addr}")
            }
        }
    }
}

impl std::error::Error for AdapterError {}

/// Lower an IR program into a runtime program. Deterministic: identical
/// input yields identical queue registry order, connections and calls.
pub fn adapt(ir_program: &weft_ir::Program) -> Result<Program, AdapterError> {
    let mut ports: IndexMap<PortAddr, Arc<PortQueue>> =
        IndexMap::with_capacity(ir_program.ports.len());
    for info in &ir_program.ports {
        let addr = lower_addr(&info.port_addr);
        ports.insert(addr, PortQueue::bounded(info.buf_size as usize));
    }

    let mut connections = Vec::with_capacity(ir_program.connections.len());
    for connection in &ir_program.connections {
        let sender_addr = lower_addr(&connection.sender_side);
        let sender = ports
            .get(&sender_addr)
            .cloned()
            .ok_or_else(|| AdapterError::SenderPortNotFound(sender_addr.clone()))?;

        if connection.receiver_sides.is_empty() {
            return Err(AdapterError::EmptyReceivers(sender_addr));
        }

        let mut receivers = Vec::with_capacity(connection.receiver_sides.len());
        let mut receiver_addrs = Vec::with_capacity(connection.receiver_sides.len());
        for side in &connection.receiver_sides {
            let addr = lower_addr(&side.port_addr);
            let queue = ports
                .get(&addr)
                .cloned()
                .ok_or_else(|| AdapterError::ReceiverPortNotFound(addr.clone()))?;
            receivers.push(queue);
            receiver_addrs.push(addr);
        }

        connections.push(Connection {
            sender,
            receivers,
            meta: ConnectionMeta {
                sender: sender_addr,
                receivers: receiver_addrs,
            },
        });
    }

    let mut funcs = Vec::with_capacity(ir_program.funcs.len());
    for func in &ir_program.funcs {
        let func_ref = ArcStr::from(func.func_ref.as_str());
        let input = group_ports(&ports, &func_ref, &func.io.inports)?;
        let output = group_ports(&ports, &func_ref, &func.io.outports)?;
        funcs.push(FuncCall {
            func_ref,
            io: FuncIO::new(input, output),
            config: func.msg.as_ref().map(lower_msg),
        });
    }

    Ok(Program {
        ports,
        connections,
        funcs,
    })
}

/// Group a function's port addresses by port name, slots in order of
/// appearance; the front-end emits them in slot order.
fn group_ports(
    ports: &IndexMap<PortAddr, Arc<PortQueue>>,
    func_ref: &ArcStr,
    addrs: &[weft_ir::PortAddr],
) -> Result<IndexMap<ArcStr, Vec<Arc<PortQueue>>>, AdapterError> {
    let mut grouped: IndexMap<ArcStr, Vec<Arc<PortQueue>>> = IndexMap::new();
    for addr in addrs {
        let lowered = lower_addr(addr);
        let queue = ports
            .get(&lowered)
            .cloned()
            .ok_or_else(|| AdapterError::FuncPortNotFound {
                func: func_ref.clone(),
                addr: lowered.clone(),
            })?;
        grouped.entry(lowered.port).or_default().push(queue);
    }
    Ok(grouped)
}

fn lower_addr(addr: &weft_ir::PortAddr) -> PortAddr {
    PortAddr {
        path: ArcStr::from(addr.path.as_str()),
        port: ArcStr::from(addr.port.as_str()),
        idx: addr.idx.map(|idx| idx as u8),
    }
}

/// Lower an IR constant into a runtime message, recursing through lists
/// and maps.
pub fn lower_msg(msg: &weft_ir::Msg) -> Msg {
    match msg.msg_type {
        weft_ir::MsgType::Bool => Msg::bool(msg.bool),
        weft_ir::MsgType::Int => Msg::int(msg.int),
        weft_ir::MsgType::Float => Msg::float(msg.float),
        weft_ir::MsgType::Str => Msg::str(msg.str.as_str()),
        weft_ir::MsgType::List => Msg::list(msg.list.iter().map(lower_msg).collect()),
        weft_ir::MsgType::Map => Msg::map(
            msg.map
                .iter()
                .map(|(key, value)| (ArcStr::from(key.as_str()), lower_msg(value)))
                .collect(),
        ),
    }
}

/// Inverse of [`lower_msg`]; lowering then raising yields the original
/// IR message for every tagged variant. Signals are runtime-only and
/// have no IR form.
pub fn raise_msg(msg: &Msg) -> weft_ir::Msg {
    match msg {
        Msg::Sig => panic!("signals are runtime-only and have no IR form"),
        Msg::Bool(value) => weft_ir::Msg::bool(*value),
        Msg::Int(value) => weft_ir::Msg::int(*value),
        Msg::Float(value) => weft_ir::Msg::float(*value),
        Msg::Str(value) => weft_ir::Msg::str(value.as_str()),
        Msg::List(items) => weft_ir::Msg::list(items.iter().map(raise_msg).collect()),
        Msg::Map(entries) => weft_ir::Msg::map(
            entries
                .iter()
                .map(|(key, value)| (key.to_string(), raise_msg(value)))
                .collect(),
        ),
    }
}
