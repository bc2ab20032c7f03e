//! Intermediate representation of a compiled weft program.
//!
//! The IR is the contract between the compiler front-end and the runtime:
//! every port in the program, every connection between a sender port and
//! its receiver ports, and every leaf function call with its wiring and
//! optional configuration message. The runtime adapter lowers this into
//! live queues and processes; it trusts the front-end for type and
//! structural correctness and only resolves references.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A fully elaborated program, ready to be lowered by the runtime adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub ports: Vec<PortInfo>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub funcs: Vec<Func>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortInfo {
    pub port_addr: PortAddr,
    /// Queue capacity; 0 means a synchronous handoff.
    #[serde(default)]
    pub buf_size: u32,
}

/// Address of a single port: a node path, a port name on that node and,
/// for array ports, a slot index. A missing index means a scalar port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortAddr {
    #[serde(default)]
    pub path: String,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub sender_side: PortAddr,
    #[serde(default)]
    pub receiver_sides: Vec<ReceiverSide>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiverSide {
    pub port_addr: PortAddr,
}

/// One leaf function call: a reference into the runtime's function
/// registry, the addresses of its ports and an optional configuration
/// message baked in at compile time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Func {
    #[serde(rename = "ref")]
    pub func_ref: String,
    pub io: FuncIO,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<Msg>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuncIO {
    #[serde(default)]
    pub inports: Vec<PortAddr>,
    #[serde(default)]
    pub outports: Vec<PortAddr>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MsgType {
    #[default]
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
}

/// A constant message. The discriminator selects the payload field; the
/// other fields keep their zero values and are skipped on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    #[serde(rename = "type")]
    pub msg_type: MsgType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bool: bool,
    #[serde(default, skip_serializing_if = "is_zero_int")]
    pub int: i64,
    #[serde(default, skip_serializing_if = "is_zero_float")]
    pub float: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub str: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list: Vec<Msg>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub map: IndexMap<String, Msg>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero_int(value: &i64) -> bool {
    *value == 0
}

fn is_zero_float(value: &f64) -> bool {
    *value == 0.0
}

impl Msg {
    pub fn bool(value: bool) -> Self {
        Self {
            msg_type: MsgType::Bool,
            bool: value,
            ..Self::default()
        }
    }

    pub fn int(value: i64) -> Self {
        Self {
            msg_type: MsgType::Int,
            int: value,
            ..Self::default()
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            msg_type: MsgType::Float,
            float: value,
            ..Self::default()
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self {
            msg_type: MsgType::Str,
            str: value.into(),
            ..Self::default()
        }
    }

    pub fn list(items: Vec<Msg>) -> Self {
        Self {
            msg_type: MsgType::List,
            list: items,
            ..Self::default()
        }
    }

    pub fn map(entries: IndexMap<String, Msg>) -> Self {
        Self {
            msg_type: MsgType::Map,
            map: entries,
            ..Self::default()
        }
    }
}
