use std::fmt;
use std::sync::Arc;

use arcstr::ArcStr;
use indexmap::IndexMap;

/// An immutable tagged message.
///
/// Messages are the only values that cross process boundaries. Payloads
/// are shared, never mutated, so cloning is cheap and a message handed to
/// several receivers is the same value in all of them. Equality is
/// structural; map entry order does not participate.
///
/// `Sig` is the reserved empty payload used for pure signals.
#[derive(Clone, Debug, PartialEq)]
pub enum Msg {
    Sig,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(ArcStr),
    List(Arc<[Msg]>),
    Map(Arc<IndexMap<ArcStr, Msg>>),
}

impl Msg {
    pub fn sig() -> Self {
        Self::Sig
    }

    pub fn bool(value: bool) -> Self {
        Self::Bool(value)
    }

    pub fn int(value: i64) -> Self {
        Self::Int(value)
    }

    pub fn float(value: f64) -> Self {
        Self::Float(value)
    }

    pub fn str(value: impl Into<ArcStr>) -> Self {
        Self::Str(value.into())
    }

    pub fn list(items: Vec<Msg>) -> Self {
        Self::List(items.into())
    }

    pub fn map(entries: IndexMap<ArcStr, Msg>) -> Self {
        Self::Map(Arc::new(entries))
    }

    /// Bool payload. Panics on any other tag: leaves are well-typed by
    /// the front-end, so a mismatch is a fatal invariant violation.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            other => panic!("message is not a bool: {other}"),
        }
    }

    pub fn as_int(&self) -> i64 {
        match self {
            Self::Int(value) => *value,
            other => panic!("message is not an int: {other}"),
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Self::Float(value) => *value,
            other => panic!("message is not a float: {other}"),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Str(value) => value,
            other => panic!("message is not a string: {other}"),
        }
    }

    pub fn as_list(&self) -> &[Msg] {
        match self {
            Self::List(items) => items,
            other => panic!("message is not a list: {other}"),
        }
    }

    pub fn as_map(&self) -> &IndexMap<ArcStr, Msg> {
        match self {
            Self::Map(entries) => entries,
            other => panic!("message is not a map: {other}"),
        }
    }
}

impl fmt::Display for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sig => write!(f, "sig"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
