pub mod adapter;
pub mod executor;
pub mod io;
pub mod msg;
pub mod network;
pub mod program;
pub mod queue;
pub mod runner;

pub use adapter::{adapt, lower_msg, raise_msg, AdapterError};
pub use executor::{RunError, Runtime};
pub use io::{ArrayInport, ArrayOutport, FuncIO, IOError, Inports, Outports, SingleInport, SingleOutport};
pub use msg::Msg;
pub use network::Network;
pub use program::{Connection, ConnectionMeta, FuncCall, Program};
pub use queue::{IndexedMsg, PortAddr, PortQueue};
pub use runner::{CreateError, FuncCreator, FuncError, FuncProcess, FuncRegistry, FuncRunner};
