pub mod console;
pub mod flow;
pub mod int;
pub mod logic;
pub mod os;
pub mod stream;

use std::fmt;

use weft_runtime::FuncRegistry;

/// The standard leaf library, ready to hand to the function runner.
/// Callers extend the returned registry with their own leaves at will.
pub fn builtin_registry() -> FuncRegistry {
    let mut registry = FuncRegistry::new();
    flow::register(&mut registry);
    int::register(&mut registry);
    logic::register(&mut registry);
    stream::register(&mut registry);
    console::register(&mut registry);
    os::register(&mut registry);
    registry
}

/// Construction error for leaves that need a configuration message.
#[derive(Debug, Clone)]
pub struct MissingConfig(pub &'static str);

impl fmt::Display for MissingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires a config message", self.0)
    }
}

impl std::error::Error for MissingConfig {}
