pub mod builtin;

pub use builtin::builtin_registry;
