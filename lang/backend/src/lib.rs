//! The code-generation side of the interactive session: the module of
//! generated symbols addressable by mangled name, the name mangler, and
//! the execution engine's symbol-to-address map.
//!
//! This crate owns no policy about *when* symbols are removed; the driver
//! crate composes the primitives here into the removal protocol.

pub mod engine;
pub mod mangle;
pub mod module;
pub mod result;

pub use engine::ExecutionEngine;
pub use module::{CodeModule, Reference, Symbol, SymbolKind};
pub use result::BackendError;
