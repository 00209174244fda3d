// src/tools/mod.rs
pub mod definitions;
pub mod executor;
pub mod types;

pub use definitions::{FunctionDefinition, catalog, context_document};
pub use executor::{Operation, ToolExecutor};
pub use types::{Envelope, FunctionCall, Status};
