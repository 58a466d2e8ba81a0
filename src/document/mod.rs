//! Document loading - YAML schemas, JSON payloads and their syntax diagnostics

pub mod diagnostics;
pub mod loader;

pub use diagnostics::SyntaxError;
pub use loader::{load_data, load_schema, DocumentKind, LoadError, ParseFailure, Payload, Schema};
