//! Schema system - validation of payloads against compiled schemas

pub mod validator;

pub use validator::{CompiledSchema, ReportMode, Validator, Violation, ViolationReport};
