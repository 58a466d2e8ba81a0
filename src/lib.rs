//! apival: API payload validator
//!
//! Checks JSON payloads against JSON Schemas authored in YAML, from the
//! command line or through a small upload form.
//!
//! ```no_run
//! let messages = apival::check_conformance("schema.yaml", "payload.json");
//! if messages.is_empty() {
//!     println!("Validation successful!");
//! }
//! ```

pub mod cli;
pub mod core;
pub mod document;
pub mod schema;
pub mod web;

pub use crate::core::{check_conformance, Checker, Outcome};
