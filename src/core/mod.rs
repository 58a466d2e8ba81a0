//! Core module - configuration and the conformance check

pub mod config;
pub mod conformance;

pub use config::Config;
pub use conformance::{check_conformance, Checker, Outcome};
