//! Conformance check - load schema, load payload, validate
//!
//! Every stage failure is terminal for the call and comes back as a single
//! message; the caller never sees an `Err`.

use std::path::Path;

use crate::document::{load_data, load_schema, LoadError};
use crate::schema::{ReportMode, Validator, Violation};

/// Result of one conformance check
#[derive(Debug)]
pub enum Outcome {
    /// A document could not be loaded; validation never ran
    Failed(LoadError),
    /// Validation ran; an empty list means the payload conforms
    Checked(Vec<Violation>),
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Checked(violations) if violations.is_empty())
    }

    /// Flatten into the ordered list of human-readable messages
    pub fn messages(&self) -> Vec<String> {
        match self {
            Outcome::Failed(err) => vec![err.to_string()],
            Outcome::Checked(violations) => violations.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Runs conformance checks with a fixed reporting mode
#[derive(Debug, Clone, Copy, Default)]
pub struct Checker {
    validator: Validator,
}

impl Checker {
    pub fn new(mode: ReportMode) -> Self {
        Self {
            validator: Validator::new(mode),
        }
    }

    pub fn mode(&self) -> ReportMode {
        self.validator.mode()
    }

    pub fn check(&self, schema_path: &Path, data_path: &Path) -> Outcome {
        let schema = match load_schema(schema_path) {
            Ok(schema) => schema,
            Err(err) => {
                tracing::debug!(path = %schema_path.display(), error = %err, "schema load failed");
                return Outcome::Failed(err);
            }
        };

        let payload = match load_data(data_path) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(path = %data_path.display(), error = %err, "payload load failed");
                return Outcome::Failed(err);
            }
        };

        let violations = self.validator.validate(&schema, payload.value());
        tracing::debug!(
            schema = %schema_path.display(),
            data = %data_path.display(),
            mode = %self.mode(),
            violations = violations.len(),
            "payload validated"
        );

        Outcome::Checked(violations)
    }
}

/// Check the JSON payload at `data_path` against the YAML schema at
/// `schema_path`, reporting only the first violation.
///
/// Returns an empty list when the payload conforms.
pub fn check_conformance(schema_path: impl AsRef<Path>, data_path: impl AsRef<Path>) -> Vec<String> {
    Checker::default()
        .check(schema_path.as_ref(), data_path.as_ref())
        .messages()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SCHEMA: &str = "type: object\nproperties:\n  name:\n    type: string\nrequired: [name]\n";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_conforming_payload_is_empty() {
        let tmp = TempDir::new().unwrap();
        let schema = write(&tmp, "schema.yaml", SCHEMA);
        let data = write(&tmp, "payload.json", r#"{"name": "Test"}"#);

        assert!(check_conformance(&schema, &data).is_empty());
    }

    #[test]
    fn test_missing_required_property() {
        let tmp = TempDir::new().unwrap();
        let schema = write(&tmp, "schema.yaml", SCHEMA);
        let data = write(&tmp, "payload.json", r#"{"age": 30}"#);

        let messages = check_conformance(&schema, &data);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("\"name\""));
        assert!(messages[0].contains("required"));
    }

    #[test]
    fn test_missing_schema_stops_before_data() {
        let tmp = TempDir::new().unwrap();
        let schema = tmp.path().join("absent.yaml");
        let data = tmp.path().join("also-absent.json");

        let messages = check_conformance(&schema, &data);
        assert_eq!(messages, vec![format!("Schema file not found: {}", schema.display())]);
    }

    #[test]
    fn test_missing_data() {
        let tmp = TempDir::new().unwrap();
        let schema = write(&tmp, "schema.yaml", SCHEMA);
        let data = tmp.path().join("absent.json");

        let messages = check_conformance(&schema, &data);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].to_lowercase().contains("data file not found"));
        assert!(messages[0].contains(&data.display().to_string()));
    }

    #[test]
    fn test_outcome_validity() {
        let tmp = TempDir::new().unwrap();
        let schema = write(&tmp, "schema.yaml", SCHEMA);
        let good = write(&tmp, "good.json", r#"{"name": "Test"}"#);
        let bad = write(&tmp, "bad.json", "{");

        let checker = Checker::new(ReportMode::All);
        assert!(checker.check(&schema, &good).is_valid());

        let outcome = checker.check(&schema, &bad);
        assert!(!outcome.is_valid());
        assert!(matches!(outcome, Outcome::Failed(LoadError::Parse { .. })));
    }

    #[test]
    fn test_repeated_checks_are_identical() {
        let tmp = TempDir::new().unwrap();
        let schema = write(&tmp, "schema.yaml", SCHEMA);
        let data = write(&tmp, "payload.json", r#"{"name": 5}"#);

        let first = check_conformance(&schema, &data);
        let second = check_conformance(&schema, &data);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }
}
