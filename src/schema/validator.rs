//! Schema validation with detailed error reporting

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::{ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::document::{Payload, Schema};

/// How many violations a validation pass reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Stop at the first violation the engine finds
    #[default]
    First,
    /// Report every violation, in engine order
    All,
}

impl FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(ReportMode::First),
            "all" => Ok(ReportMode::All),
            other => Err(format!("unknown report mode '{}' (expected 'first' or 'all')", other)),
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMode::First => write!(f, "first"),
            ReportMode::All => write!(f, "all"),
        }
    }
}

/// One way the payload fails the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer into the payload; empty for the document root
    pub path: String,
    pub message: String,
    /// Short label for source annotations
    pub hint: String,
    pub help: Option<String>,
}

impl Violation {
    fn invalid_schema(err: &JsonSchemaError<'_>) -> Self {
        Self {
            path: String::new(),
            message: format!("Invalid schema: {}", err),
            hint: "schema rejected".to_string(),
            help: Some("The schema itself is not a valid JSON Schema document".to_string()),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Schema validator
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    mode: ReportMode,
}

/// A schema compiled once and reusable across payloads
pub struct CompiledSchema {
    inner: JsonValidator,
    mode: ReportMode,
}

impl Validator {
    pub fn new(mode: ReportMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Compile a schema, with `format` keywords asserted rather than annotated.
    ///
    /// A schema the engine rejects comes back as a single root violation.
    pub fn compile(&self, schema: &Schema) -> Result<CompiledSchema, Violation> {
        jsonschema::options()
            .should_validate_formats(true)
            .build(schema.as_value())
            .map(|inner| CompiledSchema {
                inner,
                mode: self.mode,
            })
            .map_err(|e| Violation::invalid_schema(&e))
    }

    /// Check `value` against `schema`; an empty result means it conforms
    pub fn validate(&self, schema: &Schema, value: &JsonValue) -> Vec<Violation> {
        match self.compile(schema) {
            Ok(compiled) => compiled.validate(value),
            Err(violation) => vec![violation],
        }
    }
}

impl CompiledSchema {
    pub fn validate(&self, value: &JsonValue) -> Vec<Violation> {
        match self.mode {
            ReportMode::First => match self.inner.validate(value) {
                Ok(()) => Vec::new(),
                Err(error) => vec![error_to_violation(&error)],
            },
            ReportMode::All => self
                .inner
                .iter_errors(value)
                .map(|e| error_to_violation(&e))
                .collect(),
        }
    }
}

/// Violations of one payload, rendered against its source text
#[derive(Debug, Error, Diagnostic)]
#[error("Schema validation failed: {summary}")]
#[diagnostic(code(apival::schema::validation_error))]
pub struct ViolationReport {
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SourceViolation>,
}

/// A single violation with its location in the payload source
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SourceViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl ViolationReport {
    pub fn new(filename: &str, payload: &Payload, violations: &[Violation]) -> Self {
        let content = payload.source();
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };

        let violations = violations
            .iter()
            .map(|v| SourceViolation {
                span: find_path_span(content, &v.path),
                message: v.message.clone(),
                hint: v.hint.clone(),
                help: v.help.clone(),
            })
            .collect();

        Self {
            summary,
            src: NamedSource::new(filename, content.to_string()),
            violations,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }
}

/// Convert a JSON Schema validation error to our violation format
fn error_to_violation(error: &JsonSchemaError<'_>) -> Violation {
    let path = error.instance_path.to_string();
    let location = if path.is_empty() {
        "document root".to_string()
    } else {
        format!("'{}'", path)
    };

    Violation {
        message: format!("{}: {}", location, error),
        hint: format_error_hint(&error.kind),
        help: generate_help_message(&error.kind),
        path,
    }
}

/// Format enum options as a string
fn format_enum_options(options: &JsonValue) -> String {
    if let Some(arr) = options.as_array() {
        arr.iter()
            .map(|v| v.as_str().map(|s| s.to_string()).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        options.to_string()
    }
}

fn format_type_kind(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(primitives) => (*primitives)
            .into_iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Generate a short hint for the error label
fn format_error_hint(kind: &ValidationErrorKind) -> String {
    match kind {
        ValidationErrorKind::Required { .. } => "required field missing".to_string(),
        ValidationErrorKind::Type { .. } => "wrong type".to_string(),
        ValidationErrorKind::Enum { .. } => "invalid value".to_string(),
        ValidationErrorKind::Format { .. } => "bad format".to_string(),
        ValidationErrorKind::Pattern { .. } => "pattern mismatch".to_string(),
        ValidationErrorKind::MinLength { .. } => "too short".to_string(),
        ValidationErrorKind::MaxLength { .. } => "too long".to_string(),
        ValidationErrorKind::Minimum { .. } => "too small".to_string(),
        ValidationErrorKind::Maximum { .. } => "too large".to_string(),
        ValidationErrorKind::AdditionalProperties { .. } => "unknown field".to_string(),
        _ => "validation error".to_string(),
    }
}

/// Generate a help message with suggestions for fixing the error
fn generate_help_message(kind: &ValidationErrorKind) -> Option<String> {
    match kind {
        ValidationErrorKind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            Some(format!("Add the '{}' field to the payload", prop_str))
        }
        ValidationErrorKind::Type { kind } => {
            Some(format!("Expected a value of type: {}", format_type_kind(kind)))
        }
        ValidationErrorKind::Enum { options } => {
            Some(format!("Valid values: {}", format_enum_options(options)))
        }
        ValidationErrorKind::Format { format } if format == "email" => {
            Some("Expected an address such as name@example.com".to_string())
        }
        ValidationErrorKind::Format { format } => {
            Some(format!("Expected a string in '{}' format", format))
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            if unexpected.len() == 1 {
                Some(format!("Remove the '{}' field or check spelling", unexpected[0]))
            } else {
                Some("Remove unknown fields or check spelling".to_string())
            }
        }
        _ => None,
    }
}

fn first_line_span(content: &str) -> SourceSpan {
    let len = content.find('\n').unwrap_or(content.len());
    (0, len).into()
}

/// Find the span for a JSON pointer in the payload text
fn find_path_span(content: &str, json_path: &str) -> SourceSpan {
    // e.g. "/age" or "/tags/0"
    let parts: Vec<String> = json_path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();

    let Some(search_key) = parts.last() else {
        return first_line_span(content);
    };

    // Array index - point at the array's key instead
    if search_key.parse::<usize>().is_ok() && parts.len() >= 2 {
        if let Some(span) = find_key_span(content, &parts[parts.len() - 2]) {
            return span;
        }
    }

    find_key_span(content, search_key).unwrap_or_else(|| first_line_span(content))
}

/// Find the span of `"key"` used as an object key
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let needle = format!("\"{}\"", key);
    let mut from = 0;

    while let Some(pos) = content[from..].find(&needle) {
        let start = from + pos;
        let end = start + needle.len();
        if content[end..].trim_start().starts_with(':') {
            return Some((start, needle.len()).into());
        }
        from = end;
    }
    None
}
