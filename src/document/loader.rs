//! Schema and payload loaders
//!
//! Both loaders read a file from disk and hand it to a third-party parser:
//! `serde_yml` for schemas, `serde_json` for payloads. The parsed trees are
//! plain `serde_json::Value`s so the schema engine can consume them directly.

use serde_json::Value as JsonValue;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which of the two input documents a load failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Schema,
    Data,
}

impl DocumentKind {
    /// Short word used in I/O error messages ("schema file", "data file")
    pub fn file_word(&self) -> &'static str {
        match self {
            DocumentKind::Schema => "schema",
            DocumentKind::Data => "data",
        }
    }

    /// Name of the parsed artifact ("YAML schema", "JSON payload")
    pub fn artifact(&self) -> &'static str {
        match self {
            DocumentKind::Schema => "YAML schema",
            DocumentKind::Data => "JSON payload",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Schema => write!(f, "Schema"),
            DocumentKind::Data => write!(f, "JSON data"),
        }
    }
}

/// A parser diagnostic with an optional 1-based location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Failure to turn a file on disk into a document tree
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{kind} file not found: {}", path.display())]
    NotFound { kind: DocumentKind, path: PathBuf },

    #[error("Error loading {}: {failure}", kind.artifact())]
    Parse {
        kind: DocumentKind,
        path: PathBuf,
        failure: ParseFailure,
        /// Raw document text, kept for source-annotated diagnostics
        content: String,
    },

    #[error("Error reading {} file {}: {source}", kind.file_word(), path.display())]
    Io {
        kind: DocumentKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    pub fn kind(&self) -> DocumentKind {
        match self {
            LoadError::NotFound { kind, .. }
            | LoadError::Parse { kind, .. }
            | LoadError::Io { kind, .. } => *kind,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            LoadError::NotFound { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::Io { path, .. } => path,
        }
    }
}

/// Parsed schema document (the constraint tree)
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    document: JsonValue,
}

impl Schema {
    /// Parse YAML text into a schema tree.
    ///
    /// No structural checks happen here: unknown keywords are kept and simply
    /// never match anything during validation.
    pub fn from_yaml_str(content: &str) -> Result<Self, ParseFailure> {
        let yaml_value: serde_yml::Value =
            serde_yml::from_str(content).map_err(|e| ParseFailure {
                message: e.to_string(),
                line: e.location().map(|loc| loc.line()),
                column: e.location().map(|loc| loc.column()),
            })?;

        // JSON has no NaN or infinity; serde_json would turn them into null
        if let Some(path) = non_finite_path(&yaml_value) {
            let location = if path.is_empty() {
                "document root".to_string()
            } else {
                format!("'{}'", path)
            };
            return Err(ParseFailure {
                message: format!(
                    "schema cannot be represented as JSON: non-finite number at {}",
                    location
                ),
                line: None,
                column: None,
            });
        }

        // Mappings with keys JSON cannot express end up here
        let document = serde_json::to_value(&yaml_value).map_err(|e| ParseFailure {
            message: format!("schema cannot be represented as JSON: {}", e),
            line: None,
            column: None,
        })?;

        Ok(Self { document })
    }

    pub fn from_value(document: JsonValue) -> Self {
        Self { document }
    }

    pub fn as_value(&self) -> &JsonValue {
        &self.document
    }
}

/// Parsed payload document (the data tree) and the text it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    value: JsonValue,
    source: String,
}

impl Payload {
    pub fn from_json_str(content: &str) -> Result<Self, ParseFailure> {
        let value = serde_json::from_str(content).map_err(|e| ParseFailure {
            message: e.to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
        })?;

        Ok(Self {
            value,
            source: content.to_string(),
        })
    }

    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// JSON pointer of the first `.nan` / `.inf` in a YAML tree
fn non_finite_path(value: &serde_yml::Value) -> Option<String> {
    match value {
        serde_yml::Value::Number(n) if !n.is_finite() => Some(String::new()),
        serde_yml::Value::Sequence(items) => items.iter().enumerate().find_map(|(i, item)| {
            non_finite_path(item).map(|rest| format!("/{}{}", i, rest))
        }),
        serde_yml::Value::Mapping(map) => map.iter().find_map(|(key, item)| {
            non_finite_path(item).map(|rest| format!("/{}{}", key_label(key), rest))
        }),
        serde_yml::Value::Tagged(tagged) => non_finite_path(tagged.value()),
        _ => None,
    }
}

fn key_label(key: &impl serde::Serialize) -> String {
    match serde_json::to_value(key) {
        Ok(JsonValue::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => "?".to_string(),
    }
}

/// Load a YAML schema from `path`
pub fn load_schema(path: impl AsRef<Path>) -> Result<Schema, LoadError> {
    let path = path.as_ref();
    let content = read_document(path, DocumentKind::Schema)?;

    Schema::from_yaml_str(&content).map_err(|failure| LoadError::Parse {
        kind: DocumentKind::Schema,
        path: path.to_path_buf(),
        failure,
        content,
    })
}

/// Load a JSON payload from `path`
pub fn load_data(path: impl AsRef<Path>) -> Result<Payload, LoadError> {
    let path = path.as_ref();
    let content = read_document(path, DocumentKind::Data)?;

    Payload::from_json_str(&content).map_err(|failure| LoadError::Parse {
        kind: DocumentKind::Data,
        path: path.to_path_buf(),
        failure,
        content,
    })
}

fn read_document(path: &Path, kind: DocumentKind) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            kind,
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            kind,
            path: path.to_path_buf(),
            source,
        },
    })
}
