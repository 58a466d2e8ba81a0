//! Syntax error diagnostics with source snippets

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::document::loader::{DocumentKind, LoadError};

/// Syntax error in a schema or payload, pointing at the offending location
#[derive(Debug, Error, Diagnostic)]
#[error("{title}: {message}")]
#[diagnostic(code(apival::document::syntax))]
pub struct SyntaxError {
    title: &'static str,

    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    /// The underlying parser message
    message: String,
}

impl SyntaxError {
    /// Build a diagnostic from a loader failure, if it carries source text
    pub fn from_load_error(err: &LoadError) -> Option<Self> {
        match err {
            LoadError::Parse {
                kind,
                path,
                failure,
                content,
            } => {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());

                Some(Self::at_location(
                    *kind,
                    failure.message.clone(),
                    content,
                    &filename,
                    failure.line.unwrap_or(1),
                    failure.column.unwrap_or(1),
                ))
            }
            _ => None,
        }
    }

    /// Create a syntax error at a specific 1-based line and column
    pub fn at_location(
        kind: DocumentKind,
        message: impl Into<String>,
        source: &str,
        filename: &str,
        line: usize,
        column: usize,
    ) -> Self {
        let message = message.into();
        let offset = line_col_to_offset(source, line, column).min(source.len());
        let len = usize::from(offset < source.len());
        let help = generate_help(&message);

        Self {
            title: match kind {
                DocumentKind::Schema => "YAML syntax error",
                DocumentKind::Data => "JSON syntax error",
            },
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from((offset, len)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Convert line/column to byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    let mut current_line = 1;

    for (i, ch) in source.char_indices() {
        if current_line == line {
            let line_start = i;
            let mut col = 1;
            for (j, c) in source[line_start..].char_indices() {
                if col == column {
                    return line_start + j;
                }
                if c == '\n' {
                    break;
                }
                col += 1;
            }
            return line_start + column.saturating_sub(1);
        }
        if ch == '\n' {
            current_line += 1;
        }
        offset = i;
    }

    offset
}

/// Generate helpful suggestions based on the parser message
fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("eof while parsing") {
        return Some(
            "The document ends early - check for a missing closing brace, bracket or quote."
                .to_string(),
        );
    }

    if msg_lower.contains("trailing comma") {
        return Some("JSON does not allow a comma after the last element.".to_string());
    }

    if msg_lower.contains("key must be a string") {
        return Some("Object keys must be double-quoted strings: {\"key\": 1}".to_string());
    }

    if msg_lower.contains("expected ','") || msg_lower.contains("expected comma") {
        return Some("Add commas between items: [item1, item2, item3]".to_string());
    }

    if msg_lower.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg_lower.contains("duplicate key") {
        return Some("Each key can only appear once. Remove or rename the duplicate key.".to_string());
    }

    if msg_lower.contains("expected block end") {
        return Some("Check your indentation - it may be inconsistent.".to_string());
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    if msg_lower.contains("found unexpected ':'") {
        return Some("Colons in values need to be quoted: \"value:with:colons\"".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::loader::ParseFailure;
    use std::path::PathBuf;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 1), 12);
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("EOF while parsing an object at line 1 column 10").is_some());
        assert!(generate_help("found tab character").is_some());
        assert!(generate_help("duplicate key").is_some());
        assert!(generate_help("some random error").is_none());
    }

    #[test]
    fn test_from_parse_error() {
        let err = LoadError::Parse {
            kind: DocumentKind::Data,
            path: PathBuf::from("/tmp/uploads/payload.json"),
            failure: ParseFailure {
                message: "EOF while parsing an object at line 1 column 12".to_string(),
                line: Some(1),
                column: Some(12),
            },
            content: "{\"name\": 1 ".to_string(),
        };

        let diag = SyntaxError::from_load_error(&err).unwrap();
        assert!(diag.to_string().starts_with("JSON syntax error: EOF"));
        assert!(diag.help.is_some());
        assert!(diag.span.offset() <= 11);
    }

    #[test]
    fn test_not_found_has_no_diagnostic() {
        let err = LoadError::NotFound {
            kind: DocumentKind::Schema,
            path: PathBuf::from("missing.yaml"),
        };
        assert!(SyntaxError::from_load_error(&err).is_none());
    }
}
