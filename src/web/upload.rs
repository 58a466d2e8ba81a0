//! Upload handling - extension checks, staging and cleanup
//!
//! Uploaded files live in the staging directory only for the duration of
//! one request. `StagedFile` removes its file when dropped, so every exit
//! path (including a panicking check) cleans up.

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use ulid::Ulid;

use crate::core::Checker;

pub const SCHEMA_FIELD: &str = "schema_file";
pub const DATA_FIELD: &str = "json_file";

const SCHEMA_EXTENSIONS: &[&str] = &[".yaml", ".yml"];
const DATA_EXTENSIONS: &[&str] = &[".json"];

/// Reasons an upload never reaches the conformance check
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Both schema and JSON files are required.")]
    MissingFile,

    #[error("No selected file. Both schema and JSON files are required.")]
    EmptyFilename,

    #[error("{}", .0.join(" "))]
    InvalidExtension(Vec<String>),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("An unexpected error occurred: {0}")]
    Io(#[from] io::Error),

    #[error("An unexpected error occurred: {0}")]
    Task(String),
}

impl UploadError {
    /// Messages to show on the page
    pub fn messages(&self) -> Vec<String> {
        match self {
            UploadError::InvalidExtension(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// One file field from the form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// The two files the form submits
#[derive(Debug, Clone)]
pub struct UploadPair {
    pub schema: UploadedFile,
    pub data: UploadedFile,
}

impl UploadPair {
    /// Pull `schema_file` and `json_file` out of the multipart stream
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut schema = None;
        let mut data = None;

        while let Some(field) = multipart.next_field().await? {
            let slot = match field.name() {
                Some(SCHEMA_FIELD) => &mut schema,
                Some(DATA_FIELD) => &mut data,
                _ => continue,
            };
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            *slot = Some(UploadedFile {
                file_name,
                data: bytes,
            });
        }

        match (schema, data) {
            (Some(schema), Some(data)) => Ok(Self { schema, data }),
            _ => Err(UploadError::MissingFile),
        }
    }

    /// Reject empty filenames and unexpected extensions
    pub fn check_names(&self) -> Result<(), UploadError> {
        if self.schema.file_name.is_empty() || self.data.file_name.is_empty() {
            return Err(UploadError::EmptyFilename);
        }

        let mut problems = Vec::new();
        if !has_extension(&self.schema.file_name, SCHEMA_EXTENSIONS) {
            problems.push("Schema file must be a YAML file (.yaml or .yml).".to_string());
        }
        if !has_extension(&self.data.file_name, DATA_EXTENSIONS) {
            problems.push("Payload file must be a JSON file (.json).".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(UploadError::InvalidExtension(problems))
        }
    }
}

fn has_extension(file_name: &str, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| file_name.ends_with(ext))
}

/// Reduce a client-supplied filename to a safe single path component
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// An uploaded file written to the staging directory
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Write `file` under `dir` with a unique prefix
    pub async fn write(dir: &Path, file: &UploadedFile) -> io::Result<Self> {
        let path = dir.join(format!("{}-{}", Ulid::new(), sanitize_filename(&file.file_name)));
        let staged = Self { path };
        tokio::fs::write(&staged.path, &file.data).await?;
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed to remove staged upload: {}", e);
            }
        }
    }
}

/// Stage both uploads, run the check, and return its messages.
///
/// The staged files are gone by the time this returns.
pub async fn check_upload(
    checker: Checker,
    upload_dir: &Path,
    upload: &UploadPair,
) -> Result<Vec<String>, UploadError> {
    upload.check_names()?;
    tokio::fs::create_dir_all(upload_dir).await?;

    let schema = StagedFile::write(upload_dir, &upload.schema).await?;
    let data = StagedFile::write(upload_dir, &upload.data).await?;

    // Staged files are removed on the blocking thread, after the check
    tokio::task::spawn_blocking(move || {
        let messages = checker.check(schema.path(), data.path()).messages();
        drop(data);
        drop(schema);
        messages
    })
    .await
    .map_err(|e| UploadError::Task(e.to_string()))
}
