//! Caller-facing error types for backup import and export.

use std::path::PathBuf;
use thiserror::Error;

/// Why an import did not complete.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The backup file could not be opened. Nothing was written.
    #[error("Backup not found '{path}': {source}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backup could not be read or decoded. Nothing was written.
    #[error("Malformed backup document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// The backup file was opened but reading it failed, including a
    /// corrupt gzip stream.
    #[error("Failed to read backup '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A datastore lookup or insert failed. The import was rolled back.
    #[error("Import aborted: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ImportError {
    /// Short machine-readable name for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::InputNotFound { .. } => "input_not_found",
            ImportError::MalformedDocument(_) => "malformed_document",
            ImportError::Read { .. } => "read_failed",
            ImportError::Storage(_) => "storage",
        }
    }
}
