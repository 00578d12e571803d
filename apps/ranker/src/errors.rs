use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Only `BatchAborted` ends a run early; every other variant is scoped to one document
/// or to a single store operation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Text extraction failed for {filename}: {message}")]
    Extraction { filename: String, message: String },

    #[error("Result store error at {}: {message}", .path.display())]
    Store { path: PathBuf, message: String },

    #[error(
        "Batch of {} document(s) aborted after retries ({}): {source}",
        .filenames.len(),
        .filenames.join(", ")
    )]
    BatchAborted {
        filenames: Vec<String>,
        #[source]
        source: LlmError,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn store(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        AppError::Store {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
