use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Reading a signature count from a petition endpoint failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("endpoint returned HTTP {0}")]
    Status(StatusCode),

    #[error("response body is not valid JSON: {0}")]
    Body(#[from] serde_json::Error),

    #[error("field '{0}' not found in response")]
    MissingField(String),

    #[error("field '{field}' is not a signature count: {value}")]
    NotACount { field: String, value: String },
}

/// Creating or editing a webhook message failed.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook returned HTTP {0}")]
    Status(StatusCode),

    #[error("webhook response is not valid JSON: {0}")]
    Body(#[from] serde_json::Error),

    #[error("webhook response did not contain a message id")]
    MissingId,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not a valid message id file: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
