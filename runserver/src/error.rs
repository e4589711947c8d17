//! Runserver-specific error types

use shared::SharedError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunserverError {
    #[error("Invalid configuration: {field} ({reason})")]
    InvalidConfig { field: String, reason: String },

    #[error("Server binary not found: {binary}")]
    BinaryNotFound { binary: String },

    #[error("Failed to start server: {message}")]
    StartFailed { message: String },

    #[error("Server exited before it became reachable ({status})")]
    ServerExited { status: String },

    #[error("Server at {address} not reachable after {attempts} attempts")]
    NotReady { address: String, attempts: u32 },

    #[error("Server is not running")]
    NotRunning,

    #[error("Failed to signal server process {pid}: {message}")]
    Signal { pid: u32, message: String },

    #[error("Log directory unusable: {path}")]
    LogDir { path: PathBuf, source: std::io::Error },

    #[error("Extension {extension} failed: {message}")]
    Extension { extension: String, message: String },

    #[error("{0}")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RunserverError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn start(message: impl Into<String>) -> Self {
        Self::StartFailed {
            message: message.into(),
        }
    }

    pub fn extension(extension: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extension {
            extension: extension.into(),
            message: message.into(),
        }
    }
}

pub type RunserverResult<T> = Result<T, RunserverError>;
