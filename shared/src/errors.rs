//! Shared error types for the runserver crates

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidLogFilter { filter: String, message: String },

    #[error("Failed to install tracing subscriber: {message}")]
    SubscriberInit { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
