// models/src/errors.rs

use std::string::FromUtf8Error;

use serde_json::Error as SerdeJsonError;
pub use thiserror::Error;
use tokio::task::JoinError;
use uuid::Error as UuidError;

/// Error taxonomy shared by every service crate.
///
/// Channel delivery failures are deliberately absent: the dispatcher captures
/// them per contact and per channel as data, it never raises them.
#[derive(Debug, Error)]
pub enum EmergencyError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    StateConflict(String),

    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("UTF-8 conversion error: {0}")]
    FromUtf8(#[from] FromUtf8Error),

    #[error("UUID error: {0}")]
    Uuid(#[from] UuidError),
}

pub type Result<T> = std::result::Result<T, EmergencyError>;

impl From<JoinError> for EmergencyError {
    fn from(err: JoinError) -> Self {
        EmergencyError::Internal(format!("async task join error: {}", err))
    }
}

impl From<anyhow::Error> for EmergencyError {
    fn from(err: anyhow::Error) -> Self {
        EmergencyError::Internal(format!("an internal error occurred: {}", err))
    }
}
