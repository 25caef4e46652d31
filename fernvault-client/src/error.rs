//! Error types for the Fernvault client.

use crate::types::Operation;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Transport-level errors raised by the API client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid key: {0}")]
    Key(#[from] KeyError),
}

/// Reasons a key string fails the local format check.
///
/// Rules are checked in declaration order; the first failing one is reported.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key is missing")]
    MissingKey,

    #[error("key must be {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("key may only contain A-Z, a-z, 0-9, '-' and '_'")]
    InvalidCharacters,
}

/// Failures of one encrypt or decrypt submission.
///
/// `Display` is not the alert text; use [`SubmitError::alert_message`] which
/// scopes the wording to the operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("no file selected")]
    MissingFile,

    #[error("no key entered")]
    MissingKey,

    #[error("wrong key length: expected {expected}, got {actual}")]
    WrongKeyLength { expected: usize, actual: usize },

    #[error("key contains invalid characters")]
    InvalidKeyCharacters,

    #[error("file exceeds the {limit} byte upload limit")]
    FileTooLarge { limit: u64 },

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("server reported failure: {0}")]
    ServerReportedFailure(String),

    #[error("could not save the result: {0}")]
    SaveFailed(String),

    #[error("another submission is in flight")]
    Busy,
}

impl From<KeyError> for SubmitError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::MissingKey => SubmitError::MissingKey,
            KeyError::WrongLength { expected, actual } => {
                SubmitError::WrongKeyLength { expected, actual }
            }
            KeyError::InvalidCharacters => SubmitError::InvalidKeyCharacters,
        }
    }
}

impl SubmitError {
    /// The human-readable text shown in the single alert for this failure.
    pub fn alert_message(&self, operation: Operation) -> String {
        match self {
            SubmitError::MissingFile => {
                format!("Please select a file to {}.", operation.verb())
            }
            SubmitError::MissingKey => match operation {
                Operation::Encrypt => "Please enter or generate an encryption key.".to_string(),
                Operation::Decrypt => "Please enter the decryption key.".to_string(),
            },
            SubmitError::WrongKeyLength { expected, .. } => {
                format!("Invalid key length. Key must be {expected} characters.")
            }
            SubmitError::InvalidKeyCharacters => {
                "Invalid key. Only letters, digits, '-' and '_' are allowed.".to_string()
            }
            SubmitError::FileTooLarge { limit } => format!(
                "File is too large. Maximum size is {}.",
                crate::selection::format_file_size(*limit)
            ),
            SubmitError::NetworkFailure(_) => {
                format!("{} failed. Please try again.", operation.noun())
            }
            SubmitError::ServerReportedFailure(message) => message.clone(),
            SubmitError::SaveFailed(_) => {
                "The result arrived but could not be saved.".to_string()
            }
            SubmitError::Busy => "Another operation is already in progress.".to_string(),
        }
    }
}
