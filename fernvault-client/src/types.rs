//! Shared types for the submission workflow.

use crate::key::EncryptionKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which server-side transformation a submission asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Encrypt,
    Decrypt,
}

impl Operation {
    /// Endpoint path for the submission, with binary passthrough requested.
    pub fn submit_path(self) -> &'static str {
        match self {
            Operation::Encrypt => "/api/encrypt?download=1",
            Operation::Decrypt => "/api/decrypt?download=1",
        }
    }

    /// Same-origin follow-up link used when the server answers with JSON.
    pub fn download_path(self) -> &'static str {
        match self {
            Operation::Encrypt => "/download/encrypted",
            Operation::Decrypt => "/download/decrypted",
        }
    }

    /// Filename used when the response carries no usable `Content-Disposition`.
    pub fn default_filename(self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypted_file.enc",
            Operation::Decrypt => "decrypted_file",
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            Operation::Encrypt => "Encryption",
            Operation::Decrypt => "Decryption",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Where the bytes of a selected file live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSource {
    Disk(PathBuf),
    Memory(Vec<u8>),
}

/// A file chosen through the picker or dropped onto an upload area.
///
/// Replaced wholesale on every new selection, never merged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    /// Possibly empty, like a browser `File.type`.
    pub mime_type: String,
    pub source: FileSource,
}

impl SelectedFile {
    /// Builds a selection over in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: data.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Memory(data),
        }
    }
}

/// A fully validated request: both file and key passed their checks.
#[derive(Clone, Debug)]
pub struct SubmissionRequest {
    pub operation: Operation,
    pub file: SelectedFile,
    pub key: EncryptionKey,
}

/// Result of a single submission, consumed immediately and then dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    BinaryResult {
        filename: String,
        blob: Vec<u8>,
    },
    JsonSuccess {
        message: String,
        filename: String,
        download_url: String,
    },
    JsonFailure {
        error_message: String,
    },
}

/// What the caller gets back from a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivered {
    /// The result bytes were handed to the download sink.
    Saved { filename: String, path: PathBuf },
    /// The server kept the result; it can be fetched from `url`.
    Link {
        filename: String,
        url: String,
        message: String,
    },
}

/// Server answer to `POST /api/validate_key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfirmation {
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}
