//! Typed client for the Fernvault file encryption API.
//!
//! Provides the submission workflow behind the encrypt/decrypt front-ends:
//! - Local key format validation with optional server confirmation
//! - File selection through picker or drag-and-drop with an upload size cap
//! - Encrypt/decrypt submission with binary vs JSON response handling
//! - Transient alerts and a simulated progress bar, held in an explicit UI state
//!
//! The encryption itself happens server-side; this crate only speaks the HTTP contract.

pub mod api_client;
pub mod config;
pub mod disposition;
pub mod download;
pub mod error;
pub mod key;
pub mod notify;
pub mod progress;
pub mod selection;
pub mod submission;
pub mod types;
pub mod ui;

pub use config::ClientConfig;
pub use error::{ClientError, KeyError, SubmitError};
pub use types::*;
