//! Shared helpers for integration tests against a mocked Fernvault server.

#![allow(dead_code)]

use fernvault_client::ClientConfig;
use fernvault_client::api_client::FernvaultApi;
use fernvault_client::download::DownloadSink;
use fernvault_client::submission::SubmissionController;
use fernvault_client::ui::UiState;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 44 characters from the URL-safe alphabet.
pub const VALID_KEY: &str = "dGhpcy1pcy1hLXRlc3Qta2V5LWZvci1mZXJudmF1bHQ_";
pub const OTHER_VALID_KEY: &str = "Zm9yLXRlc3RzLW9ubHktbm90LWEtcmVhbC1rZXktLS0-";

pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
        ..ClientConfig::default()
    }
}

/// Records every download instead of touching the filesystem.
#[derive(Clone, Default)]
pub struct RecordingSink {
    saved: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl RecordingSink {
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

impl DownloadSink for RecordingSink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

/// A sink whose disk is always full.
pub struct FailingSink;

impl DownloadSink for FailingSink {
    async fn save(&self, _filename: &str, _bytes: &[u8]) -> io::Result<PathBuf> {
        Err(io::Error::other("disk full"))
    }
}

pub fn controller_with<S: DownloadSink>(config: ClientConfig, sink: S) -> SubmissionController<S> {
    let ui = Arc::new(UiState::new(&config));
    let api = FernvaultApi::new(config).unwrap();
    SubmissionController::new(api, ui, sink)
}

pub fn controller(base_url: &str) -> (SubmissionController<RecordingSink>, RecordingSink) {
    let sink = RecordingSink::default();
    (controller_with(test_config(base_url), sink.clone()), sink)
}
