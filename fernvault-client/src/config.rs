//! Client configuration.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upload cap of the stock deployment.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Configuration for the Fernvault client and its UI state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the Fernvault server (e.g., "http://127.0.0.1:5000").
    pub api_base_url: String,

    /// Largest file accepted for upload. 50 MiB or 100 MiB depending on deployment.
    pub max_upload_bytes: u64,

    /// Overall timeout for a single HTTP request, in seconds.
    pub request_timeout_secs: u64,

    /// Interval between simulated progress increments, in milliseconds.
    pub progress_tick_ms: u64,

    /// Percentage points added on each progress tick.
    pub progress_step: u8,

    /// Highest percentage the simulated bar reaches before the operation finishes.
    pub progress_ceiling: u8,

    /// How long the bar stays at 100% before hiding, in milliseconds.
    pub progress_hide_delay_ms: u64,

    /// Lifetime of an alert before it dismisses itself, in seconds.
    pub alert_timeout_secs: u64,

    /// Directory that receives downloaded results.
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: 120,
            progress_tick_ms: 200,
            progress_step: 5,
            progress_ceiling: 90,
            progress_hide_delay_ms: 500,
            alert_timeout_secs: 5,
            download_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// Reads a TOML config file. Keys that are absent keep their defaults.
    pub fn load(path: &Path) -> ClientResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&raw)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the workflow cannot run with.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(ClientError::Config("missing api_base_url".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ClientError::Config("max_upload_bytes must be positive".to_string()));
        }
        if self.progress_ceiling >= 100 {
            return Err(ClientError::Config(format!(
                "progress_ceiling must stay below 100, got {}",
                self.progress_ceiling
            )));
        }
        if self.progress_tick_ms == 0 {
            return Err(ClientError::Config("progress_tick_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Joins the base URL and an absolute API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn alert_timeout(&self) -> Duration {
        Duration::from_secs(self.alert_timeout_secs)
    }
}
