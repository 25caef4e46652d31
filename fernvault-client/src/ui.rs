//! Explicit UI state shared by the controllers.
//!
//! Holds what a page would keep in global DOM nodes: the blocking loading
//! overlay, the progress bar, the alert list and the download card.

use crate::config::ClientConfig;
use crate::notify::NotificationCenter;
use crate::progress::{ProgressIndicator, ProgressSettings};
use crate::types::Operation;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

/// Confirmation shown after a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadCard {
    pub operation: Operation,
    pub title: String,
    pub filename: String,
    /// Where the result went: a saved path or a follow-up link.
    pub target: String,
}

impl DownloadCard {
    pub fn new(operation: Operation, filename: impl Into<String>, target: impl Into<String>) -> Self {
        let title = match operation {
            Operation::Encrypt => "File encrypted successfully!",
            Operation::Decrypt => "File decrypted successfully!",
        };
        Self {
            operation,
            title: title.to_string(),
            filename: filename.into(),
            target: target.into(),
        }
    }
}

pub struct UiState {
    loading: watch::Sender<bool>,
    progress: ProgressIndicator,
    notifications: NotificationCenter,
    download_card: Mutex<Option<DownloadCard>>,
}

impl UiState {
    pub fn new(config: &ClientConfig) -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            loading,
            progress: ProgressIndicator::new(ProgressSettings::from_config(config)),
            notifications: NotificationCenter::new(config.alert_timeout()),
            download_card: Mutex::new(None),
        }
    }

    pub fn show_loading(&self) {
        self.loading.send_replace(true);
    }

    pub fn hide_loading(&self) {
        self.loading.send_replace(false);
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn watch_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn progress(&self) -> &ProgressIndicator {
        &self.progress
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Replaces the card in one step so no stale result stays visible.
    pub fn set_download_card(&self, card: Option<DownloadCard>) {
        *self
            .download_card
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = card;
    }

    pub fn download_card(&self) -> Option<DownloadCard> {
        self.download_card
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
