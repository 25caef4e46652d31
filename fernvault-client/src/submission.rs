//! Encrypt/decrypt submission workflow.
//!
//! One call to [`SubmissionController::submit`] validates the inputs, posts
//! them, turns the answer into a download or an alert, and always leaves the
//! loading overlay hidden and the progress ticker stopped. Overlapping
//! submissions are rejected rather than queued.

use crate::api_client::FernvaultApi;
use crate::download::DownloadSink;
use crate::error::SubmitError;
use crate::key::EncryptionKey;
use crate::notify::Severity;
use crate::progress::ProgressHandle;
use crate::selection::check_size;
use crate::types::*;
use crate::ui::{DownloadCard, UiState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Drives submissions for one form against one server.
pub struct SubmissionController<S> {
    api: FernvaultApi,
    ui: Arc<UiState>,
    sink: S,
    busy: AtomicBool,
}

/// Releases the busy flag, stops the progress bar and hides the overlay on
/// every exit path, including unwinding.
struct InFlight<'a> {
    ui: &'a UiState,
    busy: &'a AtomicBool,
    progress: Option<ProgressHandle>,
}

impl<'a> InFlight<'a> {
    /// Claims the controller. `None` if a submission is already running.
    fn claim(ui: &'a UiState, busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            ui,
            busy,
            progress: None,
        })
    }

    fn begin_loading(&mut self) {
        self.ui.show_loading();
        self.progress = Some(self.ui.progress().start());
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.progress.take() {
            self.ui.progress().finish(handle);
        }
        self.ui.hide_loading();
        self.busy.store(false, Ordering::Release);
    }
}

/// Runs the file and key checks in order and builds the validated request.
pub fn prepare_request(
    operation: Operation,
    file: Option<&SelectedFile>,
    key: &str,
    max_upload_bytes: u64,
) -> Result<SubmissionRequest, SubmitError> {
    let file = file.ok_or(SubmitError::MissingFile)?;
    check_size(file, max_upload_bytes)?;
    let key = EncryptionKey::parse(key)?;

    Ok(SubmissionRequest {
        operation,
        file: file.clone(),
        key,
    })
}

impl<S: DownloadSink> SubmissionController<S> {
    pub fn new(api: FernvaultApi, ui: Arc<UiState>, sink: S) -> Self {
        Self {
            api,
            ui,
            sink,
            busy: AtomicBool::new(false),
        }
    }

    pub fn ui(&self) -> &Arc<UiState> {
        &self.ui
    }

    pub fn api(&self) -> &FernvaultApi {
        &self.api
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Submits one encrypt or decrypt attempt.
    ///
    /// Every failure has already been shown as exactly one alert when this
    /// returns `Err`; the value is only for callers that script the workflow.
    pub async fn submit(
        &self,
        operation: Operation,
        file: Option<&SelectedFile>,
        key: &str,
    ) -> Result<Delivered, SubmitError> {
        let Some(mut in_flight) = InFlight::claim(&self.ui, &self.busy) else {
            return Err(self.fail(operation, SubmitError::Busy));
        };

        let request = match prepare_request(operation, file, key, self.api.config().max_upload_bytes) {
            Ok(request) => request,
            Err(err) => return Err(self.fail(operation, err)),
        };

        self.ui.set_download_card(None);
        in_flight.begin_loading();

        let outcome = match self.api.submit_file(&request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("{operation} of {} failed: {err}", request.file.name);
                return Err(self.fail(operation, SubmitError::NetworkFailure(err.to_string())));
            }
        };

        let result = self.deliver(operation, outcome).await;
        drop(in_flight);
        result
    }

    /// Fetches a result the server kept behind a follow-up link and saves it.
    pub async fn follow_link(&self, operation: Operation, url: &str) -> Result<Delivered, SubmitError> {
        let Some(mut in_flight) = InFlight::claim(&self.ui, &self.busy) else {
            return Err(self.fail(operation, SubmitError::Busy));
        };
        in_flight.begin_loading();

        let (filename, bytes) = match self.api.fetch_download(url, operation).await {
            Ok(found) => found,
            Err(err) => {
                warn!("download from {url} failed: {err}");
                return Err(self.fail(operation, SubmitError::NetworkFailure(err.to_string())));
            }
        };

        self.save(operation, filename, bytes).await
    }

    /// Fetches a fresh key from the server and reports the result as an alert.
    ///
    /// Shares the busy flag with submissions, so it never touches the overlay
    /// of a running encrypt or decrypt.
    pub async fn generate_key(&self) -> Option<String> {
        let Some(in_flight) = InFlight::claim(&self.ui, &self.busy) else {
            self.fail(Operation::Encrypt, SubmitError::Busy);
            return None;
        };
        self.ui.show_loading();
        let result = self.api.generate_key().await;
        drop(in_flight);

        match result {
            Ok(key) => {
                self.ui.notifications().notify(
                    "Key generated successfully! Copy it to a safe place.",
                    Severity::Success,
                );
                Some(key)
            }
            Err(err) => {
                warn!("key generation failed: {err}");
                self.ui
                    .notifications()
                    .notify("Failed to generate key. Please try again.", Severity::Error);
                None
            }
        }
    }

    async fn deliver(&self, operation: Operation, outcome: SubmissionOutcome) -> Result<Delivered, SubmitError> {
        match outcome {
            SubmissionOutcome::BinaryResult { filename, blob } => {
                self.save(operation, filename, blob).await
            }
            SubmissionOutcome::JsonSuccess {
                message,
                filename,
                download_url,
            } => {
                let url = self.api.resolve_url(&download_url);
                info!("{operation} stored server-side as {filename}, link {url}");
                self.ui.notifications().notify(message.clone(), Severity::Success);
                self.ui
                    .set_download_card(Some(DownloadCard::new(operation, &filename, &url)));
                Ok(Delivered::Link {
                    filename,
                    url,
                    message,
                })
            }
            SubmissionOutcome::JsonFailure { error_message } => {
                Err(self.fail(operation, SubmitError::ServerReportedFailure(error_message)))
            }
        }
    }

    async fn save(&self, operation: Operation, filename: String, blob: Vec<u8>) -> Result<Delivered, SubmitError> {
        match self.sink.save(&filename, &blob).await {
            Ok(path) => {
                info!("{operation} result saved as {}", path.display());
                self.ui.set_download_card(Some(DownloadCard::new(
                    operation,
                    &filename,
                    path.display().to_string(),
                )));
                Ok(Delivered::Saved { filename, path })
            }
            Err(err) => {
                warn!("could not save {filename}: {err}");
                Err(self.fail(operation, SubmitError::SaveFailed(err.to_string())))
            }
        }
    }

    /// Shows the single alert for `err` and hands it back.
    fn fail(&self, operation: Operation, err: SubmitError) -> SubmitError {
        debug!("{operation} submission failed: {err}");
        self.ui
            .notifications()
            .notify(err.alert_message(operation), Severity::Error);
        err
    }
}
