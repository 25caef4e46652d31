//! HTTP client for the Fernvault server API.
//!
//! Covers key generation and confirmation, the multipart encrypt/decrypt
//! submissions and the same-origin follow-up downloads. Keeps a cookie store
//! because the server ties follow-up downloads to the submitting session.

use crate::config::ClientConfig;
use crate::disposition::download_filename;
use crate::error::{ClientError, ClientResult};
use crate::key;
use crate::types::*;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

/// HTTP client for one Fernvault server.
pub struct FernvaultApi {
    client: Client,
    config: ClientConfig,
}

/// `GET /api/generate_key` answers `{ key }` or `{ success, key }` depending on deployment.
#[derive(Deserialize)]
struct GenerateKeyResponse {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

/// JSON body of an encrypt/decrypt response, success or failure.
#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl FernvaultApi {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .cookie_store(true)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── Keys ──

    pub async fn generate_key(&self) -> ClientResult<String> {
        let url = self.config.endpoint("/api/generate_key");
        debug!("GET {url}");
        let resp: GenerateKeyResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?
            .json()
            .await?;

        if resp.success == Some(false) {
            return Err(ClientError::Api(
                resp.error.unwrap_or_else(|| "key generation failed".to_string()),
            ));
        }
        let generated = resp
            .key
            .ok_or_else(|| ClientError::Api("key missing from generate_key response".to_string()))?;

        if let Err(e) = key::validate(&generated) {
            warn!("server generated a key the local check rejects: {e}");
        }
        Ok(generated)
    }

    /// Asks the server whether `key` is usable. Does not run the local check.
    pub async fn validate_key(&self, key: &str) -> ClientResult<KeyConfirmation> {
        let url = self.config.endpoint("/api/validate_key");
        debug!("POST {url}");
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "key": key }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;

        Ok(resp.json().await?)
    }

    /// Local format check first; the server is only asked about keys that pass it.
    pub async fn confirm_key(&self, key: &str) -> ClientResult<KeyConfirmation> {
        key::validate(key)?;
        self.validate_key(key).await
    }

    // ── Submissions ──

    /// Posts the file and key as multipart form data and classifies the answer.
    ///
    /// A non-2xx response without a JSON body is a transport error; every
    /// JSON body becomes an outcome.
    pub async fn submit_file(&self, request: &SubmissionRequest) -> ClientResult<SubmissionOutcome> {
        let operation = request.operation;
        let url = self.config.endpoint(operation.submit_path());
        let data = read_source(&request.file.source).await?;

        let mut part = Part::bytes(data).file_name(request.file.name.clone());
        if !request.file.mime_type.is_empty() {
            part = part.mime_str(&request.file.mime_type)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("key", request.key.as_str().to_string());

        debug!("POST {url} ({} bytes, {})", request.file.size_bytes, request.file.name);
        let resp = self.client.post(&url).multipart(form).send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();

        if is_json(&headers) {
            let body = resp.bytes().await?;
            let parsed: SubmitResponse = serde_json::from_slice(&body)?;
            return Ok(json_outcome(operation, status, parsed));
        }

        if !status.is_success() {
            return Err(ClientError::Api(format!(
                "{operation} request returned {status}"
            )));
        }

        let blob = resp.bytes().await?.to_vec();
        let filename = download_filename(header_str(&headers, CONTENT_DISPOSITION), operation);
        debug!("{operation} returned {} bytes as {filename}", blob.len());
        Ok(SubmissionOutcome::BinaryResult { filename, blob })
    }

    // ── Follow-up downloads ──

    /// Fetches a result the server kept after a JSON success.
    pub async fn fetch_download(
        &self,
        url: &str,
        operation: Operation,
    ) -> ClientResult<(String, Vec<u8>)> {
        let url = self.resolve_url(url);
        debug!("GET {url}");
        let resp = self.client.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url));
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| ClientError::Api(e.to_string()))?;

        let filename = download_filename(header_str(resp.headers(), CONTENT_DISPOSITION), operation);
        let bytes = resp.bytes().await?.to_vec();
        Ok((filename, bytes))
    }

    /// Absolute URLs pass through; paths are joined to the configured base.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        if url.starts_with('/') {
            self.config.endpoint(url)
        } else {
            self.config.endpoint(&format!("/{url}"))
        }
    }
}

fn json_outcome(operation: Operation, status: StatusCode, body: SubmitResponse) -> SubmissionOutcome {
    if status.is_success() && body.success == Some(true) {
        return SubmissionOutcome::JsonSuccess {
            message: body
                .message
                .unwrap_or_else(|| format!("File {operation}ed successfully")),
            filename: body
                .filename
                .unwrap_or_else(|| operation.default_filename().to_string()),
            download_url: body
                .download_url
                .unwrap_or_else(|| operation.download_path().to_string()),
        };
    }

    SubmissionOutcome::JsonFailure {
        error_message: body
            .error
            .unwrap_or_else(|| format!("{} failed", operation.noun())),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    header_str(headers, CONTENT_TYPE)
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn read_source(source: &FileSource) -> ClientResult<Vec<u8>> {
    match source {
        FileSource::Disk(path) => Ok(tokio::fs::read(path).await?),
        FileSource::Memory(bytes) => Ok(bytes.clone()),
    }
}
