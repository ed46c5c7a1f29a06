//! HTTP client for the analysis server
//!
//! Request building and status handling shared by the single-shot and
//! streaming paths. Retry policy belongs to callers; nothing here retries.

mod analyze;
mod stream;

pub use analyze::AnalyzeResponse;
pub use stream::StreamOptions;

use std::time::Duration;

use url::Url;

use crate::error::ApiError;

/// Client for one analysis server.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base: Url,
}

impl AnalysisClient {
    /// Build a client for `server`, e.g. `http://127.0.0.1:8000`.
    pub fn new(server: &str) -> Result<Self, ApiError> {
        let base = Url::parse(server)
            .map_err(|e| ApiError::InvalidRequest(format!("bad server URL {server:?}: {e}")))?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("bad endpoint {path:?}: {e}")))
    }

    /// Multipart form carrying the uploaded binary under the `file` field.
    fn file_form(file_name: &str, bytes: Vec<u8>) -> Result<reqwest::multipart::Form, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(reqwest::multipart::Form::new().part("file", part))
    }

    /// Map a non-success response to a typed error, preferring the server's
    /// `{"error": ...}` body over the raw text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.text().await {
            Ok(body) => serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body),
            Err(_) => String::new(),
        };
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
