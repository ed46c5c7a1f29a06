//! Single-shot API calls
//!
//! The non-streaming analyze path and the direct name lookup. Both return
//! the server's `results` mapping; rendering stays with the caller.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use super::AnalysisClient;
use crate::error::ApiError;

/// Body of a non-streaming server response.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeResponse {
    /// API name -> info string. Empty when nothing matched.
    #[serde(default)]
    pub results: BTreeMap<String, String>,
    /// Where the server wrote its own report, when asked to via the
    /// `export` query flag.
    #[serde(default)]
    pub export_path: Option<String>,
}

impl AnalysisClient {
    /// Submit `bytes` for analysis and wait for the full JSON result.
    ///
    /// `export` is forwarded to the server, which then writes a report on
    /// its side as well; the client-side artifact is built by the caller
    /// from the returned results.
    pub async fn analyze(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        export: bool,
    ) -> Result<AnalyzeResponse, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::InvalidRequest("empty file".to_string()));
        }
        debug!("analyze: {} bytes as {file_name:?}", bytes.len());
        let url = self.endpoint("/api/analyze")?;
        let form = Self::file_form(file_name, bytes)?;
        let response = self
            .http
            .post(url)
            .query(&[
                ("verbose", "false"),
                ("export", if export { "true" } else { "false" }),
                ("stream", "false"),
            ])
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Look up one or more API names directly, skipping the upload.
    pub async fn lookup(&self, names: &[String]) -> Result<AnalyzeResponse, ApiError> {
        if names.is_empty() {
            return Err(ApiError::InvalidRequest("no API names given".to_string()));
        }
        debug!("lookup: {} names", names.len());
        let url = self.endpoint("/api/lookup")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "api": names }))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }
}
