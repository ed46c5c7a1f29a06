//! Streaming analysis
//!
//! Drives the event-stream consumer: await a chunk, decode it, dispatch
//! every complete frame, suspend for the next chunk. The await on the next
//! chunk is the only suspension point, so effects land on the display
//! surface in exact frame arrival order.

use std::time::{Duration, Instant};

use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::AnalysisClient;
use crate::error::ApiError;
use crate::protocol::dispatch::{DisplaySurface, EventDispatcher, ExportRequest, StreamSummary};
use crate::protocol::frame::FrameDecoder;
use crate::protocol::utf8::Utf8Decoder;

/// Knobs for one streaming run.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Build a report artifact after `done`, if any hits accumulated.
    pub export: Option<ExportRequest>,
    /// Give up if the producer goes quiet for this long.
    pub idle_timeout: Duration,
    /// Cancelling stops the pull loop before the next dispatch; no export
    /// happens after cancellation.
    pub cancel: CancellationToken,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            export: None,
            idle_timeout: Duration::from_secs(60),
            cancel: CancellationToken::new(),
        }
    }
}

impl AnalysisClient {
    /// Submit `bytes` and consume the live event stream, rendering into
    /// `surface` as frames arrive.
    ///
    /// A summary with `completed == false` means the producer vanished
    /// before its terminal frame; whatever was already rendered stays
    /// rendered, and no artifact is built. Transport failures mid-stream
    /// likewise leave earlier effects in place.
    pub async fn analyze_stream(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        surface: &mut dyn DisplaySurface,
        options: StreamOptions,
    ) -> Result<StreamSummary, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::InvalidRequest("empty file".to_string()));
        }
        let url = self.endpoint("/api/analyze")?;
        let form = Self::file_form(file_name, bytes)?;
        let response = self
            .http
            .post(url)
            .query(&[("verbose", "true"), ("export", "false"), ("stream", "true")])
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let started = Instant::now();
        let mut body = response.bytes_stream();
        let mut utf8 = Utf8Decoder::new();
        let mut decoder = FrameDecoder::new();
        let mut dispatcher = EventDispatcher::new(surface, options.export);
        let mut bytes_received = 0usize;

        loop {
            let pulled = tokio::select! {
                _ = options.cancel.cancelled() => {
                    info!("stream cancelled after {bytes_received} bytes");
                    return Err(ApiError::Cancelled);
                }
                pulled = tokio::time::timeout(options.idle_timeout, body.next()) => pulled,
            };
            let chunk = match pulled {
                Err(_) => {
                    return Err(ApiError::Transport(format!(
                        "no data for {:?}, stream stalled",
                        options.idle_timeout
                    )));
                }
                Ok(None) => break,
                Ok(Some(Err(err))) => return Err(ApiError::Transport(err.to_string())),
                Ok(Some(Ok(chunk))) => chunk,
            };
            bytes_received += chunk.len();
            debug!("chunk: {} bytes (total {bytes_received})", chunk.len());
            for frame in decoder.feed(&utf8.decode(&chunk)) {
                dispatcher.dispatch(frame);
            }
            // The producer closes right after its terminal frame; stop
            // pulling instead of idling against a lingering connection.
            if dispatcher.is_done() {
                break;
            }
        }

        // Source exhausted: a final unterminated frame still counts.
        let tail = utf8.finish();
        if !tail.is_empty() {
            for frame in decoder.feed(&tail) {
                dispatcher.dispatch(frame);
            }
        }
        if let Some(frame) = decoder.finish() {
            dispatcher.dispatch(frame);
        }

        let summary = dispatcher.into_summary();
        if summary.completed {
            info!(
                "stream done in {:?}: {} hits, {bytes_received} bytes",
                started.elapsed(),
                summary.hits.len()
            );
        } else {
            warn!("stream ended without terminal frame after {bytes_received} bytes");
        }
        Ok(summary)
    }
}
