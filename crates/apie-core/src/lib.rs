//! APIE client library
//!
//! Talks to the APIE analysis server: uploads a binary for import inspection,
//! then either waits for the single JSON result or follows the live event
//! stream, reassembling frames as they arrive and rendering findings
//! incrementally.

pub mod client;
pub mod error;
pub mod protocol;
pub mod report;

pub use client::{AnalysisClient, AnalyzeResponse, StreamOptions};
pub use error::ApiError;
pub use protocol::dispatch::{BufferSurface, DisplaySurface, ExportRequest, StreamSummary};
pub use protocol::frame::{EventKind, Frame, FrameDecoder};
pub use report::ExportArtifact;
