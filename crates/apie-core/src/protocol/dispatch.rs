//! Event dispatch
//!
//! Applies decoded frames, in strict arrival order, to the display surface
//! and the accumulated hit list, and detects stream completion.

use chrono::Utc;
use tracing::{debug, info};

use super::frame::{EventKind, Frame};
use crate::report::ExportArtifact;

/// Append-only text sink the dispatcher renders into.
///
/// The CLI backs this with the terminal; tests use [`BufferSurface`]. It is
/// purely presentational - the frame history can always rebuild it.
pub trait DisplaySurface {
    fn append(&mut self, text: &str);
}

/// In-memory display surface for headless use.
#[derive(Debug, Default)]
pub struct BufferSurface {
    text: String,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended so far.
    pub fn snapshot(&self) -> &str {
        &self.text
    }
}

impl DisplaySurface for BufferSurface {
    fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

/// Export behaviour requested for one analysis run.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// First line of the report body.
    pub header: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Streaming,
    Done,
}

/// Sequential frame dispatcher for one analysis request.
///
/// Frames must be applied one at a time, in the order the producer wrote
/// them; display and accumulation order are contractual.
pub struct EventDispatcher<'a> {
    surface: &'a mut dyn DisplaySurface,
    export: Option<ExportRequest>,
    state: StreamState,
    hits: Vec<String>,
    total: Option<usize>,
    artifact: Option<ExportArtifact>,
    frame_count: usize,
}

impl<'a> EventDispatcher<'a> {
    pub fn new(surface: &'a mut dyn DisplaySurface, export: Option<ExportRequest>) -> Self {
        Self {
            surface,
            export,
            state: StreamState::Streaming,
            hits: Vec::new(),
            total: None,
            artifact: None,
            frame_count: 0,
        }
    }

    /// Apply one frame. Never fails; kinds with no defined effect are no-ops.
    pub fn dispatch(&mut self, frame: Frame) {
        self.frame_count += 1;
        if self.state == StreamState::Done {
            // The producer closes right after `done`; anything later is noise.
            debug!("ignoring frame #{} received after done", self.frame_count);
            return;
        }
        match frame.event {
            EventKind::Hit => {
                let hit = frame.data.trim().to_string();
                debug!("hit #{}: {} chars", self.hits.len() + 1, hit.len());
                self.surface.append(&frame.data);
                self.surface.append("\n");
                self.hits.push(hit);
            }
            EventKind::Log => {
                self.surface.append(&frame.data);
                self.surface.append("\n");
            }
            EventKind::Meta => {
                self.total = parse_total(&frame.data);
                if let Some(total) = self.total {
                    info!("producer announced {total} names to check");
                }
            }
            EventKind::Done => {
                info!(
                    "stream completed: {} hits over {} frames",
                    self.hits.len(),
                    self.frame_count
                );
                self.surface.append("Completed.");
                self.state = StreamState::Done;
                if let Some(request) = self.export.take() {
                    if !self.hits.is_empty() {
                        self.artifact =
                            Some(ExportArtifact::build(&request.header, &self.hits, Utc::now()));
                    }
                }
            }
            // Reserved: a future protocol revision defines the effect.
            EventKind::Message => {}
            EventKind::Other(label) => {
                debug!("no handler for event kind {label:?}");
            }
        }
    }

    /// Whether the terminal frame has been observed.
    pub fn is_done(&self) -> bool {
        self.state == StreamState::Done
    }

    /// Consume the dispatcher into its end-of-request outcome.
    pub fn into_summary(self) -> StreamSummary {
        StreamSummary {
            completed: self.state == StreamState::Done,
            hits: self.hits,
            announced_total: self.total,
            artifact: self.artifact,
        }
    }
}

/// Payload of a `meta` frame, e.g. `total=42`.
fn parse_total(data: &str) -> Option<usize> {
    data.trim().strip_prefix("total=")?.parse().ok()
}

/// End-of-request outcome of the streaming path.
#[derive(Debug)]
pub struct StreamSummary {
    /// Whether the producer sent its terminal frame. A truncated stream
    /// leaves this false and never carries an artifact.
    pub completed: bool,
    /// Trimmed `hit` payloads in arrival order.
    pub hits: Vec<String>,
    /// Name count announced by the `meta` preamble, when present.
    pub announced_total: Option<usize>,
    /// Built exactly once, on `done`, when export was requested and at
    /// least one hit accumulated.
    pub artifact: Option<ExportArtifact>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::FrameDecoder;

    fn frame(event: EventKind, data: &str) -> Frame {
        Frame {
            event,
            data: data.to_string(),
        }
    }

    #[test]
    fn test_two_chunk_scenario() {
        // The canonical transcript: one hit, then done.
        let mut decoder = FrameDecoder::new();
        let mut surface = BufferSurface::new();
        let mut dispatcher = EventDispatcher::new(&mut surface, None);
        for chunk in [
            "event: hit\ndata: VirtualAlloc -> suspicious\n\n",
            "event: done\ndata: \n\n",
        ] {
            for frame in decoder.feed(chunk) {
                dispatcher.dispatch(frame);
            }
        }
        let summary = dispatcher.into_summary();
        assert!(summary.completed);
        assert_eq!(summary.hits, vec!["VirtualAlloc -> suspicious"]);
        assert_eq!(surface.snapshot(), "VirtualAlloc -> suspicious\n\nCompleted.");
    }

    #[test]
    fn test_hits_accumulate_in_order() {
        let mut surface = BufferSurface::new();
        let mut dispatcher = EventDispatcher::new(&mut surface, None);
        dispatcher.dispatch(frame(EventKind::Hit, "first\n"));
        dispatcher.dispatch(frame(EventKind::Log, "checking more\n"));
        dispatcher.dispatch(frame(EventKind::Hit, "second\n"));
        let summary = dispatcher.into_summary();
        assert_eq!(summary.hits, vec!["first", "second"]);
        assert!(!summary.completed);
    }

    #[test]
    fn test_log_renders_but_does_not_accumulate() {
        let mut surface = BufferSurface::new();
        let mut dispatcher = EventDispatcher::new(&mut surface, None);
        dispatcher.dispatch(frame(EventKind::Log, "3/10 CreateFileW miss\n"));
        let summary = dispatcher.into_summary();
        assert_eq!(surface.snapshot(), "3/10 CreateFileW miss\n\n");
        assert!(summary.hits.is_empty());
    }

    #[test]
    fn test_frames_after_done_ignored() {
        let mut surface = BufferSurface::new();
        let mut dispatcher = EventDispatcher::new(&mut surface, None);
        dispatcher.dispatch(frame(EventKind::Done, "END\n"));
        dispatcher.dispatch(frame(EventKind::Hit, "late finding\n"));
        dispatcher.dispatch(frame(EventKind::Done, "END\n"));
        let summary = dispatcher.into_summary();
        assert!(summary.completed);
        assert!(summary.hits.is_empty());
        assert_eq!(surface.snapshot(), "Completed.");
    }

    #[test]
    fn test_message_and_unknown_kinds_are_noops() {
        let mut surface = BufferSurface::new();
        let mut dispatcher = EventDispatcher::new(&mut surface, None);
        dispatcher.dispatch(frame(EventKind::Message, "reserved\n"));
        dispatcher.dispatch(frame(EventKind::Other("telemetry".into()), "x\n"));
        let summary = dispatcher.into_summary();
        assert_eq!(surface.snapshot(), "");
        assert!(summary.hits.is_empty());
    }

    #[test]
    fn test_meta_records_total() {
        let mut surface = BufferSurface::new();
        let mut dispatcher = EventDispatcher::new(&mut surface, None);
        dispatcher.dispatch(frame(EventKind::Meta, "total=42\n"));
        let summary = dispatcher.into_summary();
        assert_eq!(surface.snapshot(), "");
        assert_eq!(summary.announced_total, Some(42));
    }

    #[test]
    fn test_export_built_after_done_with_hits() {
        let mut surface = BufferSurface::new();
        let export = Some(ExportRequest {
            header: "APIE report for sample.exe".to_string(),
        });
        let mut dispatcher = EventDispatcher::new(&mut surface, export);
        dispatcher.dispatch(frame(EventKind::Hit, "VirtualAlloc\n--> mapped memory\n"));
        dispatcher.dispatch(frame(EventKind::Done, "END\n"));
        let summary = dispatcher.into_summary();
        let artifact = summary.artifact.expect("artifact after done with hits");
        assert_eq!(
            artifact.contents,
            "APIE report for sample.exe\n\nVirtualAlloc\n--> mapped memory"
        );
    }

    #[test]
    fn test_no_export_without_hits() {
        let mut surface = BufferSurface::new();
        let export = Some(ExportRequest {
            header: "APIE report".to_string(),
        });
        let mut dispatcher = EventDispatcher::new(&mut surface, export);
        dispatcher.dispatch(frame(EventKind::Done, "END\n"));
        assert!(dispatcher.into_summary().artifact.is_none());
    }

    #[test]
    fn test_no_export_without_done() {
        let mut surface = BufferSurface::new();
        let export = Some(ExportRequest {
            header: "APIE report".to_string(),
        });
        let mut dispatcher = EventDispatcher::new(&mut surface, export);
        dispatcher.dispatch(frame(EventKind::Hit, "OpenProcess\n"));
        let summary = dispatcher.into_summary();
        assert!(!summary.completed);
        assert!(summary.artifact.is_none());
    }

    #[test]
    fn test_no_export_when_not_requested() {
        let mut surface = BufferSurface::new();
        let mut dispatcher = EventDispatcher::new(&mut surface, None);
        dispatcher.dispatch(frame(EventKind::Hit, "OpenProcess\n"));
        dispatcher.dispatch(frame(EventKind::Done, "END\n"));
        assert!(dispatcher.into_summary().artifact.is_none());
    }
}
