//! Frame decoding
//!
//! Splits the accumulating text buffer into complete protocol frames on the
//! blank-line delimiter. The transport chunks bytes arbitrarily, so a frame
//! may arrive in any number of pieces; whatever trails the last delimiter
//! stays buffered for the next feed.

use tracing::debug;

/// Kind of a protocol event frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Default for frames without an `event:` line. No effect today.
    Message,
    /// One analysis finding.
    Hit,
    /// Progress/diagnostic text.
    Log,
    /// Stream preamble announcing how many names will be checked.
    Meta,
    /// Terminal marker; the producer closes the stream right after it.
    Done,
    /// Unrecognized label, dispatched like `Message`.
    Other(String),
}

impl EventKind {
    fn from_label(label: &str) -> Self {
        match label {
            "message" => EventKind::Message,
            "hit" => EventKind::Hit,
            "log" => EventKind::Log,
            "meta" => EventKind::Meta,
            "done" => EventKind::Done,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// One complete protocol unit: an event kind plus its payload.
///
/// `data` holds every `data:` line of the frame, each followed by a newline,
/// in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: EventKind,
    pub data: String,
}

/// Incremental frame parser: text in, complete frames out, remainder kept.
///
/// After every [`feed`](Self::feed) the buffer holds either nothing or a
/// strict prefix of a not-yet-terminated frame, so the decoded frame
/// sequence is identical no matter how the input was chunked.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` to the buffer and drain every complete frame from it.
    pub fn feed(&mut self, text: &str) -> Vec<Frame> {
        self.buffer.push_str(text);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let frame = parse_frame(&self.buffer[..pos]);
            self.buffer.replace_range(..pos + 2, "");
            if let Some(frame) = frame {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush the final unterminated frame once the source is exhausted.
    pub fn finish(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buffer);
        parse_frame(&rest)
    }
}

/// Parse one delimiter-separated segment. `None` for an empty frame.
fn parse_frame(raw: &str) -> Option<Frame> {
    let mut event = None;
    let mut data = String::new();
    let mut saw_data = false;

    for line in raw.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(EventKind::from_label(rest.trim()));
        } else if let Some(rest) = line.strip_prefix("data:") {
            // At most one leading space comes off; further whitespace is payload.
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            data.push('\n');
            saw_data = true;
        } else {
            debug!("ignoring non-protocol line: {line:?}");
        }
    }

    if event.is_none() && !saw_data {
        return None;
    }
    Some(Frame {
        event: event.unwrap_or(EventKind::Message),
        data,
    })
}
