//! Incremental UTF-8 decoding
//!
//! The transport chunks bytes with no regard for character boundaries, so a
//! multi-byte sequence can arrive half in one chunk and half in the next.
//! The decoder carries the incomplete tail over instead of corrupting it.

/// Streaming UTF-8 decoder. Invalid sequences decode as U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Incomplete trailing sequence held over from the previous chunk.
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk together with any held-over bytes.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        // Truncated sequence at the end of input: wait for
                        // the rest of it.
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                        Some(len) => {
                            out.push('\u{FFFD}');
                            rest = &tail[len..];
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush held-over bytes at end-of-stream. A sequence that never got its
    /// continuation bytes becomes a single replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            "\u{FFFD}".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"event: hit\n"), "event: hit\n");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        // "héllo" with the two-byte é split between chunks.
        let bytes = "h\u{e9}llo".as_bytes();
        let mut decoder = Utf8Decoder::new();
        let first = decoder.decode(&bytes[..2]);
        let second = decoder.decode(&bytes[2..]);
        assert_eq!(format!("{first}{second}"), "h\u{e9}llo");
    }

    #[test]
    fn test_four_byte_sequence_split_every_way() {
        let text = "a\u{1F980}b";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = Utf8Decoder::new();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            out.push_str(&decoder.finish());
            assert_eq!(out, text, "split at byte {split}");
        }
    }

    #[test]
    fn test_invalid_byte_becomes_replacement() {
        let mut decoder = Utf8Decoder::new();
        let out = decoder.decode(&[b'a', 0xFF, b'b']);
        assert_eq!(out, "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_tail_flushed_at_finish() {
        let mut decoder = Utf8Decoder::new();
        // First two bytes of a three-byte sequence, never completed.
        assert_eq!(decoder.decode(&[0xE2, 0x82]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
