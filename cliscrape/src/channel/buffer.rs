//! Pattern buffer with tail-search optimization.
//!
//! Prompt detection only looks at the last `search_depth` bytes of what has
//! been read so far, so a multi-megabyte `show running-config` costs the
//! same per chunk as a one-line reply.

use bytes::BytesMut;
use regex::bytes::Regex;

/// Accumulates device output and searches its tail for prompt patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output, ANSI sequences already stripped.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Search only the tail of the buffer for the pattern.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.find(&self.buffer[start..])
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Take the buffer contents as text and reset.
    pub fn take_string(&mut self) -> String {
        let data = self.buffer.split();
        String::from_utf8_lossy(&data).into_owned()
    }

}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
