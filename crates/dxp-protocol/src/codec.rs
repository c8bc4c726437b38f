//! Streaming line codec
//!
//! TCP reads do not respect line boundaries, so the codec buffers raw bytes
//! and hands out complete lines. Lines end with LF; an optional CR before it
//! is stripped. Surrounding whitespace is trimmed and empty lines are skipped.

use crate::response::DxpResponse;

/// Maximum line length (reasonable limit to prevent buffer overflow)
pub const MAX_LINE_LEN: usize = 256;

/// Streaming DXP response codec
#[derive(Debug)]
pub struct DxpCodec {
    buffer: Vec<u8>,
}

impl DxpCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Push raw bytes into the codec's buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent buffer overflow when no terminator arrives
        if self.buffer.len() > MAX_LINE_LEN * 4 && !self.buffer.contains(&b'\n') {
            tracing::warn!(
                "Discarding {} bytes of unterminated DXP data",
                self.buffer.len() - MAX_LINE_LEN
            );
            let start = self.buffer.len() - MAX_LINE_LEN;
            self.buffer = self.buffer[start..].to_vec();
        }
    }

    /// Extract the next complete, non-empty line
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let term_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let line_bytes: Vec<u8> = self.buffer.drain(..=term_pos).collect();

            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
    }

    /// Extract the next classified response
    pub fn next_response(&mut self) -> Option<DxpResponse> {
        self.next_response_with_line().map(|(resp, _)| resp)
    }

    /// Extract the next classified response along with the line it came from
    pub fn next_response_with_line(&mut self) -> Option<(DxpResponse, String)> {
        let line = self.next_line()?;
        Some((DxpResponse::parse(&line), line))
    }

    /// Number of buffered bytes not yet forming a complete line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for DxpCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_line() {
        let mut codec = DxpCodec::new();
        codec.push_bytes(b"Out02 In03\r\n");
        assert_eq!(
            codec.next_response(),
            Some(DxpResponse::Tie {
                output: 2,
                input: 3
            })
        );
        assert_eq!(codec.next_response(), None);
    }

    #[test]
    fn test_multiple_lines_in_one_read() {
        let mut codec = DxpCodec::new();
        codec.push_bytes(b"DXP 44 HD 4K Plus\r\nOut01 In01\r\nOut02 In04\r\n");

        assert_eq!(codec.next_line().as_deref(), Some("DXP 44 HD 4K Plus"));
        assert_eq!(codec.next_line().as_deref(), Some("Out01 In01"));
        assert_eq!(codec.next_line().as_deref(), Some("Out02 In04"));
        assert_eq!(codec.next_line(), None);
    }

    #[test]
    fn test_partial_line_is_buffered() {
        let mut codec = DxpCodec::new();
        codec.push_bytes(b"Out0");
        assert_eq!(codec.next_line(), None);
        assert_eq!(codec.pending(), 4);

        codec.push_bytes(b"3 In02\r");
        assert_eq!(codec.next_line(), None);

        codec.push_bytes(b"\n");
        assert_eq!(codec.next_line().as_deref(), Some("Out03 In02"));
        assert_eq!(codec.pending(), 0);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let mut codec = DxpCodec::new();
        codec.push_bytes(b"\r\n\r\n  \r\nE10\r\n\r\n");
        assert_eq!(codec.next_line().as_deref(), Some("E10"));
        assert_eq!(codec.next_line(), None);
    }

    #[test]
    fn test_bare_lf_accepted() {
        let mut codec = DxpCodec::new();
        codec.push_bytes(b"Out01 In02\n");
        assert_eq!(codec.next_line().as_deref(), Some("Out01 In02"));
    }

    #[test]
    fn test_response_with_line() {
        let mut codec = DxpCodec::new();
        codec.push_bytes(b"Exe1\r\n");
        let (resp, line) = codec.next_response_with_line().unwrap();
        assert_eq!(resp, DxpResponse::Unknown("Exe1".into()));
        assert_eq!(line, "Exe1");
    }

    #[test]
    fn test_overflow_guard() {
        let mut codec = DxpCodec::new();
        codec.push_bytes(&vec![b'x'; MAX_LINE_LEN * 4 + 1]);
        assert_eq!(codec.pending(), MAX_LINE_LEN);

        codec.push_bytes(b"\r\nOut01 In01\r\n");
        // The truncated garbage comes out as one unknown line
        assert!(matches!(
            codec.next_response(),
            Some(DxpResponse::Unknown(_))
        ));
        assert!(codec.next_response().unwrap().is_tie());
    }

    #[test]
    fn test_clear() {
        let mut codec = DxpCodec::new();
        codec.push_bytes(b"Out01");
        codec.clear();
        codec.push_bytes(b" In02\r\n");
        assert_eq!(codec.next_line().as_deref(), Some("In02"));
    }

    proptest! {
        #[test]
        fn split_reads_yield_same_lines(
            ties in prop::collection::vec((1u8..=16, 1u8..=16), 1..8),
            split in 0usize..200
        ) {
            let stream: String = ties
                .iter()
                .map(|(o, i)| format!("Out{:02} In{:02}\r\n", o, i))
                .collect();
            let bytes = stream.as_bytes();
            let split = split.min(bytes.len());

            let mut codec = DxpCodec::new();
            codec.push_bytes(&bytes[..split]);
            let mut parsed = Vec::new();
            while let Some(resp) = codec.next_response() {
                parsed.push(resp);
            }
            codec.push_bytes(&bytes[split..]);
            while let Some(resp) = codec.next_response() {
                parsed.push(resp);
            }

            let expected: Vec<DxpResponse> = ties
                .iter()
                .map(|&(output, input)| DxpResponse::Tie { output, input })
                .collect();
            prop_assert_eq!(parsed, expected);
        }
    }
}
