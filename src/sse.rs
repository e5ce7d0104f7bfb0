//! Server-Sent Events (SSE) frame parsing.
//!
//! Turns raw transport chunks into the JSON payloads carried on `data: `
//! lines. Blocks are separated by a blank line:
//! ```text
//! data: {"type":"delta","content":"Hel"}
//!
//! data: {"type":"delta","content":"lo"}
//!
//! data: {"type":"done"}
//! ```
//!
//! Chunk boundaries may fall anywhere, including inside the `\n\n` delimiter
//! or inside a multi-byte UTF-8 character. The parser output depends only on
//! the concatenated bytes, never on how they were split.

/// Separator between two event blocks.
const BLOCK_DELIMITER: &str = "\n\n";

/// Incremental SSE block parser with a carry-over buffer.
///
/// # Example
/// ```
/// use thinkstream::sse::FrameParser;
///
/// let mut parser = FrameParser::new();
/// assert!(parser.feed(b"data: {\"type\":\"do").is_empty());
/// assert_eq!(parser.feed(b"ne\"}\n\n"), vec!["{\"type\":\"done\"}".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct FrameParser {
    /// Decoded text not yet terminated by a block delimiter.
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    undecoded: Vec<u8>,
}

impl FrameParser {
    /// Create a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk and return the payloads of every block it
    /// completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find(BLOCK_DELIMITER) {
            let block: String = self.buffer.drain(..pos + BLOCK_DELIMITER.len()).collect();
            payloads.extend(block_payloads(&block[..pos]));
        }
        payloads
    }

    /// Drain whatever is left once the transport reports completion.
    ///
    /// Stranded bytes are decoded lossily and the remaining text is treated
    /// as a final, unterminated block.
    pub fn finish(&mut self) -> Vec<String> {
        if !self.undecoded.is_empty() {
            let tail = std::mem::take(&mut self.undecoded);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }

        let block = std::mem::take(&mut self.buffer);
        block_payloads(&block)
    }

    fn decode(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.undecoded);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, invalid) = rest.split_at(e.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &invalid[len..];
                        }
                        None => {
                            // Sequence may be completed by the next chunk.
                            self.undecoded = invalid.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Extract the `data: ` payloads of one block.
///
/// Lines without the prefix and blank payloads are ignored.
fn block_payloads(block: &str) -> Vec<String> {
    if block.trim().is_empty() {
        return Vec::new();
    }

    block
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter_map(parse_sse_line)
        .filter(|data| !data.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an SSE line to extract the data portion.
///
/// SSE lines are in the format: `data: <content>`
///
/// # Example
/// ```
/// use thinkstream::sse::parse_sse_line;
///
/// let line = "data: {\"key\": \"value\"}";
/// assert_eq!(parse_sse_line(line), Some("{\"key\": \"value\"}"));
///
/// let line = "event: message";
/// assert_eq!(parse_sse_line(line), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix("data: ").map(|s| s.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = concat!(
        "data: {\"type\":\"delta\",\"content\":\"你好\",\"isThink\":true}\n\n",
        ": keep-alive\n\n",
        "event: message\ndata: {\"type\":\"delta\",\"content\":\"Hel\"}\n\n",
        "data: {\"type\":\"delta\",\"content\":\"lo\"}\n\n",
        "data: {\"type\":\"done\"}\n\n",
    );

    fn parse_all(chunks: &[&[u8]]) -> Vec<String> {
        let mut parser = FrameParser::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(parser.feed(chunk));
        }
        out.extend(parser.finish());
        out
    }

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: hello"), Some("hello"));
        assert_eq!(parse_sse_line("data:   spaces  "), Some("spaces"));
        assert_eq!(parse_sse_line("data:nospace"), None);
        assert_eq!(parse_sse_line("invalid"), None);
        assert_eq!(parse_sse_line(""), None);
    }

    #[test]
    fn test_single_chunk() {
        let payloads = parse_all(&[STREAM.as_bytes()]);
        assert_eq!(payloads.len(), 4);
        assert_eq!(payloads[1], "{\"type\":\"delta\",\"content\":\"Hel\"}");
        assert_eq!(payloads[3], "{\"type\":\"done\"}");
    }

    #[test]
    fn test_every_two_way_split_is_equivalent() {
        let bytes = STREAM.as_bytes();
        let expected = parse_all(&[bytes]);

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(parse_all(&[a, b]), expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let bytes = STREAM.as_bytes();
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(parse_all(&chunks), parse_all(&[bytes]));
    }

    #[test]
    fn test_delimiter_spanning_chunks() {
        let mut parser = FrameParser::new();
        assert!(parser.feed(b"data: {\"a\":1}\n").is_empty());
        assert_eq!(parser.feed(b"\ndata: {\"b\":2}"), vec!["{\"a\":1}"]);
        assert_eq!(parser.finish(), vec!["{\"b\":2}"]);
    }

    #[test]
    fn test_blank_blocks_and_foreign_lines_are_dropped() {
        let payloads = parse_all(&[b"\n\n   \n\nid: 7\nretry: 10\n\ndata:    \n\n"]);
        assert!(payloads.is_empty());
    }

    #[test]
    fn test_multiple_data_lines_in_one_block() {
        let payloads = parse_all(&[b"data: {\"a\":1}\ndata: {\"b\":2}\n\n"]);
        assert_eq!(payloads, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_crlf_line_endings_inside_block() {
        let payloads = parse_all(&[b"event: x\r\ndata: {\"a\":1}\r\n\n"]);
        assert_eq!(payloads, vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_unterminated_final_block_is_drained() {
        let mut parser = FrameParser::new();
        assert!(parser.feed(b"data: {\"type\":\"done\"}").is_empty());
        assert_eq!(parser.finish(), vec!["{\"type\":\"done\"}"]);
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let payloads = parse_all(&[b"data: {\"c\":\"a\xffb\"}\n\n"]);
        assert_eq!(payloads, vec!["{\"c\":\"a\u{FFFD}b\"}"]);
    }

    #[test]
    fn test_truncated_utf8_at_end_is_replaced() {
        let mut parser = FrameParser::new();
        assert!(parser.feed(b"data: x\xe4\xbd").is_empty());
        assert_eq!(parser.finish(), vec!["x\u{FFFD}"]);
    }
}
