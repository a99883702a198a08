/// file: src/sse.rs
/// description: incremental line decoder for text/event-stream bodies

const DATA_PREFIX: &str = "data: ";

/// Longest line kept; anything longer is dropped as malformed.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Buffers raw body chunks and yields complete lines.
///
/// Chunks may split lines (or multi-byte characters) anywhere; only bytes up
/// to the last newline are decoded. Lines over the length cap are discarded
/// and tallied in [`LineDecoder::take_oversized`].
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    // prefix of `buffer` already known to hold no newline
    scanned: usize,
    max_line: usize,
    // inside an oversized line; bytes are skipped until the next newline
    discarding: bool,
    oversized: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line,
            discarding: false,
            oversized: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut chunk = chunk;

        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(idx) => {
                    self.discarding = false;
                    chunk = &chunk[idx + 1..];
                }
                None => return lines,
            }
        }
        self.buffer.extend_from_slice(chunk);

        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            let mut line = &self.buffer[start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            if line.len() > self.max_line {
                self.oversized += 1;
            } else {
                lines.push(String::from_utf8_lossy(line).into_owned());
            }
            start = end + 1;
            search_from = start;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        if self.buffer.len() > self.max_line {
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
            self.oversized += 1;
        }
        lines
    }

    /// Number of lines dropped for length since the last call.
    pub fn take_oversized(&mut self) -> usize {
        std::mem::take(&mut self.oversized)
    }

    /// Whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) || self.buffer.is_empty() {
            self.buffer.clear();
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest)
            .trim_end_matches('\r')
            .to_string();
        (!line.trim().is_empty()).then_some(line)
    }
}

/// Payload of a `data: ` line, `None` for comments, event names and blanks.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}
