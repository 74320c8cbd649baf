use bytes::BytesMut;

use crate::error::{ProtocolError, ProtocolResult};
use crate::ports::DEFAULT_MAX_LINE_BYTES;

/// Reassembles a byte stream into newline-terminated command lines.
///
/// Each connection owns one framer. Bytes after the last newline are kept
/// until a later chunk completes them. The retained fragment is bounded by
/// `max_line_bytes`; callers check [`LineFramer::check_capacity`] after each
/// chunk and drop the connection when it fails.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    /// Bytes of `buf` already known not to contain a newline.
    scanned: usize,
    max_line_bytes: usize,
}

impl LineFramer {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            max_line_bytes,
        }
    }

    /// Append a chunk and return every line it completes, in arrival order,
    /// with the newline stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + pos;
            let line = self.buf.split_to(end + 1);
            lines.push(String::from_utf8_lossy(&line[..end]).into_owned());
            self.scanned = 0;
        }
        self.scanned = self.buf.len();
        lines
    }

    /// Fails once the unterminated fragment grows past the configured cap.
    pub fn check_capacity(&self) -> ProtocolResult<()> {
        if self.buf.len() > self.max_line_bytes {
            return Err(ProtocolError::LineTooLong {
                size: self.buf.len(),
                max: self.max_line_bytes,
            });
        }
        Ok(())
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    /// Consume the framer, returning any unterminated trailing fragment.
    pub fn finish(self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buf).into_owned())
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}
