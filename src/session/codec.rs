//! Newline-delimited line framing

use bytes::{BufMut, BytesMut};

use crate::error::ProtocolError;

/// Longest request line we accept
pub const MAX_LINE_LENGTH: usize = 1024;

/// Line terminator written on the wire
pub const TERMINATOR: u8 = b'\n';

/// Accumulates raw bytes and yields complete UTF-8 lines.
///
/// Accepts `\n` and `\r\n` terminators.
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    max_line: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::with_max_line(MAX_LINE_LENGTH)
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
            max_line,
        }
    }

    /// Buffer to read socket data into
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes waiting for a terminator
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete line, without its terminator
    pub fn next_line(&mut self) -> Result<Option<String>, ProtocolError> {
        let Some(pos) = self.buf.iter().position(|b| *b == TERMINATOR) else {
            if self.buf.len() > self.max_line {
                return Err(ProtocolError::LineTooLong(self.max_line));
            }
            return Ok(None);
        };

        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }

        if line.len() > self.max_line {
            return Err(ProtocolError::LineTooLong(self.max_line));
        }

        std::str::from_utf8(&line)
            .map(|s| Some(s.to_string()))
            .map_err(|_| ProtocolError::Decode)
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Append `line` plus terminator to `dst`
pub fn encode_line(line: &str, dst: &mut BytesMut) {
    dst.reserve(line.len() + 1);
    dst.put_slice(line.as_bytes());
    dst.put_u8(TERMINATOR);
}
