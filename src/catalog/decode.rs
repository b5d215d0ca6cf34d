//! Incremental splitter for a top-level JSON array.
//!
//! serde_json has no push-based array decoder, so the streaming tier splits
//! the body into element slices itself and decodes each one independently.
//! The scanner only tracks nesting depth and string state; element contents
//! are validated later by serde.

use crate::{LicatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the opening `[`.
    Start,
    /// Inside the array.
    Elements,
    /// After the closing `]`.
    Done,
}

/// Splits a byte stream holding one JSON array into its top-level elements.
///
/// Feed chunks as they arrive with [`feed()`](Self::feed); every element that
/// is complete after the chunk is returned. Call [`finish()`](Self::finish)
/// at end of input to detect a truncated body.
#[derive(Debug)]
pub struct JsonArrayDecoder {
    state: State,
    buf: Vec<u8>,
    depth: usize,
    in_string: bool,
    escape: bool,
    emitted: usize,
}

impl Default for JsonArrayDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonArrayDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            buf: Vec::new(),
            depth: 0,
            in_string: false,
            escape: false,
            emitted: 0,
        }
    }

    /// Number of elements returned so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Consume a chunk and return the elements it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        for &b in chunk {
            match self.state {
                State::Start => match b {
                    b'[' => self.state = State::Elements,
                    _ if b.is_ascii_whitespace() => {}
                    // UTF-8 byte order mark
                    0xEF | 0xBB | 0xBF => {}
                    _ => {
                        return Err(LicatError::Decode(format!(
                            "expected a JSON array, found byte 0x{b:02x}"
                        )));
                    }
                },
                State::Done => {
                    if !b.is_ascii_whitespace() {
                        return Err(LicatError::Decode(
                            "trailing data after JSON array".to_string(),
                        ));
                    }
                }
                State::Elements => self.scan(b, &mut out)?,
            }
        }
        Ok(out)
    }

    fn scan(&mut self, b: u8, out: &mut Vec<Vec<u8>>) -> Result<()> {
        if self.in_string {
            self.buf.push(b);
            if self.escape {
                self.escape = false;
            } else if b == b'\\' {
                self.escape = true;
            } else if b == b'"' {
                self.in_string = false;
            }
            return Ok(());
        }

        if self.depth > 0 {
            self.buf.push(b);
            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => self.depth -= 1,
                _ => {}
            }
            return Ok(());
        }

        match b {
            b',' => {
                if self.buf.is_empty() {
                    return Err(LicatError::Decode("empty array element".to_string()));
                }
                self.emit(out);
            }
            b']' => {
                if !self.buf.is_empty() {
                    self.emit(out);
                }
                self.state = State::Done;
            }
            _ if b.is_ascii_whitespace() => {
                if !self.buf.is_empty() {
                    self.buf.push(b);
                }
            }
            b'{' | b'[' => {
                self.depth += 1;
                self.buf.push(b);
            }
            b'"' => {
                self.in_string = true;
                self.buf.push(b);
            }
            _ => self.buf.push(b),
        }
        Ok(())
    }

    fn emit(&mut self, out: &mut Vec<Vec<u8>>) {
        out.push(std::mem::take(&mut self.buf));
        self.emitted += 1;
    }

    /// Signal end of input. Fails unless the closing `]` was seen.
    pub fn finish(&self) -> Result<()> {
        match self.state {
            State::Done => Ok(()),
            State::Start => Err(LicatError::Decode("empty response body".to_string())),
            State::Elements => Err(LicatError::Decode(format!(
                "JSON array truncated after {} elements",
                self.emitted
            ))),
        }
    }
}
