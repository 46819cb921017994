//! Splitting a raw IPC byte stream into JSON values.
//!
//! Nodes write one JSON document per response with no length prefix and no
//! guaranteed delimiter, so a read may end mid-document or contain several.

use serde::de::DeserializeOwned;

/// Accumulates bytes read from an IPC stream and yields complete JSON values.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop everything buffered (used after the stream breaks).
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Take the next complete JSON value off the front of the buffer.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Malformed input is an
    /// error; the buffer is left untouched in that case.
    pub fn next_frame<T: DeserializeOwned>(&mut self) -> Result<Option<T>, serde_json::Error> {
        let (next, consumed) = {
            let mut stream = serde_json::Deserializer::from_slice(&self.buf).into_iter::<T>();
            let next = stream.next();
            (next, stream.byte_offset())
        };
        match next {
            None => {
                // whitespace only
                self.buf.clear();
                Ok(None)
            }
            Some(Ok(value)) => {
                self.buf.drain(..consumed);
                Ok(Some(value))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(e),
        }
    }
}
