//! Byte cursors feeding the parser
//!
//! Two sources: a fixed in-memory slice and a pull-based byte stream. Both
//! support single-byte pushback, which is all the lookahead the grammar
//! needs, and report the current byte offset for diagnostics.

use crate::error::{Result, SexpError};
use std::io::{self, Read};

pub trait ByteCursor {
    /// Next byte, or `None` at end of input.
    fn next(&mut self) -> Result<Option<u8>>;

    /// Return the most recently read byte to the front. At most one byte
    /// may be pushed back between reads; further calls are no-ops.
    fn unget(&mut self);

    /// Offset of the next byte to be read.
    fn offset(&self) -> u64;
}

/// Cursor over a fixed in-memory byte region.
pub struct SliceCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceCursor { data, pos: 0 }
    }

    /// Offset of the first unconsumed byte.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl ByteCursor for SliceCursor<'_> {
    fn next(&mut self) -> Result<Option<u8>> {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }

    fn unget(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
        }
    }

    fn offset(&self) -> u64 {
        self.pos as u64
    }
}

/// Cursor pulling single bytes from an [`io::Read`] stream.
///
/// Callers should hand in a buffered reader; the cursor itself reads one
/// byte at a time. I/O failures surface as [`SexpError::Io`] carrying the
/// offset at which the read was attempted.
pub struct StreamCursor<R: Read> {
    inner: R,
    pushed: Option<u8>,
    last: Option<u8>,
    offset: u64,
}

impl<R: Read> StreamCursor<R> {
    pub fn new(inner: R) -> Self {
        StreamCursor {
            inner,
            pushed: None,
            last: None,
            offset: 0,
        }
    }
}

impl<R: Read> ByteCursor for StreamCursor<R> {
    fn next(&mut self) -> Result<Option<u8>> {
        if let Some(b) = self.pushed.take() {
            self.last = Some(b);
            self.offset += 1;
            return Ok(Some(b));
        }
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => {
                    self.last = None;
                    return Ok(None);
                }
                Ok(_) => {
                    self.last = Some(byte[0]);
                    self.offset += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(SexpError::Io {
                        message: e.to_string(),
                        offset: self.offset,
                    })
                }
            }
        }
    }

    fn unget(&mut self) {
        if self.pushed.is_none() {
            if let Some(b) = self.last.take() {
                self.pushed = Some(b);
                self.offset -= 1;
            }
        }
    }

    fn offset(&self) -> u64 {
        self.offset
    }
}
