//! A small `Read` abstraction so the decoder can run over either a borrowed
//! slice or a generic [`std::io::Read`] source without duplicating the
//! parsing logic.

use std::io;

use crate::error::DecoderError;

mod ioread;
mod sliceread;

pub use ioread::IoReader;
pub use sliceread::SliceReader;

mod private {
    pub trait Sealed {}
}

/// Positional byte access used by the decoder.
///
/// Implementors track how many bytes have been consumed so far so that
/// errors can report a byte offset (§7).
pub trait Read: private::Sealed {
    /// Bytes consumed so far; used to annotate errors with a position.
    fn position(&self) -> usize;

    /// Peek the next byte without consuming it. `None` at end of input.
    fn peek(&mut self) -> Result<Option<u8>, DecoderError>;

    /// Read and consume the next byte. `None` at end of input.
    fn next(&mut self) -> Result<Option<u8>, DecoderError>;

    /// Read `n` bytes into a freshly allocated buffer.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecoderError>;

    /// Read exactly `N` bytes into a stack buffer; convenient for the
    /// fixed-width scalar readers.
    fn read_const_bytes<const N: usize>(&mut self) -> Result<[u8; N], DecoderError> {
        let bytes = self.read_bytes(N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(&bytes);
        Ok(buf)
    }

    /// Read `n` bytes and interpret them as a UTF-8 string.
    fn read_str(&mut self, n: usize) -> Result<String, DecoderError> {
        let position = self.position();
        let bytes = self.read_bytes(n)?;
        String::from_utf8(bytes).map_err(|_| DecoderError::InvalidUtf8(position))
    }

    /// Read exactly one byte, turning end-of-input into `Truncated`.
    fn require_next(&mut self) -> Result<u8, DecoderError> {
        let position = self.position();
        self.next()?.ok_or(DecoderError::Truncated {
            expected: 1,
            position,
        })
    }

    /// Peek one byte, turning end-of-input into `Truncated`.
    fn require_peek(&mut self) -> Result<u8, DecoderError> {
        let position = self.position();
        self.peek()?.ok_or(DecoderError::Truncated {
            expected: 1,
            position,
        })
    }
}

fn eof_to_truncated(err: io::Error, expected: usize, position: usize) -> DecoderError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        DecoderError::Truncated { expected, position }
    } else {
        DecoderError::Io(err)
    }
}
