//! Custom error

use std::fmt;

/// A single step in the path from the encoded root to a container that
/// failed to encode.
///
/// Only populated for cycle-related failures; other [`EncoderError`]
/// variants carry an empty path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Index into an array.
    Index(usize),
    /// Key of an object entry.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Key(k) => write!(f, ".{k}"),
        }
    }
}

fn format_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    let mut s = String::new();
    for segment in path {
        s.push_str(&segment.to_string());
    }
    s
}

/// Errors raised while serializing a [`Value`](crate::Value) to bytes.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    /// An object had a key that could not be represented as a UBJSON string.
    #[error("object key is not a string")]
    NonStringKey,

    /// The value being encoded has no representation in the wire format.
    #[error("value of kind {0} cannot be encoded")]
    Unencodable(&'static str),

    /// A container refers back to itself, directly or through a descendant.
    #[error("cycle detected at {}", format_path(.0))]
    Cycle(Vec<PathSegment>),

    /// The underlying writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while parsing bytes into a [`Value`](crate::Value).
///
/// `std::io::Error` isn't `PartialEq`, so this can't derive it; see the
/// manual impl below, which compares the `Io` variant by `ErrorKind`.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// The input contained no bytes at all.
    #[error("empty input")]
    EmptyInput,

    /// A byte appeared where a marker was expected, and it matches no
    /// known marker.
    #[error("invalid marker byte 0x{byte:02x} at position {position}")]
    InvalidMarker {
        /// The offending byte.
        byte: u8,
        /// Byte offset at which it was read.
        position: usize,
    },

    /// Fewer bytes remained in the input than a length prefix declared.
    #[error("truncated input: expected {expected} more byte(s) at position {position}")]
    Truncated {
        /// Bytes required to satisfy the in-progress read.
        expected: usize,
        /// Byte offset at which the read started.
        position: usize,
    },

    /// A string, char, key, or high-precision payload was not valid UTF-8.
    #[error("invalid UTF-8 encoding at position {0}")]
    InvalidUtf8(usize),

    /// A high-precision payload could not be parsed as a decimal number.
    #[error("invalid decimal literal {literal:?} at position {position}")]
    InvalidDecimal {
        /// The literal text that failed to parse.
        literal: String,
        /// Byte offset of the payload.
        position: usize,
    },

    /// A typed container's `$` element-type marker was not followed by `#`.
    #[error("typed container missing count marker at position {0}")]
    MissingCountMarker(usize),

    /// A `C` (char) payload was not in the ASCII range.
    #[error("non-ASCII char payload at position {0}")]
    NonAsciiChar(usize),

    /// A length prefix decoded to a negative number.
    #[error("negative length prefix at position {0}")]
    NegativeLength(usize),

    /// Container or value nesting exceeded the configured recursion bound.
    #[error("maximum nesting depth exceeded at position {0}")]
    DepthExceeded(usize),

    /// The underlying reader failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::string::FromUtf8Error> for DecoderError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        // Position is not known at this call site; callers that can report
        // a position construct `InvalidUtf8` directly instead.
        DecoderError::InvalidUtf8(0)
    }
}

impl From<std::str::Utf8Error> for DecoderError {
    fn from(_: std::str::Utf8Error) -> Self {
        DecoderError::InvalidUtf8(0)
    }
}

impl PartialEq for DecoderError {
    fn eq(&self, other: &Self) -> bool {
        use DecoderError::*;
        match (self, other) {
            (EmptyInput, EmptyInput) => true,
            (
                InvalidMarker { byte: b1, position: p1 },
                InvalidMarker { byte: b2, position: p2 },
            ) => b1 == b2 && p1 == p2,
            (
                Truncated { expected: e1, position: p1 },
                Truncated { expected: e2, position: p2 },
            ) => e1 == e2 && p1 == p2,
            (InvalidUtf8(a), InvalidUtf8(b)) => a == b,
            (
                InvalidDecimal { literal: l1, position: p1 },
                InvalidDecimal { literal: l2, position: p2 },
            ) => l1 == l2 && p1 == p2,
            (MissingCountMarker(a), MissingCountMarker(b)) => a == b,
            (NonAsciiChar(a), NonAsciiChar(b)) => a == b,
            (NegativeLength(a), NegativeLength(b)) => a == b,
            (DepthExceeded(a), DepthExceeded(b)) => a == b,
            (Io(a), Io(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

impl Eq for DecoderError {}
