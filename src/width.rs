//! Shared integer-width selection and big-endian (de)serialization.
//!
//! This single helper backs both scalar integer encoding and every length
//! prefix (string/bytes/high-precision payload length, container count).
//! Big-endian is mandatory; the marker chosen is always the narrowest one
//! that can represent the value.

use num_bigint::BigInt;

use crate::error::DecoderError;
use crate::marker::Marker;

/// A sized, narrowest-fit integer ready to be written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizedInt {
    Uint8(u8),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
}

impl SizedInt {
    pub(crate) fn marker(self) -> Marker {
        match self {
            SizedInt::Uint8(_) => Marker::Uint8,
            SizedInt::Int8(_) => Marker::Int8,
            SizedInt::Int16(_) => Marker::Int16,
            SizedInt::Int32(_) => Marker::Int32,
            SizedInt::Int64(_) => Marker::Int64,
        }
    }

    pub(crate) fn write_payload(self, out: &mut Vec<u8>) {
        match self {
            SizedInt::Uint8(v) => out.push(v),
            SizedInt::Int8(v) => out.push(v as u8),
            SizedInt::Int16(v) => out.extend_from_slice(&v.to_be_bytes()),
            SizedInt::Int32(v) => out.extend_from_slice(&v.to_be_bytes()),
            SizedInt::Int64(v) => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    /// Write the marker byte followed by the big-endian payload.
    pub(crate) fn write(self, out: &mut Vec<u8>) {
        out.push(self.marker().as_u8());
        self.write_payload(out);
    }
}

/// Selects the narrowest legal width for `n`, per §4.2/§4.4: the first fit
/// in order `U` (0..255), `i` (-128..-1), `I` (-32768..32767), `l` (i32
/// range), `L` (i64 range). Returns `None` when `n` falls outside the
/// signed 64-bit range, in which case the caller must fall back to `H`.
pub(crate) fn select_width(n: &BigInt) -> Option<SizedInt> {
    use num_traits::ToPrimitive;

    if let Some(u) = n.to_u8() {
        return Some(SizedInt::Uint8(u));
    }
    if let Some(i) = n.to_i8() {
        if i < 0 {
            return Some(SizedInt::Int8(i));
        }
    }
    if let Some(v) = n.to_i16() {
        return Some(SizedInt::Int16(v));
    }
    if let Some(v) = n.to_i32() {
        return Some(SizedInt::Int32(v));
    }
    if let Some(v) = n.to_i64() {
        return Some(SizedInt::Int64(v));
    }
    None
}

/// Same selection policy, for a non-negative length/count. Lengths never
/// land on `Int8` since `Uint8` covers 0..=255 first.
pub(crate) fn select_length_width(len: usize) -> SizedInt {
    select_width(&BigInt::from(len))
        .expect("length exceeds i64, which is not representable on this platform's usize")
}

/// Validates a decoded length/count integer: negative values are a decode
/// error, per §4.3. Called after reading the integer payload that follows
/// a fresh width marker.
pub(crate) fn validate_length(payload: i64, position: usize) -> Result<usize, DecoderError> {
    if payload < 0 {
        return Err(DecoderError::NegativeLength(position));
    }
    Ok(payload as usize)
}
