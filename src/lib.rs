//! A codec for the Universal Binary JSON (UBJSON) draft-12 format.
//!
//! The crate's only data type is [`Value`]; [`encode_to_vec`]/
//! [`encode_to_writer`] turn one into bytes, [`decode_from_slice`]/
//! [`decode_from_reader`] turn bytes back into one. See the
//! [UBJSON specification](https://ubjson.org/type-reference/) for the wire
//! format itself.
//!
//! ```
//! use ubjson::{decode_from_slice, encode_to_vec, DecodeOptions, EncodeOptions, Value};
//!
//! let value = Value::from("hello");
//! let bytes = encode_to_vec(&value, &EncodeOptions::default()).unwrap();
//! let decoded = decode_from_slice(&bytes, &DecodeOptions::default()).unwrap();
//! assert_eq!(value, decoded);
//! ```

mod convert;
mod decoder;
mod encoder;
mod error;
mod marker;
mod read;
mod value;
mod width;

pub use convert::ValueError;
pub use decoder::{decode_from_reader, decode_from_slice, DecodeOptions};
pub use encoder::{encode_to_vec, encode_to_writer, EncodeOptions};
pub use error::{DecoderError, EncoderError, PathSegment};
pub use marker::Marker;
pub use read::{IoReader, Read, SliceReader};
pub use value::{SharedArray, SharedObject, Value};

#[cfg(feature = "json")]
mod json;

#[cfg(feature = "json")]
pub use json::FromJsonError;
