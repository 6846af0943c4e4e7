//! The decoder state machine (§4.3): marker dispatch, container parsing
//! (delimited, counted, and typed+counted forms), and numeric/text payload
//! reading.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::rc::Rc;
use std::str::FromStr;

use indexmap::IndexMap;
use num_bigint::BigInt;
use rust_decimal::Decimal;

use crate::error::DecoderError;
use crate::marker::{marker_at, Marker};
use crate::read::{IoReader, Read, SliceReader};
use crate::value::Value;
use crate::width;

/// Per-call decoding options.
#[derive(Clone)]
pub struct DecodeOptions {
    /// Return a typed `i`/`U` array as a plain integer array instead of
    /// [`Value::Bytes`].
    pub no_bytes: bool,
    /// Invoked with the ordered key/value pairs of each decoded object;
    /// its return value replaces the object that would otherwise be built.
    pub object_pairs_hook: Option<Rc<dyn Fn(Vec<(String, Value)>) -> Value>>,
    /// Share storage between repeated object key strings within one decode.
    pub intern_object_keys: bool,
    /// Maximum container nesting depth before `DecoderError::DepthExceeded`.
    pub max_depth: usize,
}

impl fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("no_bytes", &self.no_bytes)
            .field("object_pairs_hook", &self.object_pairs_hook.is_some())
            .field("intern_object_keys", &self.intern_object_keys)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            no_bytes: false,
            object_pairs_hook: None,
            intern_object_keys: false,
            max_depth: 512,
        }
    }
}

struct Decoder<R> {
    reader: R,
    options: DecodeOptions,
    depth: usize,
    key_cache: HashMap<String, String>,
}

impl<R: Read> Decoder<R> {
    fn new(reader: R, options: DecodeOptions) -> Self {
        Self {
            reader,
            options,
            depth: 0,
            key_cache: HashMap::new(),
        }
    }

    fn enter(&mut self) -> Result<(), DecoderError> {
        if self.depth >= self.options.max_depth {
            return Err(DecoderError::DepthExceeded(self.reader.position()));
        }
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    fn decode_value(&mut self) -> Result<Value, DecoderError> {
        loop {
            let position = self.reader.position();
            let byte = self.reader.require_next()?;
            let marker = marker_at(byte, position)?;
            if marker == Marker::NoOp {
                continue;
            }
            return self.decode_value_by_marker(marker, position);
        }
    }

    /// Dispatches on an already-read marker, used both for ordinary values
    /// and for typed-container elements where the marker is fixed up front.
    fn decode_value_by_marker(
        &mut self,
        marker: Marker,
        position: usize,
    ) -> Result<Value, DecoderError> {
        match marker {
            Marker::Null => Ok(Value::Null),
            Marker::True => Ok(Value::Bool(true)),
            Marker::False => Ok(Value::Bool(false)),
            Marker::Uint8 | Marker::Int8 | Marker::Int16 | Marker::Int32 | Marker::Int64 => {
                self.decode_integer_value(marker).map(Value::Integer)
            }
            Marker::Float32 => self.decode_float32().map(Value::Float),
            Marker::Float64 => self.decode_float64().map(Value::Float),
            Marker::HighPrecision => self.decode_high_precision(),
            Marker::Char => self.decode_char(),
            Marker::Str => self.decode_text().map(Value::String),
            Marker::ArrayStart => self.decode_array(),
            Marker::ObjectStart => self.decode_object(),
            Marker::NoOp => unreachable!("no-op is consumed before dispatch"),
            other => Err(DecoderError::InvalidMarker {
                byte: other.as_u8(),
                position,
            }),
        }
    }

    fn read_raw_integer(&mut self, marker: Marker) -> Result<i64, DecoderError> {
        let n = match marker {
            Marker::Uint8 => self.reader.require_next()? as i64,
            Marker::Int8 => (self.reader.require_next()? as i8) as i64,
            Marker::Int16 => i16::from_be_bytes(self.reader.read_const_bytes()?) as i64,
            Marker::Int32 => i32::from_be_bytes(self.reader.read_const_bytes()?) as i64,
            Marker::Int64 => i64::from_be_bytes(self.reader.read_const_bytes()?),
            _ => unreachable!("read_raw_integer called with a non-integer marker"),
        };
        Ok(n)
    }

    fn decode_integer_value(&mut self, marker: Marker) -> Result<BigInt, DecoderError> {
        Ok(BigInt::from(self.read_raw_integer(marker)?))
    }

    fn decode_float32(&mut self) -> Result<f64, DecoderError> {
        Ok(f32::from_be_bytes(self.reader.read_const_bytes()?) as f64)
    }

    fn decode_float64(&mut self) -> Result<f64, DecoderError> {
        Ok(f64::from_be_bytes(self.reader.read_const_bytes()?))
    }

    /// A fresh marker introduces the integer width of a length prefix
    /// (string/bytes/high-precision payload length, container count).
    fn read_length(&mut self) -> Result<usize, DecoderError> {
        let position = self.reader.position();
        let byte = self.reader.require_next()?;
        let marker = marker_at(byte, position)?;
        if !marker.is_integer() {
            return Err(DecoderError::InvalidMarker { byte, position });
        }
        let raw = self.read_raw_integer(marker)?;
        width::validate_length(raw, position)
    }

    fn decode_text(&mut self) -> Result<String, DecoderError> {
        let len = self.read_length()?;
        self.reader.read_str(len)
    }

    fn decode_char(&mut self) -> Result<Value, DecoderError> {
        let position = self.reader.position();
        let byte = self.reader.require_next()?;
        if byte >= 0x80 {
            return Err(DecoderError::NonAsciiChar(position));
        }
        Ok(Value::Char(byte as char))
    }

    fn decode_high_precision(&mut self) -> Result<Value, DecoderError> {
        let position = self.reader.position();
        let text = self.decode_text()?;
        match text.as_str() {
            "inf" => return Ok(Value::Float(f64::INFINITY)),
            "-inf" => return Ok(Value::Float(f64::NEG_INFINITY)),
            "nan" => return Ok(Value::Float(f64::NAN)),
            _ => {}
        }
        // `encode_integer` falls back to this same marker for a BigInt
        // outside the i64 range, writing its bare base-10 text -- which can
        // exceed `Decimal`'s ~29 significant digits. Recognize that shape
        // before attempting a decimal parse.
        if is_bare_integer_literal(&text) {
            return BigInt::from_str(&text)
                .map(Value::Integer)
                .map_err(|_| DecoderError::InvalidDecimal {
                    literal: text,
                    position,
                });
        }
        Decimal::from_str(&text)
            .map(Value::HighPrecision)
            .map_err(|_| DecoderError::InvalidDecimal {
                literal: text,
                position,
            })
    }

    fn read_object_key(&mut self) -> Result<String, DecoderError> {
        let key = self.decode_text()?;
        if self.options.intern_object_keys {
            if let Some(existing) = self.key_cache.get(&key) {
                return Ok(existing.clone());
            }
            self.key_cache.insert(key.clone(), key.clone());
        }
        Ok(key)
    }

    fn decode_array(&mut self) -> Result<Value, DecoderError> {
        self.enter()?;
        let result = self.decode_array_body();
        self.exit();
        result
    }

    fn decode_array_body(&mut self) -> Result<Value, DecoderError> {
        tracing::trace!("entering array");
        let value = match self.reader.peek()? {
            Some(b'$') => {
                self.reader.next()?;
                let element = self.read_fixed_element_type()?;
                let count = self.read_count_after_type()?;
                if !self.options.no_bytes && matches!(element, Marker::Int8 | Marker::Uint8) {
                    Value::Bytes(self.reader.read_bytes(count)?)
                } else {
                    Value::array(self.decode_typed_elements(element, count)?)
                }
            }
            Some(b'#') => {
                self.reader.next()?;
                let count = self.read_length()?;
                let mut items = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    items.push(self.decode_value()?);
                }
                Value::array(items)
            }
            _ => {
                let mut items = Vec::new();
                loop {
                    if self.reader.require_peek()? == Marker::ArrayEnd.as_u8() {
                        self.reader.next()?;
                        break;
                    }
                    items.push(self.decode_value()?);
                }
                Value::array(items)
            }
        };
        tracing::trace!("exiting array");
        Ok(value)
    }

    fn decode_object(&mut self) -> Result<Value, DecoderError> {
        self.enter()?;
        let result = self.decode_object_body();
        self.exit();
        result
    }

    fn decode_object_body(&mut self) -> Result<Value, DecoderError> {
        tracing::trace!("entering object");
        let pairs: Vec<(String, Value)> = match self.reader.peek()? {
            Some(b'$') => {
                self.reader.next()?;
                let element = self.read_fixed_element_type()?;
                let count = self.read_count_after_type()?;
                let mut pairs = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    let key = self.read_object_key()?;
                    let position = self.reader.position();
                    let value = self.decode_value_by_marker(element, position)?;
                    pairs.push((key, value));
                }
                pairs
            }
            Some(b'#') => {
                self.reader.next()?;
                let count = self.read_length()?;
                let mut pairs = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    let key = self.read_object_key()?;
                    let value = self.decode_value()?;
                    pairs.push((key, value));
                }
                pairs
            }
            _ => {
                let mut pairs = Vec::new();
                loop {
                    if self.reader.require_peek()? == Marker::ObjectEnd.as_u8() {
                        self.reader.next()?;
                        break;
                    }
                    let key = self.read_object_key()?;
                    let value = self.decode_value()?;
                    pairs.push((key, value));
                }
                pairs
            }
        };
        tracing::trace!(len = pairs.len(), "exiting object");
        if let Some(hook) = self.options.object_pairs_hook.clone() {
            return Ok(hook(pairs));
        }
        let mut map = IndexMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            map.insert(key, value);
        }
        Ok(Value::object(map))
    }

    fn read_fixed_element_type(&mut self) -> Result<Marker, DecoderError> {
        let position = self.reader.position();
        let byte = self.reader.require_next()?;
        marker_at(byte, position)
    }

    fn read_count_after_type(&mut self) -> Result<usize, DecoderError> {
        let position = self.reader.position();
        let byte = self.reader.require_next()?;
        if byte != Marker::Count.as_u8() {
            return Err(DecoderError::MissingCountMarker(position));
        }
        self.read_length()
    }

    fn decode_typed_elements(
        &mut self,
        element: Marker,
        count: usize,
    ) -> Result<Vec<Value>, DecoderError> {
        let mut items = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let position = self.reader.position();
            items.push(self.decode_value_by_marker(element, position)?);
        }
        Ok(items)
    }
}

/// Whether `text` is a bare, optionally-negative base-10 integer literal
/// with no fractional or exponent part (the shape `encode_integer` produces
/// for a `BigInt` outside the `i64` range).
fn is_bare_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decodes a single top-level value from `bytes`. Trailing bytes beyond the
/// decoded value are ignored (§4.3 "Trailing input").
pub fn decode_from_slice(bytes: &[u8], options: &DecodeOptions) -> Result<Value, DecoderError> {
    if bytes.is_empty() {
        return Err(DecoderError::EmptyInput);
    }
    tracing::debug!(len = bytes.len(), "decode start");
    let mut decoder = Decoder::new(SliceReader::new(bytes), options.clone());
    let value = decoder.decode_value()?;
    tracing::debug!(kind = value.kind(), "decode complete");
    Ok(value)
}

/// Decodes a single top-level value from `reader`, reading only as many
/// bytes as the grammar demands.
pub fn decode_from_reader(
    reader: &mut impl io::Read,
    options: &DecodeOptions,
) -> Result<Value, DecoderError> {
    let mut decoder = Decoder::new(IoReader::new(reader), options.clone());
    if decoder.reader.peek()?.is_none() {
        return Err(DecoderError::EmptyInput);
    }
    tracing::debug!("decode start");
    let value = decoder.decode_value()?;
    tracing::debug!(kind = value.kind(), "decode complete");
    Ok(value)
}
