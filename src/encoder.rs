//! The encoder state machine (§4.2): value classification, width
//! selection, container framing, and cycle detection.

use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use crate::error::{EncoderError, PathSegment};
use crate::marker::Marker;
use crate::value::{SharedArray, SharedObject, Value};
use crate::width;

/// Per-call encoding options.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Emit arrays/objects in counted form (`#` + length) instead of the
    /// delimited form.
    pub container_count: bool,
    /// Emit object entries in code-point-sorted key order.
    pub sort_keys: bool,
    /// Always emit floats as 64-bit, regardless of magnitude.
    pub no_float32: bool,
    /// Emit byte sequences as typed `U` arrays instead of typed `i` arrays.
    pub uint8_bytes: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            container_count: false,
            sort_keys: false,
            no_float32: false,
            uint8_bytes: false,
        }
    }
}

struct Encoder {
    out: Vec<u8>,
    in_progress: HashSet<usize>,
    path: Vec<PathSegment>,
    options: EncodeOptions,
}

impl Encoder {
    fn new(options: EncodeOptions) -> Self {
        Self {
            out: Vec::new(),
            in_progress: HashSet::new(),
            path: Vec::new(),
            options,
        }
    }

    fn write_length(&mut self, len: usize) {
        width::select_length_width(len).write(&mut self.out);
    }

    fn write_text_payload(&mut self, s: &str) {
        self.write_length(s.len());
        self.out.extend_from_slice(s.as_bytes());
    }

    fn encode(&mut self, value: &Value) -> Result<(), EncoderError> {
        match value {
            Value::Null => self.out.push(Marker::Null.as_u8()),
            Value::Bool(true) => self.out.push(Marker::True.as_u8()),
            Value::Bool(false) => self.out.push(Marker::False.as_u8()),
            Value::Char(c) => self.encode_char(*c)?,
            Value::Integer(n) => self.encode_integer(n),
            Value::Float(f) => self.encode_float(*f),
            Value::HighPrecision(d) => {
                let text = d.to_string();
                self.encode_high_precision_text(text);
            }
            Value::String(s) => self.encode_string(s),
            Value::Bytes(b) => self.encode_bytes(b),
            Value::Array(arr) => self.encode_array(arr)?,
            Value::Object(obj) => self.encode_object(obj)?,
        }
        Ok(())
    }

    fn encode_char(&mut self, c: char) -> Result<(), EncoderError> {
        if (c as u32) > 0x7F {
            return Err(EncoderError::Unencodable("char"));
        }
        self.out.push(Marker::Char.as_u8());
        self.out.push(c as u8);
        Ok(())
    }

    /// Width selection per §4.2: first fit of `U`,`i`,`I`,`l`,`L`, else a
    /// decimal-text `H` payload for magnitudes outside the signed 64-bit
    /// range.
    fn encode_integer(&mut self, n: &num_bigint::BigInt) {
        match width::select_width(n) {
            Some(sized) => {
                tracing::trace!(marker = ?sized.marker(), "selected integer width");
                sized.write(&mut self.out);
            }
            None => {
                tracing::trace!("integer exceeds i64 range, falling back to H");
                self.encode_high_precision_text(n.to_string());
            }
        }
    }

    fn encode_float(&mut self, f: f64) {
        if !f.is_finite() {
            let text = if f.is_nan() {
                "nan"
            } else if f.is_sign_positive() {
                "inf"
            } else {
                "-inf"
            };
            self.encode_high_precision_text(text.to_string());
            return;
        }
        let fits_f32 = !self.options.no_float32 && f.abs() <= f32::MAX as f64;
        if fits_f32 {
            self.out.push(Marker::Float32.as_u8());
            self.out.extend_from_slice(&(f as f32).to_be_bytes());
        } else {
            self.out.push(Marker::Float64.as_u8());
            self.out.extend_from_slice(&f.to_be_bytes());
        }
    }

    fn encode_high_precision_text(&mut self, text: String) {
        self.out.push(Marker::HighPrecision.as_u8());
        self.write_text_payload(&text);
    }

    fn encode_string(&mut self, s: &str) {
        self.out.push(Marker::Str.as_u8());
        self.write_text_payload(s);
    }

    /// Bytes always travel as a typed, counted array of `i` (or `U`),
    /// regardless of `container_count` — this is the wire idiom for binary
    /// data, not a general container form.
    fn encode_bytes(&mut self, bytes: &[u8]) {
        let element = if self.options.uint8_bytes {
            Marker::Uint8
        } else {
            Marker::Int8
        };
        self.out.push(Marker::ArrayStart.as_u8());
        self.out.push(Marker::Type.as_u8());
        self.out.push(element.as_u8());
        self.out.push(Marker::Count.as_u8());
        self.write_length(bytes.len());
        self.out.extend_from_slice(bytes);
    }

    fn encode_array(&mut self, arr: &SharedArray) -> Result<(), EncoderError> {
        let ptr = Rc::as_ptr(arr) as usize;
        if !self.in_progress.insert(ptr) {
            return Err(EncoderError::Cycle(self.path.clone()));
        }
        let result = self.encode_array_body(arr);
        self.in_progress.remove(&ptr);
        result
    }

    fn encode_array_body(&mut self, arr: &SharedArray) -> Result<(), EncoderError> {
        let items = arr.borrow();
        tracing::trace!(len = items.len(), "entering array");
        self.out.push(Marker::ArrayStart.as_u8());
        if self.options.container_count {
            self.out.push(Marker::Count.as_u8());
            self.write_length(items.len());
        }
        for (index, item) in items.iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            let result = self.encode(item);
            self.path.pop();
            result?;
        }
        if !self.options.container_count {
            self.out.push(Marker::ArrayEnd.as_u8());
        }
        tracing::trace!("exiting array");
        Ok(())
    }

    fn encode_object(&mut self, obj: &SharedObject) -> Result<(), EncoderError> {
        let ptr = Rc::as_ptr(obj) as usize;
        if !self.in_progress.insert(ptr) {
            return Err(EncoderError::Cycle(self.path.clone()));
        }
        let result = self.encode_object_body(obj);
        self.in_progress.remove(&ptr);
        result
    }

    fn encode_object_body(&mut self, obj: &SharedObject) -> Result<(), EncoderError> {
        let map = obj.borrow();
        tracing::trace!(len = map.len(), "entering object");
        let mut keys: Vec<&String> = map.keys().collect();
        if self.options.sort_keys {
            keys.sort();
        }
        self.out.push(Marker::ObjectStart.as_u8());
        if self.options.container_count {
            self.out.push(Marker::Count.as_u8());
            self.write_length(keys.len());
        }
        for key in keys {
            self.write_text_payload(key);
            self.path.push(PathSegment::Key(key.clone()));
            let result = self.encode(&map[key]);
            self.path.pop();
            result?;
        }
        if !self.options.container_count {
            self.out.push(Marker::ObjectEnd.as_u8());
        }
        tracing::trace!("exiting object");
        Ok(())
    }
}

/// Encodes `value` to a freshly allocated buffer.
pub fn encode_to_vec(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, EncoderError> {
    tracing::debug!(kind = value.kind(), "encode start");
    let mut encoder = Encoder::new(*options);
    encoder.encode(value)?;
    tracing::debug!(bytes = encoder.out.len(), "encode complete");
    Ok(encoder.out)
}

/// Encodes `value`, writing the result to `writer`.
pub fn encode_to_writer(
    value: &Value,
    writer: &mut impl io::Write,
    options: &EncodeOptions,
) -> Result<(), EncoderError> {
    let bytes = encode_to_vec(value, options)?;
    writer.write_all(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use num_bigint::BigInt;

    #[test]
    fn encodes_the_three_literal_scalars() {
        assert_eq!(
            encode_to_vec(&Value::Bool(true), &EncodeOptions::default()).unwrap(),
            vec![0x54]
        );
        assert_eq!(
            encode_to_vec(&Value::Bool(false), &EncodeOptions::default()).unwrap(),
            vec![0x46]
        );
        assert_eq!(
            encode_to_vec(&Value::Null, &EncodeOptions::default()).unwrap(),
            vec![0x5A]
        );
    }

    #[test]
    fn encodes_a_short_string() {
        let bytes = encode_to_vec(
            &Value::String("ab".to_string()),
            &EncodeOptions::default(),
        )
        .unwrap();
        assert_eq!(bytes, vec![0x53, 0x55, 0x02, 0x61, 0x62]);
    }

    #[test]
    fn encodes_a_high_precision_decimal() {
        let decimal: rust_decimal::Decimal = "-1.5".parse().unwrap();
        let bytes = encode_to_vec(
            &Value::HighPrecision(decimal),
            &EncodeOptions::default(),
        )
        .unwrap();
        assert_eq!(
            bytes,
            vec![0x48, 0x55, 0x04, 0x2D, 0x31, 0x2E, 0x35]
        );
    }

    #[test]
    fn width_selection_picks_the_narrowest_marker() {
        let bytes = encode_to_vec(
            &Value::Integer(BigInt::from(200)),
            &EncodeOptions::default(),
        )
        .unwrap();
        assert_eq!(bytes[0], Marker::Uint8.as_u8());

        let bytes = encode_to_vec(
            &Value::Integer(BigInt::from(-200)),
            &EncodeOptions::default(),
        )
        .unwrap();
        assert_eq!(bytes[0], Marker::Int16.as_u8());
    }

    #[test]
    fn self_referential_array_is_rejected() {
        let arr = Value::array(vec![Value::Integer(BigInt::from(1))]);
        if let Value::Array(rc) = &arr {
            rc.borrow_mut().push(arr.clone());
        }
        let err = encode_to_vec(&arr, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, EncoderError::Cycle(_)));
    }

    #[test]
    fn self_referential_object_is_rejected() {
        let mut map = IndexMap::new();
        map.insert("x".to_string(), Value::Null);
        let obj = Value::object(map);
        if let Value::Object(rc) = &obj {
            rc.borrow_mut().insert("self".to_string(), obj.clone());
        }
        let err = encode_to_vec(&obj, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, EncoderError::Cycle(_)));
    }

    #[test]
    fn shared_non_cyclic_reference_is_legal() {
        let leaf = Value::array(vec![Value::Integer(BigInt::from(1))]);
        let parent = Value::array(vec![leaf.clone(), leaf.clone()]);
        assert!(encode_to_vec(&parent, &EncodeOptions::default()).is_ok());
    }

    #[test]
    fn sort_keys_produces_order_independent_output() {
        let mut a = IndexMap::new();
        a.insert("b".to_string(), Value::Integer(BigInt::from(2)));
        a.insert("a".to_string(), Value::Integer(BigInt::from(1)));
        let mut b = IndexMap::new();
        b.insert("a".to_string(), Value::Integer(BigInt::from(1)));
        b.insert("b".to_string(), Value::Integer(BigInt::from(2)));

        let options = EncodeOptions {
            sort_keys: true,
            ..EncodeOptions::default()
        };
        assert_eq!(
            encode_to_vec(&Value::object(a), &options).unwrap(),
            encode_to_vec(&Value::object(b), &options).unwrap()
        );
    }

    #[test]
    fn bytes_are_encoded_as_a_typed_int8_array() {
        let bytes = encode_to_vec(
            &Value::Bytes(vec![1, 2, 3]),
            &EncodeOptions::default(),
        )
        .unwrap();
        assert_eq!(
            bytes,
            vec![
                Marker::ArrayStart.as_u8(),
                Marker::Type.as_u8(),
                Marker::Int8.as_u8(),
                Marker::Count.as_u8(),
                Marker::Uint8.as_u8(),
                3,
                1,
                2,
                3,
            ]
        );
    }
}
