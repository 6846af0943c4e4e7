//! Optional interop with [`serde_json::Value`], gated behind the `json`
//! feature. Not part of the core codec — UBJSON's type system is richer
//! than JSON's, so only the conversion *into* [`Value`] is infallible.

use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_json::Number;

use crate::value::Value;

/// Raised when a [`Value`] has no faithful representation as a
/// [`serde_json::Value`]: arbitrary-precision integers outside `f64`'s
/// exact range, non-finite floats, high-precision decimals, and raw bytes
/// all fall outside what JSON numbers and strings can carry losslessly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromJsonError {
    /// The integer does not fit in an `f64`/`i64`/`u64` without loss.
    IntegerOutOfRange,
    /// The float was NaN or infinite, which JSON has no literal for.
    NotFinite,
    /// A `Value::HighPrecision` or `Value::Bytes` has no JSON equivalent.
    Unrepresentable(&'static str),
}

impl fmt::Display for FromJsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FromJsonError::IntegerOutOfRange => write!(f, "integer does not fit in a JSON number"),
            FromJsonError::NotFinite => write!(f, "non-finite float has no JSON representation"),
            FromJsonError::Unrepresentable(kind) => {
                write!(f, "{kind} has no JSON representation")
            }
        }
    }
}

impl std::error::Error for FromJsonError {}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => json_number_to_value(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let mut out = indexmap::IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k, Value::from(v));
                }
                Value::object(out)
            }
        }
    }
}

fn json_number_to_value(n: Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Integer(BigInt::from(i))
    } else if let Some(u) = n.as_u64() {
        Value::Integer(BigInt::from(u))
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl TryFrom<Value> for serde_json::Value {
    type Error = FromJsonError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
            Value::Char(c) => Ok(serde_json::Value::String(c.to_string())),
            Value::Integer(n) => n
                .to_i64()
                .map(|n| serde_json::Value::Number(Number::from(n)))
                .ok_or(FromJsonError::IntegerOutOfRange),
            Value::Float(f) => {
                Number::from_f64(f)
                    .map(serde_json::Value::Number)
                    .ok_or(FromJsonError::NotFinite)
            }
            Value::HighPrecision(_) => Err(FromJsonError::Unrepresentable("high-precision decimal")),
            Value::String(s) => Ok(serde_json::Value::String(s)),
            Value::Bytes(_) => Err(FromJsonError::Unrepresentable("byte sequence")),
            Value::Array(arr) => {
                let items = arr.borrow();
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    out.push(serde_json::Value::try_from(item.clone())?);
                }
                Ok(serde_json::Value::Array(out))
            }
            Value::Object(obj) => {
                let map = obj.borrow();
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map.iter() {
                    out.insert(k.clone(), serde_json::Value::try_from(v.clone())?);
                }
                Ok(serde_json::Value::Object(out))
            }
        }
    }
}
