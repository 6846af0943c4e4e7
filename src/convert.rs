//! Bridging ordinary Rust scalars into [`Value`] without a generic
//! `serde::Serialize`/`Deserialize` layer (§4.5).

use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::value::Value;

/// Raised when a Rust value has no faithful [`Value`] representation, or
/// when a [`Value`] cannot be narrowed back to the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A float conversion was asked to reject non-finite values and got one.
    NotFinite,
    /// A numeric value did not fit in the requested Rust integer type.
    OutOfRange,
    /// The `Value` was not of the kind the conversion expects.
    WrongKind {
        /// The kind actually found, e.g. `"string"`.
        found: &'static str,
        /// The kind the caller asked for, e.g. `"integer"`.
        expected: &'static str,
    },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::NotFinite => write!(f, "value is not finite"),
            ValueError::OutOfRange => write!(f, "value is out of range for the target type"),
            ValueError::WrongKind { found, expected } => {
                write!(f, "expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for ValueError {}

macro_rules! impl_int_conversions {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Integer(BigInt::from(v))
                }
            }

            impl TryFrom<&Value> for $ty {
                type Error = ValueError;

                fn try_from(value: &Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::Integer(n) => n.to_i64()
                            .and_then(|n| <$ty>::try_from(n).ok())
                            .or_else(|| n.to_u64().and_then(|n| <$ty>::try_from(n).ok()))
                            .ok_or(ValueError::OutOfRange),
                        other => Err(ValueError::WrongKind {
                            found: other.kind(),
                            expected: "integer",
                        }),
                    }
                }
            }
        )+
    };
}

impl_int_conversions!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl TryFrom<&Value> for f64 {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(f) => Ok(*f),
            other => Err(ValueError::WrongKind {
                found: other.kind(),
                expected: "float",
            }),
        }
    }
}

impl TryFrom<&Value> for f32 {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let f = f64::try_from(value)?;
        if f.is_nan() {
            return Ok(f32::NAN);
        }
        Ok(f as f32)
    }
}

impl TryFrom<&Value> for bool {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(ValueError::WrongKind {
                found: other.kind(),
                expected: "bool",
            }),
        }
    }
}

impl TryFrom<&Value> for String {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(ValueError::WrongKind {
                found: other.kind(),
                expected: "string",
            }),
        }
    }
}

impl TryFrom<&Value> for Vec<u8> {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(ValueError::WrongKind {
                found: other.kind(),
                expected: "bytes",
            }),
        }
    }
}

/// Builds a finite [`Value::Float`], rejecting NaN/infinity.
///
/// Use this instead of `Value::from(f)` when the caller wants the
/// "unencodable value kind" failure of §4.2 to surface as a [`ValueError`]
/// up front rather than as an `EncoderError` deep inside the encoder.
pub fn finite_float(f: f64) -> Result<Value, ValueError> {
    if !f.is_finite() {
        return Err(ValueError::NotFinite);
    }
    Ok(Value::Float(f))
}
