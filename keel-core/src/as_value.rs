use crate::{Error, Result, Value};
use atoi::FromRadix10SignedChecked;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::any;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and [`Value`].
///
/// `as_value` never fails. `try_from_value` accepts the canonical variant for
/// the type and the representations a driver is likely to hand back for it:
/// integers of any width (range checked), and the textual form the MySQL text
/// protocol uses for every column.
///
/// ```rust
/// use keel_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Int(42));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {} value {:?} into {}",
        value.kind_name(),
        value,
        any::type_name::<T>()
    ))
}

/// Parses an integer from the whole of `bytes`.
pub(crate) fn parse_integer(bytes: &[u8]) -> Option<i128> {
    let (value, used) = i128::from_radix_10_signed_checked(bytes);
    if used == bytes.len() { value } else { None }
}

/// Parses a float from the whole of `bytes`.
pub(crate) fn parse_float(bytes: &[u8]) -> Option<f64> {
    fast_float::parse::<f64, _>(bytes).ok()
}

fn integer_of(value: &Value) -> Option<i128> {
    match value {
        Value::Int(v) => Some(*v as i128),
        Value::UInt(v) => Some(*v as i128),
        Value::Boolean(v) => Some(*v as i128),
        Value::Decimal(v) if v.fract().is_zero() => v.to_i128(),
        Value::Text(v) => parse_integer(v.as_bytes()),
        Value::Bytes(v) => parse_integer(v),
        _ => None,
    }
}

macro_rules! impl_as_value_integer {
    ($variant:ident, $($source:ty),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_value(self) -> Value {
                    Value::$variant(self as _)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let Some(v) = integer_of(&value) else {
                        return Err(mismatch::<Self>(&value));
                    };
                    <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {} is out of range for {}",
                            v,
                            any::type_name::<Self>()
                        ))
                    })
                }
            }
        )+
    };
}
impl_as_value_integer!(Int, i8, i16, i32, i64, isize);
impl_as_value_integer!(UInt, u8, u16, u32, u64, usize);

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            ref v => match integer_of(v) {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(mismatch::<Self>(v)),
            },
        }
    }
}

macro_rules! impl_as_value_float {
    ($($source:ty),+) => {
        $(
            impl AsValue for $source {
                fn as_value(self) -> Value {
                    Value::Float(self as f64)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let result = match &value {
                        Value::Float(v) => Some(*v),
                        Value::Int(v) => Some(*v as f64),
                        Value::UInt(v) => Some(*v as f64),
                        Value::Decimal(v) => v.to_f64(),
                        Value::Text(v) => parse_float(v.as_bytes()),
                        Value::Bytes(v) => parse_float(v),
                        _ => None,
                    };
                    result
                        .map(|v| v as $source)
                        .ok_or_else(|| mismatch::<Self>(&value))
                }
            }
        )+
    };
}
impl_as_value_float!(f32, f64);

impl AsValue for Decimal {
    fn as_value(self) -> Value {
        Value::Decimal(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        let result = match &value {
            Value::Decimal(v) => Some(*v),
            Value::Int(v) => Some(Decimal::from(*v)),
            Value::UInt(v) => Some(Decimal::from(*v)),
            Value::Float(v) => Decimal::from_f64(*v),
            Value::Text(..) | Value::Bytes(..) => value.as_str().and_then(|v| v.parse().ok()),
            _ => None,
        };
        result.ok_or_else(|| mismatch::<Self>(&value))
    }
}

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::Text(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(v) => Ok(v),
            Value::Bytes(v) => String::from_utf8(v).map_err(|e| {
                Error::new(e).context("Cannot convert bytes that are not valid UTF-8 into String")
            }),
            Value::Uuid(v) => Ok(v.to_string()),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_value(self) -> Value {
        Value::Bytes(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::Text(v) => Ok(v.into_bytes()),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for Uuid {
    fn as_value(self) -> Value {
        Value::Uuid(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Uuid(v) => Ok(*v),
            Value::Bytes(v) if v.len() == 16 => Ok(Uuid::from_slice(v)?),
            Value::Text(..) | Value::Bytes(..) => value
                .as_str()
                .and_then(|v| Uuid::parse_str(v).ok())
                .ok_or_else(|| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Date {
    fn as_value(self) -> Value {
        Value::Date(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(v) => Ok(v),
            Value::DateTime(v) => Ok(v.date()),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for Time {
    fn as_value(self) -> Value {
        Value::Time(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(v) => Ok(v),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_value(self) -> Value {
        Value::DateTime(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(v) => Ok(v),
            Value::Date(v) => Ok(v.midnight()),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for OffsetDateTime {
    fn as_value(self) -> Value {
        Value::Timestamp(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(v) => Ok(v),
            Value::DateTime(v) => Ok(v.assume_utc()),
            Value::Int(v) => Ok(OffsetDateTime::from_unix_timestamp(v)?),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => Ok(Some(T::try_from_value(v)?)),
        }
    }
}
