use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value moving between application code, the statement
/// builders and the wire.
///
/// Fields translate between the application representation (what records
/// hold) and the wire representation (what is bound to placeholders). Both
/// sides use this same type.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(Date),
    Time(Time),
    DateTime(PrimitiveDateTime),
    Timestamp(OffsetDateTime),
    Uuid(Uuid),
    /// Sequence operand, used by `IN` and by batch helpers.
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(..))
    }

    /// Name of the variant, used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(..) => "boolean",
            Value::Int(..) => "int",
            Value::UInt(..) => "unsigned int",
            Value::Float(..) => "float",
            Value::Decimal(..) => "decimal",
            Value::Text(..) => "text",
            Value::Bytes(..) => "bytes",
            Value::Date(..) => "date",
            Value::Time(..) => "time",
            Value::DateTime(..) => "datetime",
            Value::Timestamp(..) => "timestamp",
            Value::Uuid(..) => "uuid",
            Value::List(..) => "list",
        }
    }

    /// Textual content of `Text` values, or of `Bytes` holding valid UTF-8
    /// (the text protocol delivers every column as bytes).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            Value::Bytes(v) => std::str::from_utf8(v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Boolean(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::UInt(v) => Some(*v),
            Value::Boolean(v) => Some(*v as u64),
            _ => None,
        }
    }
}
