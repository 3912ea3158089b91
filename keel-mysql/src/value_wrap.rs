use keel_core::Value;
use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

/// Bridge between [`keel_core::Value`] and [`mysql_async::Value`].
pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
impl From<ValueWrap> for Value {
    fn from(value: ValueWrap) -> Self {
        value.0
    }
}

impl mysql_async::prelude::FromValue for ValueWrap {
    type Intermediate = ValueWrap;
}

impl TryFrom<mysql_async::Value> for ValueWrap {
    type Error = mysql_async::FromValueError;
    fn try_from(value: mysql_async::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            mysql_async::Value::NULL => Value::Null,
            // The text protocol delivers everything as bytes, fields parse them
            mysql_async::Value::Bytes(v) => Value::Bytes(v),
            mysql_async::Value::Int(v) => Value::Int(v),
            mysql_async::Value::UInt(v) => Value::UInt(v),
            mysql_async::Value::Float(v) => Value::Float(v as f64),
            mysql_async::Value::Double(v) => Value::Float(v),
            mysql_async::Value::Date(year, month, day, hour, minute, second, micro) => {
                let Ok(month) = Month::try_from(month) else {
                    return Err(mysql_async::FromValueError(value));
                };
                let (Ok(date), Ok(time)) = (
                    Date::from_calendar_date(year as _, month, day),
                    Time::from_hms_micro(hour, minute, second, micro),
                ) else {
                    return Err(mysql_async::FromValueError(value));
                };
                Value::DateTime(PrimitiveDateTime::new(date, time))
            }
            mysql_async::Value::Time(false, 0, hours, minutes, seconds, micro) => {
                match Time::from_hms_micro(hours, minutes, seconds, micro) {
                    Ok(v) => Value::Time(v),
                    Err(..) => return Err(mysql_async::FromValueError(value)),
                }
            }
            // Durations outside of a day keep their textual form
            mysql_async::Value::Time(negative, days, hours, minutes, seconds, micro) => {
                let hours = days as u64 * 24 + hours as u64;
                Value::Text(format!(
                    "{}{:02}:{:02}:{:02}.{:06}",
                    if negative { "-" } else { "" },
                    hours,
                    minutes,
                    seconds,
                    micro
                ))
            }
        }
        .into())
    }
}

impl TryFrom<ValueWrap> for mysql_async::Value {
    type Error = keel_core::Error;

    fn try_from(value: ValueWrap) -> Result<Self, Self::Error> {
        type MySQLValue = mysql_async::Value;
        fn datetime(v: PrimitiveDateTime) -> keel_core::Result<MySQLValue> {
            let year = u16::try_from(v.year()).map_err(|_| {
                keel_core::Error::msg(format!("Date {} is out of range for MySQL", v))
            })?;
            Ok(MySQLValue::Date(
                year,
                v.month().into(),
                v.day(),
                v.hour(),
                v.minute(),
                v.second(),
                v.microsecond(),
            ))
        }
        Ok(match value.0 {
            Value::Null => MySQLValue::NULL,
            Value::Boolean(v) => MySQLValue::from(v),
            Value::Int(v) => MySQLValue::from(v),
            Value::UInt(v) => MySQLValue::from(v),
            Value::Float(v) => MySQLValue::from(v),
            Value::Decimal(v) => MySQLValue::from(v),
            Value::Text(v) => MySQLValue::from(v),
            Value::Bytes(v) => MySQLValue::from(v),
            Value::Date(v) => datetime(v.midnight())?,
            Value::Time(v) => MySQLValue::from(v),
            Value::DateTime(v) => datetime(v)?,
            Value::Timestamp(v) => {
                let v = v.to_offset(UtcOffset::UTC);
                datetime(PrimitiveDateTime::new(v.date(), v.time()))?
            }
            Value::Uuid(v) => MySQLValue::from(v.simple().to_string()),
            Value::List(..) => {
                return Err(keel_core::Error::msg(
                    "A list value must be expanded into placeholders before it is bound",
                ));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn reads_dates() {
        let value =
            ValueWrap::try_from(mysql_async::Value::Date(2024, 2, 29, 8, 30, 0, 0)).unwrap();
        assert_eq!(value.0, Value::DateTime(datetime!(2024-02-29 08:30:00)));
        assert!(ValueWrap::try_from(mysql_async::Value::Date(2024, 13, 1, 0, 0, 0, 0)).is_err());
    }

    #[test]
    fn reads_times() {
        let value = ValueWrap::try_from(mysql_async::Value::Time(false, 0, 7, 5, 3, 0)).unwrap();
        assert_eq!(value.0, Value::Time(time!(07:05:03)));
        let value = ValueWrap::try_from(mysql_async::Value::Time(true, 1, 2, 0, 0, 0)).unwrap();
        assert_eq!(value.0, Value::Text("-26:00:00.000000".into()));
    }

    #[test]
    fn writes_dates() {
        let value =
            mysql_async::Value::try_from(ValueWrap(Value::Date(date!(1999 - 12 - 31)))).unwrap();
        assert_eq!(value, mysql_async::Value::Date(1999, 12, 31, 0, 0, 0, 0));
    }

    #[test]
    fn lists_are_not_bound() {
        assert!(mysql_async::Value::try_from(ValueWrap(Value::List(vec![]))).is_err());
    }
}
