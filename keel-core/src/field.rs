use crate::{
    AsValue, KeelError, MySqlWriter, Result, SqlWriter, Value,
    as_value::{parse_float, parse_integer},
};
use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use std::{
    borrow::Cow,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::{BorrowedFormatItem, parse_borrowed},
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerSize {
    Tiny,
    Small,
    Medium,
    Int,
    Big,
}

impl IntegerSize {
    /// Display width MySQL reports for the type when none is given.
    pub fn default_length(&self, unsigned: bool) -> u32 {
        match (self, unsigned) {
            (IntegerSize::Tiny, false) => 4,
            (IntegerSize::Tiny, true) => 3,
            (IntegerSize::Small, false) => 6,
            (IntegerSize::Small, true) => 5,
            (IntegerSize::Medium, false) => 9,
            (IntegerSize::Medium, true) => 8,
            (IntegerSize::Int, false) => 11,
            (IntegerSize::Int, true) => 10,
            (IntegerSize::Big, _) => 20,
        }
    }
}

/// Column type together with its type specific options.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Integer {
        size: IntegerSize,
        length: Option<u32>,
    },
    Boolean,
    Float {
        double: bool,
        precision: Option<(u8, u8)>,
    },
    Decimal {
        precision: u8,
        scale: u8,
        rounding: Option<RoundingStrategy>,
    },
    Char {
        length: u32,
    },
    Varchar {
        length: u32,
    },
    Text,
    Date {
        formats: Vec<Cow<'static, str>>,
    },
    Time {
        formats: Vec<Cow<'static, str>>,
    },
    DateTime {
        formats: Vec<Cow<'static, str>>,
    },
    /// Stored as epoch seconds in an unsigned integer column.
    Timestamp {
        utc: bool,
    },
    /// Stored as the 32 digit hexadecimal form in a `varchar(40)` column.
    Uuid,
}

impl FieldKind {
    pub fn is_integer(&self) -> bool {
        matches!(self, FieldKind::Integer { .. })
    }
}

pub const DATE_FORMATS: &[&str] = &["[year]-[month]-[day]", "[year]/[month]/[day]"];
pub const TIME_FORMATS: &[&str] = &[
    "[hour]:[minute]:[second].[subsecond]",
    "[hour]:[minute]:[second]",
    "[hour]:[minute]",
];
pub const DATETIME_FORMATS: &[&str] = &[
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
    "[year]-[month]-[day] [hour]:[minute]:[second]",
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
    "[year]-[month]-[day]T[hour]:[minute]:[second]",
];

fn formats(defaults: &[&'static str]) -> Vec<Cow<'static, str>> {
    defaults.iter().map(|v| Cow::Borrowed(*v)).collect()
}

/// How a column obtains its value when an insert does not provide one.
#[derive(Clone, Default)]
pub enum FieldDefault {
    #[default]
    None,
    Value(Value),
    /// SQL expression evaluated by the server, e.g. `CURRENT_TIMESTAMP`.
    Raw(Cow<'static, str>),
    /// Called once per inserted row.
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Debug for FieldDefault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::None => f.write_str("None"),
            FieldDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldDefault::Raw(v) => f.debug_tuple("Raw").field(v).finish(),
            FieldDefault::Generator(..) => f.write_str("Generator(..)"),
        }
    }
}

/// Declaration of a single column.
///
/// Constructors pick the type, the chained setters add the options:
///
/// ```rust
/// use keel_core::Field;
/// let name = Field::varchar(45).nullable().comment("display name");
/// let id = Field::auto();
/// ```
///
/// The column name is usually left empty and filled with the attribute name
/// when the table is compiled.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) nullable: bool,
    pub(crate) default: FieldDefault,
    pub(crate) comment: String,
    pub(crate) primary_key: bool,
    pub(crate) auto_increment: bool,
    pub(crate) unsigned: bool,
    pub(crate) zerofill: bool,
    pub(crate) charset: Option<String>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            name: String::new(),
            kind,
            nullable: false,
            default: FieldDefault::None,
            comment: String::new(),
            primary_key: false,
            auto_increment: false,
            unsigned: false,
            zerofill: false,
            charset: None,
        }
    }

    fn integer(size: IntegerSize) -> Self {
        Self::new(FieldKind::Integer { size, length: None })
    }
    pub fn tinyint() -> Self {
        Self::integer(IntegerSize::Tiny)
    }
    pub fn smallint() -> Self {
        Self::integer(IntegerSize::Small)
    }
    pub fn mediumint() -> Self {
        Self::integer(IntegerSize::Medium)
    }
    pub fn int() -> Self {
        Self::integer(IntegerSize::Int)
    }
    pub fn bigint() -> Self {
        Self::integer(IntegerSize::Big)
    }
    /// `int NOT NULL AUTO_INCREMENT` primary key.
    pub fn auto() -> Self {
        Self::int().primary_key().auto_increment()
    }
    /// `bigint NOT NULL AUTO_INCREMENT` primary key.
    pub fn big_auto() -> Self {
        Self::bigint().primary_key().auto_increment()
    }
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }
    pub fn float() -> Self {
        Self::new(FieldKind::Float {
            double: false,
            precision: None,
        })
    }
    pub fn double() -> Self {
        Self::new(FieldKind::Float {
            double: true,
            precision: None,
        })
    }
    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self::new(FieldKind::Decimal {
            precision,
            scale,
            rounding: None,
        })
    }
    pub fn char(length: u32) -> Self {
        Self::new(FieldKind::Char { length })
    }
    pub fn varchar(length: u32) -> Self {
        Self::new(FieldKind::Varchar { length })
    }
    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }
    pub fn date() -> Self {
        Self::new(FieldKind::Date {
            formats: formats(DATE_FORMATS),
        })
    }
    pub fn time() -> Self {
        Self::new(FieldKind::Time {
            formats: formats(TIME_FORMATS),
        })
    }
    pub fn datetime() -> Self {
        Self::new(FieldKind::DateTime {
            formats: formats(DATETIME_FORMATS),
        })
    }
    /// Epoch seconds, read back as UTC.
    pub fn timestamp() -> Self {
        Self::new(FieldKind::Timestamp { utc: true }).unsigned()
    }
    pub fn uuid() -> Self {
        Self::new(FieldKind::Uuid)
    }

    /// Explicit column name, when it differs from the attribute name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }
    pub fn default_raw(mut self, sql: impl Into<Cow<'static, str>>) -> Self {
        self.default = FieldDefault::Raw(sql.into());
        self
    }
    pub fn default_with(mut self, generator: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = FieldDefault::Generator(Arc::new(generator));
        self
    }
    /// Defaults to the current instant, as seen by this field.
    pub fn default_now(self) -> Self {
        let utc = match self.kind {
            FieldKind::Timestamp { utc } => utc,
            _ => true,
        };
        let kind = self.kind.clone();
        self.default_with(move || {
            let now = now(utc);
            match kind {
                FieldKind::Date { .. } => Value::Date(now.date()),
                FieldKind::Time { .. } => Value::Time(now.time()),
                FieldKind::DateTime { .. } => {
                    Value::DateTime(PrimitiveDateTime::new(now.date(), now.time()))
                }
                _ => Value::Timestamp(now),
            }
        })
    }
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.nullable = false;
        self
    }
    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }
    pub fn zerofill(mut self) -> Self {
        self.zerofill = true;
        self
    }
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }
    /// Display width of integer columns.
    pub fn length(mut self, length: u32) -> Self {
        if let FieldKind::Integer { length: l, .. } = &mut self.kind {
            *l = Some(length);
        }
        self
    }
    /// `(M, D)` of float columns.
    pub fn precision(mut self, digits: u8, decimals: u8) -> Self {
        if let FieldKind::Float { precision, .. } = &mut self.kind {
            *precision = Some((digits, decimals));
        }
        self
    }
    /// Round decimals to the column scale before they are written.
    pub fn rounding(mut self, strategy: RoundingStrategy) -> Self {
        if let FieldKind::Decimal { rounding, .. } = &mut self.kind {
            *rounding = Some(strategy);
        }
        self
    }
    /// Accepted input formats of temporal columns, in `time` format description syntax.
    pub fn formats<I, S>(mut self, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        let accepted = accepted.into_iter().map(Into::into).collect();
        match &mut self.kind {
            FieldKind::Date { formats }
            | FieldKind::Time { formats }
            | FieldKind::DateTime { formats } => *formats = accepted,
            _ => {}
        }
        self
    }
    /// Interpret timestamps as UTC (`true`) or as local time, both when values
    /// are converted and in the column default.
    pub fn utc(mut self, value: bool) -> Self {
        if let FieldKind::Timestamp { utc } = &mut self.kind {
            *utc = value;
        }
        self
    }

    /// Server side default of a `NOT NULL` column declaring none, the current
    /// epoch for timestamps.
    pub(crate) fn implicit_default(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::Timestamp { utc: true } if !self.nullable => {
                Some("(UNIX_TIMESTAMP(UTC_TIMESTAMP()))")
            }
            FieldKind::Timestamp { utc: false } if !self.nullable => Some("(UNIX_TIMESTAMP())"),
            _ => None,
        }
    }

    pub fn column_name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }
    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }
    pub fn is_zerofill(&self) -> bool {
        self.zerofill
    }
    pub fn get_comment(&self) -> &str {
        &self.comment
    }
    pub fn get_charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }
    pub fn get_default(&self) -> &FieldDefault {
        &self.default
    }

    /// Value an insert uses when the row does not provide one. `None` when the
    /// column must be left out of the statement (server side defaults).
    pub fn resolve_default(&self) -> Option<Value> {
        match &self.default {
            FieldDefault::None => Some(Value::Null),
            FieldDefault::Value(v) => Some(v.clone()),
            FieldDefault::Raw(..) => None,
            FieldDefault::Generator(f) => Some(f()),
        }
    }

    /// Column definition as it appears inside `CREATE TABLE`.
    pub fn render_ddl(&self) -> Result<String> {
        let mut out = String::new();
        MySqlWriter.write_column_def(&mut out, self)?;
        Ok(out)
    }

    /// SQL literal of a value of this field, as used in a `DEFAULT` clause.
    pub fn to_display_string(&self, value: &Value) -> String {
        let mut out = String::new();
        match self.to_wire(value.clone()) {
            Ok(v) => MySqlWriter.write_value(&mut out, &v),
            Err(..) => MySqlWriter.write_value(&mut out, value),
        }
        out
    }

    fn invalid(&self, value: &Value, expected: &str) -> crate::Error {
        KeelError::data(
            &self.name,
            format!("expected {expected}, found {} {:?}", value.kind_name(), value),
        )
        .into()
    }

    /// Application value to the value bound to the placeholder.
    pub fn to_wire(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null => return Ok(Value::Null),
            Value::List(values) => {
                return Ok(Value::List(
                    values
                        .into_iter()
                        .map(|v| self.to_wire(v))
                        .collect::<Result<_>>()?,
                ));
            }
            _ => {}
        }
        Ok(match &self.kind {
            FieldKind::Integer { .. } => match value {
                Value::Int(..) | Value::UInt(..) => value,
                Value::Boolean(v) => Value::Int(v as i64),
                ref v => match i64::try_from_value(v.clone()) {
                    Ok(v) => Value::Int(v),
                    Err(..) => u64::try_from_value(v.clone())
                        .map(Value::UInt)
                        .map_err(|_| self.invalid(v, "an integer"))?,
                },
            },
            FieldKind::Boolean => match value {
                Value::Boolean(..) => value,
                ref v => Value::Boolean(
                    bool::try_from_value(v.clone()).map_err(|_| self.invalid(v, "a boolean"))?,
                ),
            },
            FieldKind::Float { .. } => match value {
                Value::Float(..) => value,
                ref v => Value::Float(
                    f64::try_from_value(v.clone()).map_err(|_| self.invalid(v, "a number"))?,
                ),
            },
            FieldKind::Decimal {
                scale, rounding, ..
            } => {
                let decimal = Decimal::try_from_value(value.clone())
                    .map_err(|_| self.invalid(&value, "a decimal"))?;
                Value::Decimal(match rounding {
                    Some(strategy) => decimal.round_dp_with_strategy(*scale as u32, *strategy),
                    None => decimal,
                })
            }
            FieldKind::Char { .. } | FieldKind::Varchar { .. } | FieldKind::Text => match value {
                Value::Text(..) => value,
                Value::Uuid(v) => Value::Text(v.to_string()),
                ref v => return Err(self.invalid(v, "a string")),
            },
            FieldKind::Date { formats } => match value {
                Value::Date(..) => value,
                Value::DateTime(v) => Value::Date(v.date()),
                Value::Text(ref v) => {
                    Value::Date(self.parse_temporal(v, formats, |s, f| Date::parse(s, f))?)
                }
                ref v => return Err(self.invalid(v, "a date")),
            },
            FieldKind::Time { formats } => match value {
                Value::Time(..) => value,
                Value::Text(ref v) => {
                    Value::Time(self.parse_temporal(v, formats, |s, f| Time::parse(s, f))?)
                }
                ref v => return Err(self.invalid(v, "a time")),
            },
            FieldKind::DateTime { formats } => match value {
                Value::DateTime(..) => value,
                Value::Date(v) => Value::DateTime(v.midnight()),
                Value::Timestamp(v) => {
                    let v = v.to_offset(UtcOffset::UTC);
                    Value::DateTime(PrimitiveDateTime::new(v.date(), v.time()))
                }
                Value::Text(ref v) => Value::DateTime(self.parse_temporal(
                    v,
                    formats,
                    |s, f| PrimitiveDateTime::parse(s, f),
                )?),
                ref v => return Err(self.invalid(v, "a datetime")),
            },
            FieldKind::Timestamp { utc } => match value {
                Value::Timestamp(v) => Value::Int(v.unix_timestamp()),
                Value::DateTime(v) => Value::Int(v.assume_offset(offset(*utc)).unix_timestamp()),
                Value::Int(..) | Value::UInt(..) => value,
                ref v => return Err(self.invalid(v, "a timestamp")),
            },
            FieldKind::Uuid => {
                let uuid = Uuid::try_from_value(value.clone())
                    .map_err(|_| self.invalid(&value, "a uuid"))?;
                Value::Text(uuid.simple().to_string())
            }
        })
    }

    /// Value read from the database to the application value.
    pub fn to_app(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        Ok(match &self.kind {
            FieldKind::Integer { .. } => match value {
                Value::Int(..) | Value::UInt(..) => value,
                ref v => match v.as_str().map(str::as_bytes).and_then(parse_integer) {
                    Some(v) => match i64::try_from(v) {
                        Ok(v) => Value::Int(v),
                        Err(..) => Value::UInt(
                            u64::try_from(v).map_err(|_| self.invalid(&value, "an integer"))?,
                        ),
                    },
                    None => Value::Int(
                        i64::try_from_value(v.clone()).map_err(|_| self.invalid(v, "an integer"))?,
                    ),
                },
            },
            FieldKind::Boolean => Value::Boolean(
                bool::try_from_value(value.clone()).map_err(|_| self.invalid(&value, "a boolean"))?,
            ),
            FieldKind::Float { .. } => match value {
                Value::Float(..) => value,
                ref v => Value::Float(match v.as_str() {
                    Some(s) => {
                        parse_float(s.as_bytes()).ok_or_else(|| self.invalid(v, "a number"))?
                    }
                    None => {
                        f64::try_from_value(v.clone()).map_err(|_| self.invalid(v, "a number"))?
                    }
                }),
            },
            FieldKind::Decimal { .. } => match value {
                Value::Float(v) => Value::Decimal(
                    Decimal::from_f64(v).ok_or_else(|| self.invalid(&value, "a decimal"))?,
                ),
                ref v => Value::Decimal(
                    Decimal::try_from_value(v.clone()).map_err(|_| self.invalid(v, "a decimal"))?,
                ),
            },
            FieldKind::Char { .. } | FieldKind::Varchar { .. } | FieldKind::Text => Value::Text(
                String::try_from_value(value.clone())
                    .map_err(|_| self.invalid(&value, "a string"))?,
            ),
            FieldKind::Date { formats } => match value {
                Value::Date(..) => value,
                Value::DateTime(v) => Value::Date(v.date()),
                ref v => match v.as_str() {
                    Some(s) => {
                        Value::Date(self.parse_temporal(s, formats, |s, f| Date::parse(s, f))?)
                    }
                    None => return Err(self.invalid(v, "a date")),
                },
            },
            FieldKind::Time { formats } => match value {
                Value::Time(..) => value,
                ref v => match v.as_str() {
                    Some(s) => {
                        Value::Time(self.parse_temporal(s, formats, |s, f| Time::parse(s, f))?)
                    }
                    None => return Err(self.invalid(v, "a time")),
                },
            },
            FieldKind::DateTime { formats } => match value {
                Value::DateTime(..) => value,
                Value::Date(v) => Value::DateTime(v.midnight()),
                ref v => match v.as_str() {
                    Some(s) => Value::DateTime(self.parse_temporal(
                        s,
                        formats,
                        |s, f| PrimitiveDateTime::parse(s, f),
                    )?),
                    None => return Err(self.invalid(v, "a datetime")),
                },
            },
            FieldKind::Timestamp { utc } => {
                let instant = match value {
                    Value::Timestamp(v) => v,
                    Value::DateTime(v) => v.assume_utc(),
                    ref v => {
                        let seconds = i64::try_from_value(v.clone())
                            .map_err(|_| self.invalid(v, "epoch seconds"))?;
                        OffsetDateTime::from_unix_timestamp(seconds)
                            .map_err(|e| KeelError::data(&self.name, e.to_string()))?
                    }
                };
                Value::Timestamp(instant.to_offset(offset(*utc)))
            }
            FieldKind::Uuid => Value::Uuid(
                Uuid::try_from_value(value.clone()).map_err(|_| self.invalid(&value, "a uuid"))?,
            ),
        })
    }

    fn parse_temporal<T>(
        &self,
        input: &str,
        formats: &[Cow<'static, str>],
        parse: impl Fn(
            &str,
            &[BorrowedFormatItem<'_>],
        ) -> std::result::Result<T, time::error::Parse>,
    ) -> Result<T> {
        for format in formats {
            let items = parse_borrowed::<2>(format).map_err(|e| {
                KeelError::data(&self.name, format!("invalid format `{format}`: {e}"))
            })?;
            if let Ok(value) = parse(input, items.as_slice()) {
                return Ok(value);
            }
        }
        Err(KeelError::data(
            &self.name,
            format!("`{input}` does not match any of the accepted formats"),
        )
        .into())
    }
}

fn offset(utc: bool) -> UtcOffset {
    if utc {
        UtcOffset::UTC
    } else {
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
    }
}

fn now(utc: bool) -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(offset(utc))
}
