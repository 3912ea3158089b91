use crate::{
    AsValue, Delete, ErrorContext, Executor, ExpressionExt, Insert, KeelError, Result,
    RowsAffected, Table, Update, Value,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Attribute name to application value, in insertion order.
pub type Values = IndexMap<String, Value>;

/// Builds [`Values`] from `attribute => value` pairs.
///
/// ```rust
/// let values = keel_core::values! { "name" => "Ada", "age" => 36 };
/// assert_eq!(values.len(), 2);
/// ```
#[macro_export]
macro_rules! values {
    ($($attribute:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut values = $crate::Values::new();
        $(values.insert(::std::string::String::from($attribute), $crate::Value::from($value));)*
        values
    }};
}

/// Anything that can provide the attribute values of a row.
pub trait IntoValues {
    fn into_values(self) -> Values;
}

impl IntoValues for Values {
    fn into_values(self) -> Values {
        self
    }
}

impl IntoValues for &Values {
    fn into_values(self) -> Values {
        self.clone()
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> IntoValues for [(K, V); N] {
    fn into_values(self) -> Values {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

/// Typed row built from a loaded [`Record`].
pub trait FromRecord: Sized {
    fn from_record(record: Record) -> Result<Self>;
}

/// Mutable row of a table: attribute values checked against the table fields.
#[derive(Debug, Clone)]
pub struct Record {
    table: Arc<Table>,
    values: Values,
}

impl Record {
    pub fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            values: Values::new(),
        }
    }

    /// Record holding `values`, each one checked like [`Record::set`].
    pub fn with_values(table: Arc<Table>, values: impl IntoValues) -> Result<Self> {
        let mut record = Self::new(table);
        for (attribute, value) in values.into_values() {
            record.set(&attribute, value)?;
        }
        Ok(record)
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Typed value of an attribute, a missing attribute reads as `NULL`.
    pub fn get_as<T: AsValue>(&self, attribute: &str) -> Result<T> {
        let value = self.values.get(attribute).cloned().unwrap_or_default();
        T::try_from_value(value).with_context(|| {
            format!(
                "While reading attribute `{}` of `{}`",
                attribute,
                self.table.name()
            )
        })
    }

    /// Assigns an attribute. Unknown attributes are rejected, and so is a new
    /// value for an auto-increment primary key that is already set.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let field = self.table.field(attribute)?;
        let value = value.into();
        if field.is_auto_increment()
            && self.values.get(attribute).is_some_and(|v| !v.is_null())
            && self.values.get(attribute) != Some(&value)
        {
            return Err(KeelError::NotAllowed(format!(
                "Changing the auto-increment primary key `{}` of `{}`",
                attribute,
                self.table.name()
            ))
            .into());
        }
        self.values.insert(attribute.into(), value);
        Ok(self)
    }

    /// Assignment from the row loader, skipping the checks of [`Record::set`].
    pub(crate) fn load(&mut self, attribute: String, value: Value) {
        self.values.insert(attribute, value);
    }

    /// Moves an attribute out of the record, `NULL` when missing.
    pub fn take(&mut self, attribute: &str) -> Value {
        self.values.shift_remove(attribute).unwrap_or_default()
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn into_values(self) -> Values {
        self.values
    }

    /// Primary key value, unless missing or `NULL`.
    pub fn primary_key(&self) -> Option<&Value> {
        self.values
            .get(&self.table.primary_key().attribute)
            .filter(|v| !v.is_null())
    }

    /// Writes the record back.
    ///
    /// On an auto-increment table a record without primary key is inserted and
    /// adopts the generated id, one with a primary key is updated. Other tables
    /// use `REPLACE`.
    pub async fn save(&mut self, executor: &impl Executor) -> Result<RowsAffected> {
        let table = self.table.clone();
        let primary_key = table.primary_key();
        if !primary_key.auto_increment {
            return Insert::replace(table.clone())
                .row(self.values.clone())
                .execute(executor)
                .await;
        }
        match self.primary_key().cloned() {
            None => {
                let result = Insert::new(table.clone())
                    .row(self.values.clone())
                    .execute(executor)
                    .await?;
                if let Some(id) = result.last_insert_id {
                    let id = match i64::try_from(id) {
                        Ok(v) => Value::Int(v),
                        Err(..) => Value::UInt(id),
                    };
                    let id = primary_key.field.to_app(id)?;
                    self.load(primary_key.attribute.clone(), id);
                }
                Ok(result)
            }
            Some(id) => {
                let values: Values = self
                    .values
                    .iter()
                    .filter(|(k, _)| **k != primary_key.attribute)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                if values.is_empty() {
                    return Ok(RowsAffected::default());
                }
                Update::new(table.clone())
                    .set_all(values)?
                    .filter(table.primary_key_column().equal(id))
                    .execute(executor)
                    .await
            }
        }
    }

    /// Deletes the row identified by the primary key.
    pub async fn remove(&self, executor: &impl Executor) -> Result<RowsAffected> {
        let Some(id) = self.primary_key().cloned() else {
            return Err(KeelError::Usage(format!(
                "Cannot remove a `{}` record without primary key",
                self.table.name()
            ))
            .into());
        };
        Delete::new(self.table.clone())
            .filter(self.table.primary_key_column().equal(id))
            .limit(1)
            .execute(executor)
            .await
    }
}

impl IntoValues for Record {
    fn into_values(self) -> Values {
        self.values
    }
}

impl FromRecord for Record {
    fn from_record(record: Record) -> Result<Self> {
        Ok(record)
    }
}
