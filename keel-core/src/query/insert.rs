use crate::{
    Executor, Field, IntoValues, KeelError, Params, Query, Result, RowsAffected, Table, Value,
    Values,
    writer::{Context, Fragment, MySqlWriter, SqlWriter},
};
use std::sync::Arc;

/// `INSERT INTO` / `REPLACE INTO` builder, for one row or a batch.
///
/// Rows are normalized against the table before rendering: omitted columns
/// take their default, columns with a server side default are left out, and
/// values go through their field's wire conversion.
#[derive(Debug, Clone)]
pub struct Insert {
    table: Arc<Table>,
    rows: Vec<Values>,
    columns: Option<Vec<String>>,
    replace: bool,
}

impl Insert {
    pub fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            rows: Vec::new(),
            columns: None,
            replace: false,
        }
    }

    /// `REPLACE INTO`.
    pub fn replace(table: Arc<Table>) -> Self {
        Self {
            replace: true,
            ..Self::new(table)
        }
    }

    pub fn is_replace(&self) -> bool {
        self.replace
    }

    pub fn row(mut self, values: impl IntoValues) -> Self {
        self.rows.push(values.into_values());
        self
    }

    pub fn rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoValues,
    {
        self.rows
            .extend(rows.into_iter().map(IntoValues::into_values));
        self
    }

    /// Reads only these attributes from the rows, the others count as omitted.
    pub fn columns<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    fn normalize(&self, values: &Values) -> Result<(Vec<&Field>, Vec<Value>)> {
        let table = &self.table;
        if let Some(attribute) = values.keys().find(|k| !table.has_field(k)) {
            return Err(KeelError::unknown_column(table.name(), attribute).into());
        }
        let selected = |attribute: &str| {
            self.columns
                .as_ref()
                .is_none_or(|c| c.iter().any(|v| v == attribute))
        };
        let primary_key = table.primary_key();
        let has_primary_key = values
            .get(&primary_key.attribute)
            .is_some_and(|v| !v.is_null());
        let mut fields = Vec::new();
        let mut row = Vec::new();
        for (attribute, field) in table.fields() {
            let provided = values.get(attribute).filter(|_| selected(attribute));
            if field.is_auto_increment() {
                match provided {
                    Some(v) if !v.is_null() => {
                        if !self.replace {
                            return Err(KeelError::NotAllowed(format!(
                                "Setting the auto-increment primary key `{}` of `{}` on insert",
                                attribute,
                                table.name()
                            ))
                            .into());
                        }
                    }
                    _ => continue,
                }
            }
            let value = match provided {
                Some(v) => v.clone(),
                None => match field.resolve_default() {
                    Some(v) => v,
                    // Left to the server side default
                    None => continue,
                },
            };
            if value.is_null() && !field.is_nullable() {
                if self.replace && has_primary_key {
                    continue;
                }
                return Err(KeelError::data(
                    field.column_name(),
                    format!("`{}` of `{}` cannot be NULL", attribute, table.name()),
                )
                .into());
            }
            fields.push(field.as_ref());
            row.push(field.to_wire(value)?);
        }
        Ok((fields, row))
    }

    pub fn render(&self) -> Result<Query> {
        let mut rows = self.rows.iter();
        let Some(first) = rows.next() else {
            return Err(KeelError::Usage(format!(
                "Nothing to insert into `{}`",
                self.table.name()
            ))
            .into());
        };
        let (fields, first) = self.normalize(first)?;
        let mut context = Context::new(Fragment::SqlInsertInto);
        if self.rows.len() == 1 {
            MySqlWriter.write_insert(
                &mut context,
                self.table.table_ref(),
                &fields,
                Some(first.as_slice()),
                self.replace,
            )?;
            return Ok(context.query());
        }
        let mut batch = Vec::with_capacity(self.rows.len());
        batch.push(first);
        for values in rows {
            let (other, row) = self.normalize(values)?;
            if other.len() != fields.len()
                || other
                    .iter()
                    .zip(&fields)
                    .any(|(a, b)| a.column_name() != b.column_name())
            {
                return Err(KeelError::Usage(format!(
                    "Rows of a batch insert into `{}` must resolve to the same columns",
                    self.table.name()
                ))
                .into());
            }
            batch.push(row);
        }
        MySqlWriter.write_insert(
            &mut context,
            self.table.table_ref(),
            &fields,
            None,
            self.replace,
        )?;
        let mut query = context.query();
        query.params = Params::Many(batch);
        Ok(query)
    }

    pub async fn execute(&self, executor: &impl Executor) -> Result<RowsAffected> {
        let query = self.render()?;
        executor.execute(query).await
    }
}
