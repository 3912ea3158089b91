use crate::{
    Executor, Expression, Field, IntoValues, KeelError, Operand, Query, Result, RowsAffected,
    Table, Value,
    writer::{Context, Fragment, MySqlWriter, SqlWriter},
};
use std::sync::Arc;

/// `UPDATE ... SET ... [WHERE ...]` builder.
///
/// Without a filter every row of the table is updated.
#[derive(Debug)]
pub struct Update {
    pub(crate) table: Arc<Table>,
    pub(crate) values: Vec<(Arc<Field>, Operand)>,
    pub(crate) filter: Option<Box<dyn Expression>>,
}

impl Update {
    pub fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            values: Vec::new(),
            filter: None,
        }
    }

    fn assign(mut self, attribute: &str, value: Operand) -> Result<Self> {
        let field = self.table.field(attribute)?.clone();
        if field.is_auto_increment() {
            return Err(KeelError::NotAllowed(format!(
                "Updating the auto-increment primary key `{}` of `{}`",
                attribute,
                self.table.name()
            ))
            .into());
        }
        match self
            .values
            .iter_mut()
            .find(|(f, _)| f.column_name() == field.column_name())
        {
            Some((_, current)) => *current = value,
            None => self.values.push((field, value)),
        }
        Ok(self)
    }

    /// `attribute = value`, the value goes through the field's conversion.
    pub fn set(self, attribute: &str, value: impl Into<Value>) -> Result<Self> {
        self.assign(attribute, Operand::Value(value.into()))
    }

    pub fn set_all(mut self, values: impl IntoValues) -> Result<Self> {
        for (attribute, value) in values.into_values() {
            self = self.set(&attribute, value)?;
        }
        Ok(self)
    }

    /// `attribute = expression`, e.g. `counter = (counter + 1)`.
    pub fn set_expr(self, attribute: &str, expression: impl Into<Operand>) -> Result<Self> {
        self.assign(attribute, expression.into())
    }

    pub fn filter(mut self, condition: impl Into<Box<dyn Expression>>) -> Self {
        self.filter = Some(condition.into());
        self
    }

    pub fn render(&self) -> Result<Query> {
        if self.values.is_empty() {
            return Err(KeelError::Usage(format!(
                "Nothing to update in `{}`",
                self.table.name()
            ))
            .into());
        }
        let mut context = Context::new(Fragment::SqlUpdateSet);
        MySqlWriter.write_update(&mut context, self)?;
        Ok(context.query())
    }

    pub async fn execute(&self, executor: &impl Executor) -> Result<RowsAffected> {
        let query = self.render()?;
        executor.execute(query).await
    }
}
