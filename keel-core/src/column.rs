use crate::{
    Expression, Field, Result, TableRef,
    writer::{Context, SqlWriter},
};
use std::sync::Arc;

/// Reference to a column of a compiled table, usable inside expressions.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) table: TableRef,
    pub(crate) attribute: Arc<str>,
    pub(crate) field: Arc<Field>,
}

impl Column {
    pub fn name(&self) -> &str {
        self.field.column_name()
    }
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
    pub fn table(&self) -> &TableRef {
        &self.table
    }
    pub fn field_def(&self) -> &Arc<Field> {
        &self.field
    }
}

impl Expression for Column {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        writer.write_column_ref(context, &self.table, self.name());
        Ok(())
    }
    fn field(&self) -> Option<&Arc<Field>> {
        Some(&self.field)
    }
}
