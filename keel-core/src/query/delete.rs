use crate::{
    Executor, Expression, KeelError, Query, Result, RowsAffected, Table,
    writer::{Context, Fragment, MySqlWriter, SqlWriter},
};
use std::sync::Arc;

/// `DELETE FROM ... [WHERE ...] [LIMIT n]` builder.
///
/// Rendering without a filter fails unless [`Delete::allow_all`] was called.
#[derive(Debug)]
pub struct Delete {
    table: Arc<Table>,
    filter: Option<Box<dyn Expression>>,
    limit: Option<u64>,
    allow_all: bool,
}

impl Delete {
    pub fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            filter: None,
            limit: None,
            allow_all: false,
        }
    }

    pub fn filter(mut self, condition: impl Into<Box<dyn Expression>>) -> Self {
        self.filter = Some(condition.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Confirms that deleting without a filter is intended.
    pub fn allow_all(mut self) -> Self {
        self.allow_all = true;
        self
    }

    pub fn render(&self) -> Result<Query> {
        if self.filter.is_none() && !self.allow_all {
            return Err(KeelError::Dangerous(format!(
                "DELETE without WHERE would empty `{}`, call allow_all() to confirm",
                self.table.name()
            ))
            .into());
        }
        let mut context = Context::new(Fragment::SqlDeleteFrom);
        MySqlWriter.write_delete(
            &mut context,
            self.table.table_ref(),
            self.filter.as_deref(),
            self.limit,
        )?;
        Ok(context.query())
    }

    pub async fn execute(&self, executor: &impl Executor) -> Result<RowsAffected> {
        let query = self.render()?;
        executor.execute(query).await
    }
}
