use crate::{
    Executor, Query, Result, RowLabeled, RowsAffected, Table, TableRef,
    writer::{Context, Fragment, MySqlWriter, SqlWriter},
};
use std::sync::Arc;

/// `CREATE [TEMPORARY] TABLE [IF NOT EXISTS]` with every field, the primary key
/// and the indexes of the table.
#[derive(Debug, Clone)]
pub struct CreateTable {
    table: Arc<Table>,
    safe: bool,
    temporary: bool,
}

impl CreateTable {
    pub fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            safe: false,
            temporary: false,
        }
    }
    /// `IF NOT EXISTS`
    pub fn safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }
    pub fn render(&self) -> Result<Query> {
        let mut context = Context::new(Fragment::SqlCreateTable);
        MySqlWriter.write_create_table(&mut context, &self.table, self.safe, self.temporary)?;
        Ok(context.query())
    }
    pub async fn execute(&self, executor: &impl Executor) -> Result<RowsAffected> {
        let query = self.render()?;
        executor.execute(query).await
    }
}

/// `DROP [TEMPORARY] TABLE [IF EXISTS]`
#[derive(Debug, Clone)]
pub struct DropTable {
    table: TableRef,
    safe: bool,
    temporary: bool,
}

impl DropTable {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.table_ref().clone(),
            safe: false,
            temporary: false,
        }
    }
    /// `IF EXISTS`
    pub fn safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }
    pub fn render(&self) -> Query {
        let mut context = Context::new(Fragment::SqlDropTable);
        MySqlWriter.write_drop_table(&mut context, &self.table, self.safe, self.temporary);
        context.query()
    }
    pub async fn execute(&self, executor: &impl Executor) -> Result<RowsAffected> {
        executor.execute(self.render()).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowKind {
    /// `SHOW CREATE TABLE`
    CreateTable,
    /// `SHOW FULL COLUMNS FROM`
    Columns,
    /// `SHOW INDEX FROM`
    Indexes,
}

/// Read only introspection of a table.
#[derive(Debug, Clone)]
pub struct Show {
    table: TableRef,
    kind: ShowKind,
}

impl Show {
    pub fn new(table: &Table, kind: ShowKind) -> Self {
        Self {
            table: table.table_ref().clone(),
            kind,
        }
    }
    pub fn render(&self) -> Query {
        let mut context = Context::new(Fragment::SqlShow);
        MySqlWriter.write_show(&mut context, &self.table, self.kind);
        context.query()
    }
    pub async fn fetch(&self, executor: &impl Executor) -> Result<Vec<RowLabeled>> {
        executor.fetch_all(self.render(), None).await
    }
}
