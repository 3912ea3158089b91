use crate::{
    AsValue, Column, CreateTable, Delete, DropTable, Executor, ExpressionExt, FromRecord, Insert,
    IntoValues, Result, Row, RowLabeled, RowsAffected, Select, Show, ShowKind, Table,
    Update, Value,
};
use std::{future::Future, sync::Arc};

/// Table bound type, usually implemented with `#[derive(Model)]`.
///
/// Statement builders are returned as they are, to be refined and executed by
/// the caller. The other methods run right away on the executor they receive.
pub trait Model: FromRecord + IntoValues + Sized {
    /// The compiled table, shared by every instance.
    fn table() -> Arc<Table>;

    fn column(attribute: &str) -> Result<Column> {
        Self::table().column(attribute)
    }

    fn create(executor: &impl Executor, safe: bool) -> impl Future<Output = Result<()>> + Send {
        let query = CreateTable::new(Self::table()).safe(safe).render();
        async move {
            executor.execute(query?).await?;
            Ok(())
        }
    }

    fn drop_table(executor: &impl Executor, safe: bool) -> impl Future<Output = Result<()>> + Send {
        let query = DropTable::new(&Self::table()).safe(safe).render();
        async move {
            executor.execute(query).await?;
            Ok(())
        }
    }

    fn show(
        executor: &impl Executor,
        kind: ShowKind,
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        let query = Show::new(&Self::table(), kind).render();
        executor.fetch_all(query, None)
    }

    /// Row with primary key `id`.
    fn get(
        executor: &impl Executor,
        id: impl Into<Value>,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        let table = Self::table();
        let id: Value = id.into();
        let select = Select::new(table.clone()).filter(table.primary_key_column().equal(id));
        async move { select.first_as::<Self>(executor).await }
    }

    /// Rows whose primary key is in `ids`, optionally restricted to some
    /// attributes.
    fn mget<I>(
        executor: &impl Executor,
        ids: I,
        attributes: &[&str],
    ) -> impl Future<Output = Result<Vec<Row>>> + Send
    where
        I: IntoIterator,
        I::Item: AsValue,
    {
        let table = Self::table();
        let columns = attributes
            .iter()
            .map(|a| table.column(a))
            .collect::<Result<Vec<_>>>();
        let ids: Vec<Value> = ids.into_iter().map(AsValue::as_value).collect();
        async move {
            let columns = columns?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let limit = ids.len() as u64;
            Select::new(table.clone())
                .filter(table.primary_key_column().in_(Value::List(ids))?)
                .columns(columns)
                .limit(limit)
                .all(executor)
                .await
        }
    }

    /// Inserts one row.
    fn add(
        executor: &impl Executor,
        row: impl IntoValues,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        let insert = Self::insert(row);
        async move { insert.execute(executor).await }
    }

    /// Inserts a batch of rows with a single statement.
    fn madd<I>(
        executor: &impl Executor,
        rows: I,
    ) -> impl Future<Output = Result<RowsAffected>> + Send
    where
        I: IntoIterator,
        I::Item: IntoValues,
    {
        let insert = Insert::new(Self::table()).rows(rows);
        async move { insert.execute(executor).await }
    }

    fn select() -> Select {
        Select::new(Self::table())
    }

    fn insert(row: impl IntoValues) -> Insert {
        Insert::new(Self::table()).row(row)
    }

    /// Batch insert reading only `attributes` from each row (every attribute
    /// when empty).
    fn minsert<I>(rows: I, attributes: &[&str]) -> Insert
    where
        I: IntoIterator,
        I::Item: IntoValues,
    {
        let insert = Insert::new(Self::table()).rows(rows);
        if attributes.is_empty() {
            insert
        } else {
            insert.columns(attributes.iter().copied())
        }
    }

    fn replace(row: impl IntoValues) -> Insert {
        Insert::replace(Self::table()).row(row)
    }

    fn mreplace<I>(rows: I, attributes: &[&str]) -> Insert
    where
        I: IntoIterator,
        I::Item: IntoValues,
    {
        let insert = Insert::replace(Self::table()).rows(rows);
        if attributes.is_empty() {
            insert
        } else {
            insert.columns(attributes.iter().copied())
        }
    }

    fn update(values: impl IntoValues) -> Result<Update> {
        Update::new(Self::table()).set_all(values)
    }

    fn delete() -> Delete {
        Delete::new(Self::table())
    }
}
