use crate::{
    AsValue, Call, Executor, Expression, FromRecord, KeelError, Query, Result, Row, RowLabeled,
    Shape, Table, Value, and_, load, raw,
    stream::Stream,
    writer::{Context, Fragment, MySqlWriter, SqlWriter},
};
use async_stream::try_stream;
use std::{ops::Range, sync::Arc};

/// Rows fetched by [`Select::all`] when no limit was given.
pub const DEFAULT_ROW_CAP: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug)]
pub struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) table: Arc<Table>,
    pub(crate) on: Box<dyn Expression>,
}

/// Offsets visited by [`Select::iter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: u64,
    stop: u64,
    step: u64,
}

/// `SELECT` builder.
///
/// Clauses are always rendered in SQL order, whatever the order of the calls.
/// The builder is not consumed by the terminal methods: rendering the same
/// state twice yields the same statement.
///
/// ```rust
/// use keel_core::{ExpressionExt, Field, Select, Table};
/// use std::sync::Arc;
/// let user = Arc::new(
///     Table::builder("User")
///         .name("user")
///         .field("id", Field::auto())
///         .field("name", Field::varchar(45).nullable())
///         .field("age", Field::int().default(0))
///         .build()
///         .unwrap(),
/// );
/// let query = Select::new(user.clone())
///     .columns([user.column("name").unwrap()])
///     .filter(user.column("age").unwrap().greater(10))
///     .order_by([user.column("id").unwrap().desc()])
///     .limit(5)
///     .render()
///     .unwrap();
/// assert_eq!(
///     query.sql,
///     "SELECT `name` FROM `user` WHERE (`age` > %s) ORDER BY `id` DESC LIMIT 5;"
/// );
/// ```
#[derive(Debug)]
pub struct Select {
    pub(crate) table: Arc<Table>,
    pub(crate) columns: Vec<Box<dyn Expression>>,
    pub(crate) distinct: bool,
    pub(crate) joins: Vec<Join>,
    pub(crate) filter: Option<Box<dyn Expression>>,
    pub(crate) group_by: Vec<Box<dyn Expression>>,
    pub(crate) having: Option<Box<dyn Expression>>,
    pub(crate) order_by: Vec<Box<dyn Expression>>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) shape: Shape,
    window: Option<Window>,
}

impl Select {
    pub fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            columns: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            shape: Shape::Model,
            window: None,
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Projection, every field of the table when empty.
    pub fn columns<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Box<dyn Expression>>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn column(mut self, column: impl Into<Box<dyn Expression>>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn join(self, table: &Arc<Table>, on: impl Into<Box<dyn Expression>>) -> Self {
        self.push_join(JoinKind::Inner, table, on.into())
    }

    pub fn left_join(self, table: &Arc<Table>, on: impl Into<Box<dyn Expression>>) -> Self {
        self.push_join(JoinKind::Left, table, on.into())
    }

    fn push_join(mut self, kind: JoinKind, table: &Arc<Table>, on: Box<dyn Expression>) -> Self {
        self.joins.push(Join {
            kind,
            table: table.clone(),
            on,
        });
        self
    }

    /// `WHERE` condition. A later call replaces the previous condition, combine
    /// them with [`and_`] or [`crate::or_`].
    pub fn filter(mut self, condition: impl Into<Box<dyn Expression>>) -> Self {
        self.filter = Some(condition.into());
        self
    }

    /// `WHERE` made of all the conditions joined with `AND`.
    pub fn filter_all<I>(mut self, conditions: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Box<dyn Expression>>,
    {
        self.filter = Some(and_(conditions)?);
        Ok(self)
    }

    pub fn group_by<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Box<dyn Expression>>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn having(mut self, condition: impl Into<Box<dyn Expression>>) -> Self {
        self.having = Some(condition.into());
        self
    }

    pub fn order_by<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Box<dyn Expression>>,
    {
        self.order_by
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requires a previous [`Select::limit`].
    pub fn offset(mut self, offset: u64) -> Result<Self> {
        if self.limit.is_none() {
            return Err(KeelError::Usage(format!(
                "OFFSET on `{}` requires a LIMIT",
                self.table.name()
            ))
            .into());
        }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn as_map(self) -> Self {
        self.shape(Shape::Map)
    }

    pub fn as_tuple(self) -> Self {
        self.shape(Shape::Tuple)
    }

    /// Offsets `range.start`, `range.start + step`, ... below `range.end` for
    /// [`Select::iter`].
    pub fn slice(mut self, range: Range<u64>, step: u64) -> Result<Self> {
        if range.start >= range.end {
            return Err(KeelError::Usage(format!(
                "Slice start {} must be lower than its stop {}",
                range.start, range.end
            ))
            .into());
        }
        if step == 0 {
            return Err(KeelError::Usage("Slice step must be positive".into()).into());
        }
        self.window = Some(Window {
            start: range.start,
            stop: range.end,
            step,
        });
        Ok(self)
    }

    pub fn render(&self) -> Result<Query> {
        self.render_with(None, self.limit, self.offset)
    }

    pub(crate) fn render_with(
        &self,
        projection: Option<&dyn Expression>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Query> {
        let mut context = Context::new(Fragment::SqlSelect);
        MySqlWriter.write_select(&mut context, self, projection, limit, offset)?;
        Ok(context.query())
    }

    fn load_all(&self, rows: Vec<RowLabeled>) -> Result<Vec<Row>> {
        rows.into_iter()
            .map(|row| load(&self.table, row, self.shape))
            .collect()
    }

    /// Every matching row. Without a limit at most [`DEFAULT_ROW_CAP`] rows are
    /// fetched.
    pub async fn all(&self, executor: &impl Executor) -> Result<Vec<Row>> {
        let limit = self.limit.unwrap_or(DEFAULT_ROW_CAP);
        let query = self.render_with(None, Some(limit), self.offset)?;
        let rows = executor.fetch_all(query, None).await?;
        if self.limit.is_none() && rows.len() as u64 >= DEFAULT_ROW_CAP {
            log::warn!(
                "Select on `{}` stopped at {} rows, set a limit to fetch more",
                self.table.name(),
                DEFAULT_ROW_CAP
            );
        }
        self.load_all(rows)
    }

    /// Every matching row converted into `T`.
    pub async fn all_as<T: FromRecord>(&self, executor: &impl Executor) -> Result<Vec<T>> {
        let limit = self.limit.unwrap_or(DEFAULT_ROW_CAP);
        let query = self.render_with(None, Some(limit), self.offset)?;
        let rows = executor.fetch_all(query, None).await?;
        rows.into_iter()
            .map(|row| into_typed(&self.table, row))
            .collect()
    }

    pub async fn first(&self, executor: &impl Executor) -> Result<Option<Row>> {
        let query = self.render_with(None, Some(1), self.offset)?;
        let rows = executor.fetch_all(query, Some(1)).await?;
        rows.into_iter()
            .next()
            .map(|row| load(&self.table, row, self.shape))
            .transpose()
    }

    /// Same as [`Select::first`].
    pub async fn get(&self, executor: &impl Executor) -> Result<Option<Row>> {
        self.first(executor).await
    }

    /// First matching row converted into `T`.
    pub async fn first_as<T: FromRecord>(&self, executor: &impl Executor) -> Result<Option<T>> {
        let query = self.render_with(None, Some(1), self.offset)?;
        let rows = executor.fetch_all(query, Some(1)).await?;
        rows.into_iter()
            .next()
            .map(|row| into_typed(&self.table, row))
            .transpose()
    }

    /// `count` rows starting at offset `start`.
    pub async fn rows(&self, executor: &impl Executor, count: u64, start: u64) -> Result<Vec<Row>> {
        let query = self.render_with(None, Some(count), Some(start))?;
        let rows = executor.fetch_all(query, None).await?;
        self.load_all(rows)
    }

    /// Page `page` (starting from 1) of `size` rows.
    pub async fn paginate(
        &self,
        executor: &impl Executor,
        page: u64,
        size: u64,
    ) -> Result<Vec<Row>> {
        if page == 0 {
            return Err(KeelError::Usage("Pages are numbered from 1".into()).into());
        }
        self.rows(executor, size, (page - 1) * size).await
    }

    /// First column of the first row, `NULL` when nothing matches.
    pub async fn scalar(&self, executor: &impl Executor) -> Result<Value> {
        let query = self.render()?;
        self.fetch_scalar(executor, query).await
    }

    async fn fetch_scalar(&self, executor: &impl Executor, query: Query) -> Result<Value> {
        let rows = executor.fetch_all(query, Some(1)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.values.into_vec().into_iter().next())
            .unwrap_or_default())
    }

    /// `SELECT COUNT(1)` over the same filter, ordering and limit are ignored.
    pub async fn count(&self, executor: &impl Executor) -> Result<u64> {
        let query = self.render_with(Some(&Call::count_all()), None, None)?;
        let value = self.fetch_scalar(executor, query).await?;
        if value.is_null() {
            return Ok(0);
        }
        u64::try_from_value(value)
    }

    /// Whether at least one row matches.
    pub async fn exist(&self, executor: &impl Executor) -> Result<bool> {
        let query = self.render_with(Some(&raw("1")), Some(1), None)?;
        let value = self.fetch_scalar(executor, query).await?;
        Ok(!value.is_null())
    }

    /// Lazily walks the matching rows, one `LIMIT 1 OFFSET k` query per row.
    ///
    /// Starts from the slice start (or the offset) and stops at the first
    /// missing row or at the slice stop.
    pub fn iter<'a, E: Executor>(
        &'a self,
        executor: &'a E,
    ) -> impl Stream<Item = Result<Row>> + Send + 'a {
        let (start, stop, step) = match self.window {
            Some(w) => (w.start, Some(w.stop), w.step),
            None => (self.offset.unwrap_or(0), None, 1),
        };
        try_stream! {
            let mut offset = start;
            while stop.is_none_or(|stop| offset < stop) {
                let query = self.render_with(None, Some(1), Some(offset))?;
                let rows = executor.fetch_all(query, Some(1)).await?;
                let Some(row) = rows.into_iter().next() else {
                    break;
                };
                yield load(&self.table, row, self.shape)?;
                offset += step;
            }
        }
    }
}

fn into_typed<T: FromRecord>(table: &Arc<Table>, row: RowLabeled) -> Result<T> {
    match load(table, row, Shape::Model)? {
        Row::Record(record) => T::from_record(record),
        _ => Err(KeelError::Usage(format!(
            "The selected columns do not match the fields of `{}`",
            table.name()
        ))
        .into()),
    }
}

impl Expression for Select {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context) -> Result<()> {
        // Subqueries may reference the enclosing table
        let mut context = context.with_options(|o| {
            o.parenthesize = true;
            o.qualify_columns = true;
        });
        writer.write_select(&mut context, self, None, self.limit, self.offset)
    }
    fn is_sequence(&self) -> bool {
        true
    }
}
