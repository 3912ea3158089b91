use crate::{
    Result, Value,
    stream::{Stream, TryStreamExt},
    truncate_long,
};
use std::{
    fmt::{self, Display},
    future::Future,
    sync::Arc,
};

/// Positional parameters of a rendered statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// One set of values, aligned with the `%s` placeholders.
    Single(Vec<Value>),
    /// The statement runs once per set (batch insert).
    Many(Vec<Vec<Value>>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Single(Vec::new())
    }
}

impl Params {
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Single(v) => v.is_empty(),
            Params::Many(v) => v.is_empty(),
        }
    }
}

/// Rendered statement: SQL text with `%s` placeholders and its parameters.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Params,
}

impl Query {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
    /// Statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Params::default())
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

/// Outcome of a modify statement.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_insert_id.is_some() {
                self.last_insert_id = elem.last_insert_id;
            }
        }
    }
}

/// Shared column name list of a result set.
pub type RowNames = Arc<[String]>;

/// A result row with its column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: RowNames,
    /// Aligned by index with `labels`.
    pub values: Box<[Value]>,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Box<[Value]>) -> Self {
        Self { labels, values }
    }
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        let (labels, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self {
            labels: labels.into(),
            values: values.into(),
        }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What the statement builders need from a database connection.
pub trait Executor: Send + Sync {
    /// Run a modify (or DDL) statement. `Params::Many` runs it once per set.
    fn execute(&self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send;

    /// Run a query and stream its rows, stopping after `row_limit` rows if given.
    fn fetch(
        &self,
        query: Query,
        row_limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send;

    fn fetch_all(
        &self,
        query: Query,
        row_limit: Option<u64>,
    ) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send {
        self.fetch(query, row_limit).try_collect()
    }
}

impl<E: Executor> Executor for Arc<E> {
    fn execute(&self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        (**self).execute(query)
    }
    fn fetch(
        &self,
        query: Query,
        row_limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        (**self).fetch(query, row_limit)
    }
}
