use crate::{MySQLOptions, RowWrap, ValueWrap, placeholder::translate};
use async_stream::try_stream;
use keel_core::{
    Error, ErrorContext, Executor, Params, Query, Result, RowLabeled, RowsAffected, Value,
    log_error,
    stream::{Stream, StreamExt, TryStreamExt},
};
use mysql_async::{
    Pool, QueryResult, TxOpts,
    prelude::{Protocol, Queryable},
};
use std::{future::Future, sync::Arc};

/// Executor backed by a `mysql_async` connection pool.
///
/// Every statement borrows a connection for its own duration; the connection
/// goes back to the pool when it is dropped, whatever the outcome.
#[derive(Debug, Clone)]
pub struct MySQLPool {
    pool: Pool,
    autocommit: bool,
}

impl MySQLPool {
    pub fn new(options: MySQLOptions) -> Self {
        log::debug!(
            "Opening a MySQL pool of {}..={} connections",
            options.pool_min,
            options.pool_max
        );
        Self {
            pool: Pool::new(options.opts),
            autocommit: options.autocommit,
        }
    }

    /// Pool configured from a `mysql://` url, see [`MySQLOptions`].
    pub fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(MySQLOptions::from_url(url)?))
    }

    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Waits for the connections in use and closes the pool.
    pub async fn disconnect(self) -> Result<()> {
        self.pool
            .disconnect()
            .await
            .context("While disconnecting the MySQL pool")
    }
}

fn positional(values: Vec<Value>) -> Result<mysql_async::Params> {
    if values.is_empty() {
        return Ok(mysql_async::Params::Empty);
    }
    Ok(mysql_async::Params::Positional(
        values
            .into_iter()
            .map(|v| ValueWrap(v).try_into())
            .collect::<Result<_>>()?,
    ))
}

async fn outcome<'a, 't: 'a, P: Protocol>(result: QueryResult<'a, 't, P>) -> Result<RowsAffected> {
    let affected = RowsAffected {
        rows_affected: result.affected_rows(),
        last_insert_id: result.last_insert_id(),
    };
    result.drop_result().await?;
    Ok(affected)
}

async fn write<Q: Queryable>(queryable: &mut Q, query: Query) -> Result<RowsAffected> {
    match query.params {
        Params::Single(params) if params.is_empty() => {
            outcome(queryable.query_iter(query.sql).await?).await
        }
        Params::Single(params) => {
            let (sql, params) = translate(&query.sql, params)?;
            outcome(queryable.exec_iter(sql, positional(params)?).await?).await
        }
        Params::Many(rows) => {
            let mut result = RowsAffected::default();
            let Some(first) = rows.first() else {
                return Ok(result);
            };
            let (sql, _) = translate(&query.sql, first.clone())?;
            let statement = queryable.prep(sql).await?;
            for row in rows {
                let pending = queryable
                    .exec_iter(&statement, positional(row)?)
                    .await?;
                let affected = outcome(pending).await?;
                result.extend([affected]);
            }
            Ok(result)
        }
    }
}

impl MySQLPool {
    async fn run(&self, query: Query) -> Result<RowsAffected> {
        let mut connection = self.pool.get_conn().await?;
        if self.autocommit {
            return write(&mut connection, query).await;
        }
        let mut transaction = connection.start_transaction(TxOpts::default()).await?;
        match write(&mut transaction, query).await {
            Ok(affected) => {
                transaction.commit().await?;
                Ok(affected)
            }
            Err(error) => {
                if let Err(e) = transaction.rollback().await {
                    log::error!("Rollback failed: {:#}", e);
                }
                Err(error)
            }
        }
    }
}

impl Executor for MySQLPool {
    fn execute(&self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        let context = Arc::new(format!("While executing the query:\n{}", query));
        log::debug!("{}", query);
        async move {
            self.run(query)
                .await
                .map_err(|e| log_error!(e.context(context)))
        }
    }

    fn fetch(
        &self,
        query: Query,
        row_limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let context = Arc::new(format!("While fetching the query:\n{}", query));
        log::debug!("{}", query);
        let pool = self.pool.clone();
        let Query { sql, params } = query;
        let params = match params {
            Params::Single(params) => Ok(params),
            Params::Many(..) => Err(Error::msg(
                "A query cannot fetch rows with multiple parameter sets",
            )),
        };
        try_stream! {
            let params = params?;
            let mut remaining = row_limit.unwrap_or(u64::MAX);
            if remaining > 0 {
                let mut connection = pool.get_conn().await?;
                if params.is_empty() {
                    let mut result = connection.query_iter(sql).await?;
                    'sets: while let Some(mut stream) = result.stream::<RowWrap>().await? {
                        while let Some(row) = stream.next().await.transpose()? {
                            yield row.0;
                            remaining -= 1;
                            if remaining == 0 {
                                break 'sets;
                            }
                        }
                    }
                } else {
                    let (sql, params) = translate(&sql, params)?;
                    let mut stream = connection
                        .exec_stream::<RowWrap, _, _>(sql, positional(params)?)
                        .await?;
                    while let Some(row) = stream.next().await.transpose()? {
                        yield row.0;
                        remaining -= 1;
                        if remaining == 0 {
                            break;
                        }
                    }
                }
            }
        }
        .map_err(move |e: Error| log_error!(e.context(context.clone())))
    }
}
