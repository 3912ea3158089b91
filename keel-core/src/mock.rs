use crate::{
    Executor, Query, Result, RowLabeled, RowsAffected,
    stream::{self, Stream},
};
use std::{
    collections::VecDeque,
    future::{self, Future},
    sync::{Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct MockState {
    queries: Vec<Query>,
    results: VecDeque<Vec<RowLabeled>>,
    affected: VecDeque<RowsAffected>,
}

/// In-memory executor recording every statement it receives.
///
/// Each `fetch` replays the next result set pushed with
/// [`MockExecutor::push_rows`] (an empty one when none is left). Each `execute`
/// replays the next [`RowsAffected`] pushed with
/// [`MockExecutor::push_affected`], one affected row otherwise.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_rows(&self, rows: impl IntoIterator<Item = RowLabeled>) -> &Self {
        self.state().results.push_back(rows.into_iter().collect());
        self
    }

    pub fn push_affected(&self, affected: RowsAffected) -> &Self {
        self.state().affected.push_back(affected);
        self
    }

    /// Statements received so far, oldest first.
    pub fn queries(&self) -> Vec<Query> {
        self.state().queries.clone()
    }

    pub fn last_query(&self) -> Option<Query> {
        self.state().queries.last().cloned()
    }

    pub fn take_queries(&self) -> Vec<Query> {
        std::mem::take(&mut self.state().queries)
    }
}

impl Executor for MockExecutor {
    fn execute(&self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        log::debug!("{}", query);
        let mut state = self.state();
        state.queries.push(query);
        let affected = state.affected.pop_front().unwrap_or(RowsAffected {
            rows_affected: 1,
            last_insert_id: None,
        });
        future::ready(Ok(affected))
    }

    fn fetch(
        &self,
        query: Query,
        row_limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        log::debug!("{}", query);
        let mut state = self.state();
        state.queries.push(query);
        let mut rows = state.results.pop_front().unwrap_or_default();
        if let Some(limit) = row_limit {
            rows.truncate(limit as usize);
        }
        stream::iter(rows.into_iter().map(Ok))
    }
}
