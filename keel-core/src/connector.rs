use crate::{
    Executor, KeelError, Query, Result, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt},
};
use async_stream::try_stream;
use std::{
    future::Future,
    pin::pin,
    sync::{Arc, RwLock},
};

/// Slot holding the executor an application works with.
///
/// At most one executor is bound at a time. The connector is itself an
/// [`Executor`] that forwards to the bound one, and fails with a binding error
/// while nothing is bound.
///
/// ```rust
/// use keel_core::{Connector, MockExecutor};
/// let connector = Connector::new();
/// connector.bind(MockExecutor::new()).unwrap();
/// assert!(connector.bind(MockExecutor::new()).is_err());
/// connector.unbind().unwrap();
/// assert!(!connector.is_bound());
/// ```
#[derive(Debug)]
pub struct Connector<E: Executor> {
    slot: RwLock<Option<Arc<E>>>,
}

impl<E: Executor> Default for Connector<E> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<E: Executor> Connector<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, executor: E) -> Result<Arc<E>> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return Err(KeelError::Binding(
                "An executor is already bound, unbind it first".into(),
            )
            .into());
        }
        let executor = Arc::new(executor);
        *slot = Some(executor.clone());
        log::debug!("Executor bound");
        Ok(executor)
    }

    /// Releases the bound executor and hands it back.
    pub fn unbind(&self) -> Result<Arc<E>> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        let executor = slot
            .take()
            .ok_or_else(|| KeelError::Binding("No executor is bound".into()))?;
        log::debug!("Executor unbound");
        Ok(executor)
    }

    pub fn is_bound(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn current(&self) -> Result<Arc<E>> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| {
                KeelError::Binding("Cannot run a statement, the connector is unbound".into())
                    .into()
            })
    }
}

impl<E: Executor> Executor for Connector<E> {
    fn execute(&self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        let executor = self.current();
        async move {
            let executor = executor?;
            executor.execute(query).await
        }
    }

    fn fetch(
        &self,
        query: Query,
        row_limit: Option<u64>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let executor = self.current();
        try_stream! {
            let executor = executor?;
            let mut stream = pin!(executor.fetch(query, row_limit));
            while let Some(row) = stream.next().await {
                yield row?;
            }
        }
    }
}
