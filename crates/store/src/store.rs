use async_trait::async_trait;

use crate::{Result, Row, RowQuery, Statement};

/// Core trait for row store implementations.
///
/// A row store executes batches of statements and answers row queries.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Executes a batch of statements.
    ///
    /// The batch is atomic: either every statement takes effect or none
    /// does. Returns the number of rows affected by each statement, in
    /// order. An empty batch succeeds without touching the store.
    async fn execute(&self, statements: Vec<Statement>) -> Result<Vec<u64>>;

    /// Retrieves the rows matching a query.
    ///
    /// Rows belonging to the same parent are returned contiguously.
    async fn fetch(&self, query: RowQuery) -> Result<Vec<Row>>;
}

/// Extension trait providing convenience methods for row stores.
#[async_trait]
pub trait RowStoreExt: RowStore {
    /// Checks whether any row matches the query.
    async fn exists(&self, query: RowQuery) -> Result<bool> {
        Ok(!self.fetch(query).await?.is_empty())
    }
}

// Blanket implementation for all RowStore implementations
impl<T: RowStore + ?Sized> RowStoreExt for T {}
