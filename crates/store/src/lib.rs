//! Persistence execution layer for the library catalogue.
//!
//! Callers describe writes as a batch of [`Statement`]s which a [`RowStore`]
//! executes atomically, and reads as a [`RowQuery`] returning raw [`Row`]s.
//! Two implementations are provided:
//! - [`InMemoryRowStore`] for tests and local runs
//! - [`PostgresRowStore`] backed by a `sqlx` connection pool

pub mod error;
pub mod memory;
pub mod postgres;
pub mod statement;
pub mod store;
pub mod value;

pub use error::{Result, RowError, StoreError};
pub use memory::{InMemoryRowStore, UniqueConstraint};
pub use postgres::PostgresRowStore;
pub use statement::{Filter, FilterOp, Join, RowQuery, Statement, validate_statements};
pub use store::{RowStore, RowStoreExt};
pub use value::{Row, Value};
