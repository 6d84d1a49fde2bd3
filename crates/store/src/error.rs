use thiserror::Error;

/// Errors raised while reading a typed column out of a [`crate::Row`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The row has no such column.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The column holds a value of an unexpected type.
    #[error("Column {column} is not a valid {expected}")]
    InvalidType {
        column: String,
        expected: &'static str,
    },
}

/// Errors that can occur when executing statements against a row store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A statement violated a uniqueness constraint.
    #[error("Unique constraint {constraint} violated on table {table}")]
    UniqueViolation { table: String, constraint: String },

    /// A statement affected a different number of rows than it required.
    #[error("Statement on table {table} affected {actual} rows, expected {expected}")]
    UnexpectedRowCount {
        table: String,
        expected: u64,
        actual: u64,
    },

    /// A statement in the batch is malformed and the batch was not attempted.
    #[error("Invalid statement at position {index}: {reason}")]
    InvalidStatement { index: usize, reason: String },

    /// The store refused to execute a statement.
    #[error("Statement at position {index} on table {table} was rejected")]
    StatementRejected { index: usize, table: String },

    /// A fetched row could not be decoded.
    #[error("Row error: {0}")]
    Row(#[from] RowError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for row store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
