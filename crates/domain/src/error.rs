//! Domain error types.

use store::{RowError, StoreError};
use thiserror::Error;

/// Errors that can occur during domain operations.
///
/// Every variant is raised at its innermost cause and propagates unchanged
/// up to the boundary layer, which owns the user-facing translation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A mutator received a value violating the aggregate's invariants.
    #[error("Invalid {entity_type} input: {reason}")]
    InputNotValid {
        entity_type: &'static str,
        reason: String,
    },

    /// A structurally sound request that makes no sense in the current state.
    #[error("Operation not valid: {reason}")]
    OperationNotValid { reason: String },

    /// The entity or change request does not exist.
    #[error("{resource} not found: {id}")]
    ResourceNotFound { resource: &'static str, id: String },

    /// A uniqueness rule of the store was violated.
    #[error("{resource} already exists: {reason}")]
    ResourceAlreadyExists {
        resource: &'static str,
        reason: String,
    },

    /// The statement batch failed to execute or commit; nothing was applied.
    #[error("Repository error while running {operation} on {entity_type}: {source}")]
    Repository {
        entity_type: &'static str,
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// A persisted row could not be mapped back to an entity.
    #[error("Cannot map {entity_type} row: {reason}")]
    Mapping {
        entity_type: &'static str,
        reason: String,
    },

    /// The caller is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// The caller is authenticated but may not perform the operation.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },
}

impl DomainError {
    pub fn input_not_valid(entity_type: &'static str, reason: impl Into<String>) -> Self {
        DomainError::InputNotValid {
            entity_type,
            reason: reason.into(),
        }
    }

    pub fn operation_not_valid(reason: impl Into<String>) -> Self {
        DomainError::OperationNotValid {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        DomainError::ResourceNotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        DomainError::Forbidden {
            reason: reason.into(),
        }
    }

    pub(crate) fn mapping(entity_type: &'static str, error: RowError) -> Self {
        DomainError::Mapping {
            entity_type,
            reason: error.to_string(),
        }
    }

    /// Translates a store failure raised while running `operation`.
    pub(crate) fn from_store(
        entity_type: &'static str,
        operation: &'static str,
        error: StoreError,
    ) -> Self {
        match error {
            StoreError::UniqueViolation { constraint, .. } => DomainError::ResourceAlreadyExists {
                resource: entity_type,
                reason: format!("constraint {constraint} violated"),
            },
            source => DomainError::Repository {
                entity_type,
                operation,
                source,
            },
        }
    }

    /// Returns true if this is a repository failure on a statement that
    /// required a row count it did not get on `table`.
    pub fn is_unexpected_row_count_on(&self, table: &str) -> bool {
        matches!(
            self,
            DomainError::Repository {
                source: StoreError::UnexpectedRowCount { table: t, .. },
                ..
            } if t == table
        )
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
