//! Book change requests: sparse proposals merged onto a book by a moderator.

mod changes;
mod mapper;
mod merger;

pub use changes::BookChanges;
pub use mapper::BookChangeRequestMapper;
pub use merger::{ChangeRequestMerger, MergeOutcome};

use chrono::{DateTime, Utc};
use common::{BookChangeRequestId, BookId};
use serde::{Deserialize, Serialize};

use crate::entity::{ActionLog, DomainAction, Entity};
use crate::error::{DomainError, Result};
use crate::validation;

const ENTITY: &str = "BookChangeRequest";

/// A change request is never mutated in place, so it records no actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BookChangeRequestAction {}

impl DomainAction for BookChangeRequestAction {
    fn action_type(&self) -> &'static str {
        match *self {}
    }
}

/// A pending proposal to change one book.
///
/// Approval and rejection both consume the request by deleting its row.
#[derive(Debug, Clone, Serialize)]
pub struct BookChangeRequest {
    id: BookChangeRequestId,
    book_id: BookId,
    user_email: String,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    changes: BookChanges,

    #[serde(skip)]
    actions: ActionLog<BookChangeRequestAction>,
}

impl Entity for BookChangeRequest {
    type Id = BookChangeRequestId;
    type Action = BookChangeRequestAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> BookChangeRequestId {
        self.id
    }

    fn apply(&mut self, action: &BookChangeRequestAction) {
        match *action {}
    }

    fn actions(&self) -> &ActionLog<BookChangeRequestAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<BookChangeRequestAction> {
        &mut self.actions
    }
}

impl BookChangeRequest {
    /// Creates a request proposing `changes` for `book_id`.
    ///
    /// A request proposing nothing is rejected.
    pub fn create(
        book_id: BookId,
        user_email: impl Into<String>,
        changes: BookChanges,
    ) -> Result<Self> {
        let user_email = user_email.into();
        validation::email(ENTITY, &user_email)?;

        if changes.is_empty() {
            return Err(DomainError::operation_not_valid(
                "a change request must propose at least one field",
            ));
        }

        Ok(Self {
            id: BookChangeRequestId::new(),
            book_id,
            user_email,
            created_at: Utc::now(),
            changes,
            actions: ActionLog::default(),
        })
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    /// Email of the proposer.
    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn changes(&self) -> &BookChanges {
        &self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Patch;

    #[test]
    fn empty_request_is_rejected() {
        let result =
            BookChangeRequest::create(BookId::new(), "reader@example.com", BookChanges::default());
        assert!(matches!(result, Err(DomainError::OperationNotValid { .. })));
    }

    #[test]
    fn request_keeps_proposal_and_proposer() {
        let book_id = BookId::new();
        let changes = BookChanges {
            title: Patch::Present("Dune".to_string()),
            ..Default::default()
        };

        let request =
            BookChangeRequest::create(book_id, "reader@example.com", changes.clone()).unwrap();

        assert_eq!(request.book_id(), book_id);
        assert_eq!(request.user_email(), "reader@example.com");
        assert_eq!(request.changes(), &changes);
        assert!(!request.has_pending_actions());
    }

    #[test]
    fn serializes_only_proposed_fields() {
        let request = BookChangeRequest::create(
            BookId::new(),
            "reader@example.com",
            BookChanges {
                pages: Patch::Present(0),
                ..Default::default()
            },
        )
        .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["pages"], 0);
        assert!(json.get("title").is_none());
    }
}
