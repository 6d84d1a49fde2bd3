use std::collections::BTreeSet;

use common::{AuthorId, BookChangeRequestId, BookId, EntityId};
use store::{Filter, Row, Statement, Value};

use super::{BookChangeRequest, BookChangeRequestAction, BookChanges};
use crate::entity::ActionLog;
use crate::error::{DomainError, Result};
use crate::mapper::{ActionTranslator, Mapper, mapping_error, row_uuid};
use crate::patch::Patch;
use crate::value_objects::BookFormat;

/// Maps the `book_change_requests` table.
///
/// Proposal columns are nullable: `NULL` means the field was not proposed.
/// The proposed author set is stored as a JSON array.
pub struct BookChangeRequestMapper;

impl BookChangeRequestMapper {
    /// Deletes the request, failing the batch unless exactly one row goes.
    ///
    /// Appended to the merged book's save so the request is consumed at most
    /// once.
    pub fn consume_statement(id: BookChangeRequestId) -> Statement {
        Statement::delete(Self::TABLE, vec![Filter::eq(Self::PRIMARY_KEY, id.as_uuid())])
            .expect_rows(1)
    }

    fn patch<T>(value: Result<Option<T>>) -> Result<Patch<T>> {
        value.map(Patch::from)
    }
}

impl Mapper for BookChangeRequestMapper {
    type Entity = BookChangeRequest;

    const TABLE: &'static str = "book_change_requests";

    fn map_to_domain(row: &Row) -> Result<BookChangeRequest> {
        let err = mapping_error::<Self>;
        let text = |column: &str| Self::patch(row.opt_text(column).map_err(err));
        let int = |column: &str| Self::patch(row.opt_int32(column).map_err(err));

        let format = match row.opt_text("format").map_err(err)? {
            Some(text) => Patch::Present(text.parse::<BookFormat>().map_err(|reason| {
                DomainError::Mapping {
                    entity_type: "BookChangeRequest",
                    reason,
                }
            })?),
            None => Patch::Absent,
        };

        let author_ids = match row.opt_json("author_ids").map_err(err)? {
            Some(json) => Patch::Present(
                serde_json::from_value::<BTreeSet<AuthorId>>(json).map_err(|e| {
                    DomainError::Mapping {
                        entity_type: "BookChangeRequest",
                        reason: format!("author_ids: {e}"),
                    }
                })?,
            ),
            None => Patch::Absent,
        };

        Ok(BookChangeRequest {
            id: BookChangeRequestId::from(row_uuid::<Self>(row, "id")?),
            book_id: BookId::from(row_uuid::<Self>(row, "book_id")?),
            user_email: row.text("user_email").map_err(err)?,
            created_at: row.timestamp("created_at").map_err(err)?,
            changes: BookChanges {
                title: text("title")?,
                isbn: text("isbn")?,
                publisher: text("publisher")?,
                release_year: int("release_year")?,
                language: text("language")?,
                translator: text("translator")?,
                format,
                pages: int("pages")?,
                image_url: text("image_url")?,
                author_ids,
            },
            actions: ActionLog::default(),
        })
    }

    fn map_to_persistence(request: &BookChangeRequest) -> Row {
        let changes = &request.changes;
        let author_ids = changes.author_ids.value().map(|ids| {
            Value::Json(serde_json::Value::Array(
                ids.iter()
                    .map(|id| serde_json::Value::String(id.to_string()))
                    .collect(),
            ))
        });

        Row::new()
            .with("id", request.id.as_uuid())
            .with("book_id", request.book_id.as_uuid())
            .with("user_email", request.user_email.as_str())
            .with("created_at", request.created_at)
            .with("title", changes.title.value().cloned())
            .with("isbn", changes.isbn.value().cloned())
            .with("publisher", changes.publisher.value().cloned())
            .with("release_year", changes.release_year.value().copied())
            .with("language", changes.language.value().cloned())
            .with("translator", changes.translator.value().cloned())
            .with("format", changes.format.value().map(|f| f.as_str()))
            .with("pages", changes.pages.value().copied())
            .with("image_url", changes.image_url.value().cloned())
            .with("author_ids", author_ids.unwrap_or(Value::Null))
    }
}

impl ActionTranslator for BookChangeRequestMapper {
    fn action_statements(
        _id: BookChangeRequestId,
        action: &BookChangeRequestAction,
    ) -> Vec<Statement> {
        match *action {}
    }
}
