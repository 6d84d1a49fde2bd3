//! A book in a user's personal library.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::{BookId, BookshelfId, CollectionId, EntityId, UserBookId, UserId};
use serde::{Deserialize, Serialize};
use store::{Filter, Join, Row, Statement};

use crate::book_reading::BookReadingMapper;
use crate::borrowing::BorrowingMapper;
use crate::entity::{ActionLog, DomainAction, Entity, RelationDelta, record};
use crate::error::Result;
use crate::mapper::{
    ActionTranslator, Mapper, mapping_error, parse_text, relation_statements, row_uuid,
    set_column,
};
use crate::quote::QuoteMapper;
use crate::validation;
use crate::value_objects::UserBookStatus;

const ENTITY: &str = "UserBook";

pub(crate) const USER_BOOKS_COLLECTIONS: &str = "user_books_collections";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum UserBookAction {
    UpdateStatus { status: UserBookStatus },
    UpdateIsFavorite { is_favorite: bool },
    UpdateBookshelf { bookshelf_id: BookshelfId },
    UpdateImageUrl { image_url: Option<String> },
    UpdateCollections(RelationDelta<CollectionId>),
}

impl DomainAction for UserBookAction {
    fn action_type(&self) -> &'static str {
        match self {
            UserBookAction::UpdateStatus { .. } => "UpdateStatus",
            UserBookAction::UpdateIsFavorite { .. } => "UpdateIsFavorite",
            UserBookAction::UpdateBookshelf { .. } => "UpdateBookshelf",
            UserBookAction::UpdateImageUrl { .. } => "UpdateImageUrl",
            UserBookAction::UpdateCollections(_) => "UpdateCollections",
        }
    }
}

/// Input for placing a book on a user's shelf.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewUserBook {
    pub book_id: BookId,
    pub bookshelf_id: BookshelfId,
    pub status: UserBookStatus,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserBook {
    id: UserBookId,
    user_id: UserId,
    book_id: BookId,
    bookshelf_id: BookshelfId,
    status: UserBookStatus,
    is_favorite: bool,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    collections: BTreeSet<CollectionId>,

    #[serde(skip)]
    actions: ActionLog<UserBookAction>,
}

impl Entity for UserBook {
    type Id = UserBookId;
    type Action = UserBookAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> UserBookId {
        self.id
    }

    fn apply(&mut self, action: &UserBookAction) {
        match action {
            UserBookAction::UpdateStatus { status } => self.status = *status,
            UserBookAction::UpdateIsFavorite { is_favorite } => self.is_favorite = *is_favorite,
            UserBookAction::UpdateBookshelf { bookshelf_id } => self.bookshelf_id = *bookshelf_id,
            UserBookAction::UpdateImageUrl { image_url } => self.image_url = image_url.clone(),
            UserBookAction::UpdateCollections(delta) => delta.apply_to(&mut self.collections),
        }
    }

    fn actions(&self) -> &ActionLog<UserBookAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<UserBookAction> {
        &mut self.actions
    }
}

impl UserBook {
    pub fn create(user_id: UserId, new: NewUserBook) -> Result<Self> {
        Self::validate_image_url(new.image_url.as_deref())?;

        Ok(Self {
            id: UserBookId::new(),
            user_id,
            book_id: new.book_id,
            bookshelf_id: new.bookshelf_id,
            status: new.status,
            is_favorite: new.is_favorite,
            image_url: new.image_url,
            created_at: Utc::now(),
            collections: BTreeSet::new(),
            actions: ActionLog::default(),
        })
    }

    fn validate_image_url(image_url: Option<&str>) -> Result<()> {
        image_url.map_or(Ok(()), |url| validation::text(ENTITY, "image url", url, 0..=512))
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn bookshelf_id(&self) -> BookshelfId {
        self.bookshelf_id
    }

    pub fn status(&self) -> UserBookStatus {
        self.status
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn collections(&self) -> &BTreeSet<CollectionId> {
        &self.collections
    }

    pub fn update_status(&mut self, status: UserBookStatus) -> Result<()> {
        record(self, UserBookAction::UpdateStatus { status });
        Ok(())
    }

    pub fn update_is_favorite(&mut self, is_favorite: bool) -> Result<()> {
        record(self, UserBookAction::UpdateIsFavorite { is_favorite });
        Ok(())
    }

    /// Moves the book to another shelf. Shelf ownership is checked by the caller.
    pub fn update_bookshelf(&mut self, bookshelf_id: BookshelfId) -> Result<()> {
        record(self, UserBookAction::UpdateBookshelf { bookshelf_id });
        Ok(())
    }

    pub fn update_image_url(&mut self, image_url: Option<String>) -> Result<()> {
        Self::validate_image_url(image_url.as_deref())?;
        record(self, UserBookAction::UpdateImageUrl { image_url });
        Ok(())
    }

    pub fn update_collections(&mut self, delta: RelationDelta<CollectionId>) -> Result<()> {
        delta.validate_against(&self.collections, "collection")?;
        record(self, UserBookAction::UpdateCollections(delta));
        Ok(())
    }
}

pub struct UserBookMapper;

impl UserBookMapper {
    /// Removes a collection from every user book that lists it.
    pub fn detach_collection_statement(collection_id: CollectionId) -> Statement {
        Statement::delete(
            USER_BOOKS_COLLECTIONS,
            vec![Filter::eq("collection_id", collection_id.as_uuid())],
        )
    }

    /// Deletes the readings, borrowings and quotes recorded for a user book.
    pub fn dependents_delete_statements(user_book_id: UserBookId) -> Vec<Statement> {
        [BookReadingMapper::TABLE, BorrowingMapper::TABLE, QuoteMapper::TABLE]
            .into_iter()
            .map(|table| {
                Statement::delete(table, vec![Filter::eq("user_book_id", user_book_id.as_uuid())])
            })
            .collect()
    }
}

impl Mapper for UserBookMapper {
    type Entity = UserBook;

    const TABLE: &'static str = "user_books";

    fn map_to_domain(row: &Row) -> Result<UserBook> {
        let err = mapping_error::<Self>;

        Ok(UserBook {
            id: UserBookId::from(row_uuid::<Self>(row, "id")?),
            user_id: UserId::from(row_uuid::<Self>(row, "user_id")?),
            book_id: BookId::from(row_uuid::<Self>(row, "book_id")?),
            bookshelf_id: BookshelfId::from(row_uuid::<Self>(row, "bookshelf_id")?),
            status: parse_text::<Self, _>(row, "status")?,
            is_favorite: row.boolean("is_favorite").map_err(err)?,
            image_url: row.opt_text("image_url").map_err(err)?,
            created_at: row.timestamp("created_at").map_err(err)?,
            collections: BTreeSet::new(),
            actions: ActionLog::default(),
        })
    }

    fn joins() -> Vec<Join> {
        vec![Join::new(
            USER_BOOKS_COLLECTIONS,
            "user_book_id",
            vec!["collection_id"],
        )]
    }

    fn fold_join_row(user_book: &mut UserBook, row: &Row) -> Result<()> {
        if let Some(collection_id) = row
            .opt_uuid("collection_id")
            .map_err(mapping_error::<Self>)?
        {
            user_book.collections.insert(CollectionId::from(collection_id));
        }
        Ok(())
    }

    fn map_to_persistence(user_book: &UserBook) -> Row {
        Row::new()
            .with("id", user_book.id.as_uuid())
            .with("user_id", user_book.user_id.as_uuid())
            .with("book_id", user_book.book_id.as_uuid())
            .with("bookshelf_id", user_book.bookshelf_id.as_uuid())
            .with("status", user_book.status.as_str())
            .with("is_favorite", user_book.is_favorite)
            .with("image_url", user_book.image_url.clone())
            .with("created_at", user_book.created_at)
    }

    fn map_relations_to_persistence(user_book: &UserBook) -> Vec<(&'static str, Row)> {
        user_book
            .collections
            .iter()
            .map(|collection_id| {
                (
                    USER_BOOKS_COLLECTIONS,
                    Row::new()
                        .with("user_book_id", user_book.id.as_uuid())
                        .with("collection_id", collection_id.as_uuid()),
                )
            })
            .collect()
    }
}

impl ActionTranslator for UserBookMapper {
    fn action_statements(id: UserBookId, action: &UserBookAction) -> Vec<Statement> {
        match action {
            UserBookAction::UpdateStatus { status } => {
                vec![set_column::<Self>(id, "status", status.as_str())]
            }
            UserBookAction::UpdateIsFavorite { is_favorite } => {
                vec![set_column::<Self>(id, "is_favorite", *is_favorite)]
            }
            UserBookAction::UpdateBookshelf { bookshelf_id } => {
                vec![set_column::<Self>(id, "bookshelf_id", bookshelf_id.as_uuid())]
            }
            UserBookAction::UpdateImageUrl { image_url } => {
                vec![set_column::<Self>(id, "image_url", image_url.clone())]
            }
            UserBookAction::UpdateCollections(delta) => relation_statements(
                USER_BOOKS_COLLECTIONS,
                "user_book_id",
                id,
                "collection_id",
                delta,
            ),
        }
    }
}
