//! Bookshelves holding a user's books.

use chrono::{DateTime, Utc};
use common::{BookshelfId, EntityId, UserId};
use serde::{Deserialize, Serialize};
use store::{Row, Statement};

use crate::entity::{ActionLog, DomainAction, Entity, record};
use crate::error::{DomainError, Result};
use crate::mapper::{ActionTranslator, Mapper, mapping_error, parse_text, row_uuid, set_column};
use crate::validation;
use crate::value_objects::BookshelfType;

const ENTITY: &str = "Bookshelf";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BookshelfAction {
    UpdateName { name: String },
}

impl DomainAction for BookshelfAction {
    fn action_type(&self) -> &'static str {
        match self {
            BookshelfAction::UpdateName { .. } => "UpdateName",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Bookshelf {
    id: BookshelfId,
    user_id: UserId,
    name: String,
    bookshelf_type: BookshelfType,
    created_at: DateTime<Utc>,

    #[serde(skip)]
    actions: ActionLog<BookshelfAction>,
}

impl Entity for Bookshelf {
    type Id = BookshelfId;
    type Action = BookshelfAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> BookshelfId {
        self.id
    }

    fn apply(&mut self, action: &BookshelfAction) {
        match action {
            BookshelfAction::UpdateName { name } => self.name = name.clone(),
        }
    }

    fn actions(&self) -> &ActionLog<BookshelfAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<BookshelfAction> {
        &mut self.actions
    }
}

impl Bookshelf {
    /// Creates a user-named standard shelf.
    pub fn create(user_id: UserId, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self::with_type(user_id, name, BookshelfType::Standard))
    }

    /// The fixed reading-state shelves every user starts with.
    pub fn defaults_for(user_id: UserId) -> Vec<Self> {
        [
            (BookshelfType::ToRead, "To read"),
            (BookshelfType::Reading, "Currently reading"),
            (BookshelfType::Read, "Read"),
        ]
        .into_iter()
        .map(|(bookshelf_type, name)| Self::with_type(user_id, name.to_string(), bookshelf_type))
        .collect()
    }

    fn with_type(user_id: UserId, name: String, bookshelf_type: BookshelfType) -> Self {
        Self {
            id: BookshelfId::new(),
            user_id,
            name,
            bookshelf_type,
            created_at: Utc::now(),
            actions: ActionLog::default(),
        }
    }

    fn validate_name(name: &str) -> Result<()> {
        validation::text(ENTITY, "name", name, 1..=64)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bookshelf_type(&self) -> BookshelfType {
        self.bookshelf_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True for shelves the user created and may rename or delete.
    pub fn is_standard(&self) -> bool {
        self.bookshelf_type == BookshelfType::Standard
    }

    pub fn update_name(&mut self, name: impl Into<String>) -> Result<()> {
        if !self.is_standard() {
            return Err(DomainError::operation_not_valid(format!(
                "{} bookshelf {} cannot be renamed",
                self.bookshelf_type, self.id
            )));
        }
        let name = name.into();
        Self::validate_name(&name)?;
        record(self, BookshelfAction::UpdateName { name });
        Ok(())
    }
}

pub struct BookshelfMapper;

impl Mapper for BookshelfMapper {
    type Entity = Bookshelf;

    const TABLE: &'static str = "bookshelves";

    fn map_to_domain(row: &Row) -> Result<Bookshelf> {
        let err = mapping_error::<Self>;

        Ok(Bookshelf {
            id: BookshelfId::from(row_uuid::<Self>(row, "id")?),
            user_id: UserId::from(row_uuid::<Self>(row, "user_id")?),
            name: row.text("name").map_err(err)?,
            bookshelf_type: parse_text::<Self, _>(row, "bookshelf_type")?,
            created_at: row.timestamp("created_at").map_err(err)?,
            actions: ActionLog::default(),
        })
    }

    fn map_to_persistence(shelf: &Bookshelf) -> Row {
        Row::new()
            .with("id", shelf.id.as_uuid())
            .with("user_id", shelf.user_id.as_uuid())
            .with("name", shelf.name.as_str())
            .with("bookshelf_type", shelf.bookshelf_type.as_str())
            .with("created_at", shelf.created_at)
    }
}

impl ActionTranslator for BookshelfMapper {
    fn action_statements(id: BookshelfId, action: &BookshelfAction) -> Vec<Statement> {
        match action {
            BookshelfAction::UpdateName { name } => {
                vec![set_column::<Self>(id, "name", name.as_str())]
            }
        }
    }
}
