//! Quotes saved from a user book.

use chrono::{DateTime, Utc};
use common::{EntityId, QuoteId, UserBookId};
use serde::{Deserialize, Serialize};
use store::{Row, Statement};

use crate::entity::{ActionLog, DomainAction, Entity, record};
use crate::error::Result;
use crate::mapper::{ActionTranslator, Mapper, mapping_error, row_uuid, set_column};
use crate::validation;

const ENTITY: &str = "Quote";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum QuoteAction {
    UpdateContent { content: String },
    UpdatePage { page: Option<i32> },
    UpdateIsFavorite { is_favorite: bool },
}

impl DomainAction for QuoteAction {
    fn action_type(&self) -> &'static str {
        match self {
            QuoteAction::UpdateContent { .. } => "UpdateContent",
            QuoteAction::UpdatePage { .. } => "UpdatePage",
            QuoteAction::UpdateIsFavorite { .. } => "UpdateIsFavorite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewQuote {
    pub content: String,
    #[serde(default)]
    pub page: Option<i32>,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    id: QuoteId,
    user_book_id: UserBookId,
    content: String,
    page: Option<i32>,
    is_favorite: bool,
    created_at: DateTime<Utc>,

    #[serde(skip)]
    actions: ActionLog<QuoteAction>,
}

impl Entity for Quote {
    type Id = QuoteId;
    type Action = QuoteAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> QuoteId {
        self.id
    }

    fn apply(&mut self, action: &QuoteAction) {
        match action {
            QuoteAction::UpdateContent { content } => self.content = content.clone(),
            QuoteAction::UpdatePage { page } => self.page = *page,
            QuoteAction::UpdateIsFavorite { is_favorite } => self.is_favorite = *is_favorite,
        }
    }

    fn actions(&self) -> &ActionLog<QuoteAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<QuoteAction> {
        &mut self.actions
    }
}

impl Quote {
    pub fn create(user_book_id: UserBookId, new: NewQuote) -> Result<Self> {
        Self::validate_content(&new.content)?;
        Self::validate_page(new.page)?;

        Ok(Self {
            id: QuoteId::new(),
            user_book_id,
            content: new.content,
            page: new.page,
            is_favorite: new.is_favorite,
            created_at: Utc::now(),
            actions: ActionLog::default(),
        })
    }

    fn validate_content(content: &str) -> Result<()> {
        validation::text(ENTITY, "content", content, 1..=1000)
    }

    fn validate_page(page: Option<i32>) -> Result<()> {
        page.map_or(Ok(()), |p| validation::number(ENTITY, "page", p, 1..=i32::MAX))
    }

    pub fn user_book_id(&self) -> UserBookId {
        self.user_book_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn page(&self) -> Option<i32> {
        self.page
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn update_content(&mut self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        Self::validate_content(&content)?;
        record(self, QuoteAction::UpdateContent { content });
        Ok(())
    }

    pub fn update_page(&mut self, page: Option<i32>) -> Result<()> {
        Self::validate_page(page)?;
        record(self, QuoteAction::UpdatePage { page });
        Ok(())
    }

    pub fn update_is_favorite(&mut self, is_favorite: bool) -> Result<()> {
        record(self, QuoteAction::UpdateIsFavorite { is_favorite });
        Ok(())
    }
}

pub struct QuoteMapper;

impl Mapper for QuoteMapper {
    type Entity = Quote;

    const TABLE: &'static str = "quotes";

    fn map_to_domain(row: &Row) -> Result<Quote> {
        let err = mapping_error::<Self>;

        Ok(Quote {
            id: QuoteId::from(row_uuid::<Self>(row, "id")?),
            user_book_id: UserBookId::from(row_uuid::<Self>(row, "user_book_id")?),
            content: row.text("content").map_err(err)?,
            page: row.opt_int32("page").map_err(err)?,
            is_favorite: row.boolean("is_favorite").map_err(err)?,
            created_at: row.timestamp("created_at").map_err(err)?,
            actions: ActionLog::default(),
        })
    }

    fn map_to_persistence(quote: &Quote) -> Row {
        Row::new()
            .with("id", quote.id.as_uuid())
            .with("user_book_id", quote.user_book_id.as_uuid())
            .with("content", quote.content.as_str())
            .with("page", quote.page)
            .with("is_favorite", quote.is_favorite)
            .with("created_at", quote.created_at)
    }
}

impl ActionTranslator for QuoteMapper {
    fn action_statements(id: QuoteId, action: &QuoteAction) -> Vec<Statement> {
        vec![match action {
            QuoteAction::UpdateContent { content } => {
                set_column::<Self>(id, "content", content.as_str())
            }
            QuoteAction::UpdatePage { page } => set_column::<Self>(id, "page", *page),
            QuoteAction::UpdateIsFavorite { is_favorite } => {
                set_column::<Self>(id, "is_favorite", *is_favorite)
            }
        }]
    }
}
