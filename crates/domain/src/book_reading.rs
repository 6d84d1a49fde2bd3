//! A finished reading of a user book, with rating and review.

use chrono::NaiveDate;
use common::{BookReadingId, EntityId, UserBookId};
use serde::{Deserialize, Serialize};
use store::{Filter, Row, Statement};

use crate::entity::{ActionLog, DomainAction, Entity, record};
use crate::error::{DomainError, Result};
use crate::mapper::{ActionTranslator, Mapper, mapping_error, row_uuid, set_column};
use crate::validation;

const ENTITY: &str = "BookReading";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BookReadingAction {
    UpdateRating {
        rating: i32,
    },
    UpdateComment {
        comment: Option<String>,
    },
    UpdateDates {
        started_at: NaiveDate,
        ended_at: NaiveDate,
    },
}

impl DomainAction for BookReadingAction {
    fn action_type(&self) -> &'static str {
        match self {
            BookReadingAction::UpdateRating { .. } => "UpdateRating",
            BookReadingAction::UpdateComment { .. } => "UpdateComment",
            BookReadingAction::UpdateDates { .. } => "UpdateDates",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBookReading {
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    pub started_at: NaiveDate,
    pub ended_at: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookReading {
    id: BookReadingId,
    user_book_id: UserBookId,
    rating: i32,
    comment: Option<String>,
    started_at: NaiveDate,
    ended_at: NaiveDate,

    #[serde(skip)]
    actions: ActionLog<BookReadingAction>,
}

impl Entity for BookReading {
    type Id = BookReadingId;
    type Action = BookReadingAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> BookReadingId {
        self.id
    }

    fn apply(&mut self, action: &BookReadingAction) {
        match action {
            BookReadingAction::UpdateRating { rating } => self.rating = *rating,
            BookReadingAction::UpdateComment { comment } => self.comment = comment.clone(),
            BookReadingAction::UpdateDates {
                started_at,
                ended_at,
            } => {
                self.started_at = *started_at;
                self.ended_at = *ended_at;
            }
        }
    }

    fn actions(&self) -> &ActionLog<BookReadingAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<BookReadingAction> {
        &mut self.actions
    }
}

impl BookReading {
    pub fn create(user_book_id: UserBookId, new: NewBookReading) -> Result<Self> {
        Self::validate_rating(new.rating)?;
        Self::validate_comment(new.comment.as_deref())?;
        Self::validate_dates(new.started_at, new.ended_at)?;

        Ok(Self {
            id: BookReadingId::new(),
            user_book_id,
            rating: new.rating,
            comment: new.comment,
            started_at: new.started_at,
            ended_at: new.ended_at,
            actions: ActionLog::default(),
        })
    }

    fn validate_rating(rating: i32) -> Result<()> {
        validation::number(ENTITY, "rating", rating, 1..=10)
    }

    fn validate_comment(comment: Option<&str>) -> Result<()> {
        comment.map_or(Ok(()), |c| validation::text(ENTITY, "comment", c, 0..=1000))
    }

    fn validate_dates(started_at: NaiveDate, ended_at: NaiveDate) -> Result<()> {
        if started_at > ended_at {
            return Err(DomainError::input_not_valid(
                ENTITY,
                format!("reading cannot end ({ended_at}) before it starts ({started_at})"),
            ));
        }
        Ok(())
    }

    pub fn user_book_id(&self) -> UserBookId {
        self.user_book_id
    }

    pub fn rating(&self) -> i32 {
        self.rating
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn started_at(&self) -> NaiveDate {
        self.started_at
    }

    pub fn ended_at(&self) -> NaiveDate {
        self.ended_at
    }

    pub fn update_rating(&mut self, rating: i32) -> Result<()> {
        Self::validate_rating(rating)?;
        record(self, BookReadingAction::UpdateRating { rating });
        Ok(())
    }

    pub fn update_comment(&mut self, comment: Option<String>) -> Result<()> {
        Self::validate_comment(comment.as_deref())?;
        record(self, BookReadingAction::UpdateComment { comment });
        Ok(())
    }

    /// Both dates change together so the ordering rule is checked once.
    pub fn update_dates(&mut self, started_at: NaiveDate, ended_at: NaiveDate) -> Result<()> {
        Self::validate_dates(started_at, ended_at)?;
        record(
            self,
            BookReadingAction::UpdateDates {
                started_at,
                ended_at,
            },
        );
        Ok(())
    }
}

pub struct BookReadingMapper;

impl Mapper for BookReadingMapper {
    type Entity = BookReading;

    const TABLE: &'static str = "book_readings";

    fn map_to_domain(row: &Row) -> Result<BookReading> {
        let err = mapping_error::<Self>;

        Ok(BookReading {
            id: BookReadingId::from(row_uuid::<Self>(row, "id")?),
            user_book_id: UserBookId::from(row_uuid::<Self>(row, "user_book_id")?),
            rating: row.int32("rating").map_err(err)?,
            comment: row.opt_text("comment").map_err(err)?,
            started_at: row.date("started_at").map_err(err)?,
            ended_at: row.date("ended_at").map_err(err)?,
            actions: ActionLog::default(),
        })
    }

    fn map_to_persistence(reading: &BookReading) -> Row {
        Row::new()
            .with("id", reading.id.as_uuid())
            .with("user_book_id", reading.user_book_id.as_uuid())
            .with("rating", reading.rating)
            .with("comment", reading.comment.clone())
            .with("started_at", reading.started_at)
            .with("ended_at", reading.ended_at)
    }
}

impl ActionTranslator for BookReadingMapper {
    fn action_statements(id: BookReadingId, action: &BookReadingAction) -> Vec<Statement> {
        vec![match action {
            BookReadingAction::UpdateRating { rating } => set_column::<Self>(id, "rating", *rating),
            BookReadingAction::UpdateComment { comment } => {
                set_column::<Self>(id, "comment", comment.clone())
            }
            BookReadingAction::UpdateDates {
                started_at,
                ended_at,
            } => Statement::update(
                Self::TABLE,
                vec![Filter::eq(Self::PRIMARY_KEY, id.as_uuid())],
                Row::new()
                    .with("started_at", *started_at)
                    .with("ended_at", *ended_at),
            ),
        }]
    }
}
