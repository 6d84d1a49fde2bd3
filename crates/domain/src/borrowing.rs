//! A user book lent to someone.

use chrono::NaiveDate;
use common::{BorrowingId, EntityId, UserBookId};
use serde::{Deserialize, Serialize};
use store::{Row, Statement};

use crate::entity::{ActionLog, DomainAction, Entity, record};
use crate::error::{DomainError, Result};
use crate::mapper::{ActionTranslator, Mapper, mapping_error, row_uuid, set_column};
use crate::validation;

const ENTITY: &str = "Borrowing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BorrowingAction {
    UpdateBorrower { borrower: String },
    UpdateStartedAt { started_at: NaiveDate },
    UpdateEndedAt { ended_at: Option<NaiveDate> },
}

impl DomainAction for BorrowingAction {
    fn action_type(&self) -> &'static str {
        match self {
            BorrowingAction::UpdateBorrower { .. } => "UpdateBorrower",
            BorrowingAction::UpdateStartedAt { .. } => "UpdateStartedAt",
            BorrowingAction::UpdateEndedAt { .. } => "UpdateEndedAt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBorrowing {
    pub borrower: String,
    pub started_at: NaiveDate,
    #[serde(default)]
    pub ended_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Borrowing {
    id: BorrowingId,
    user_book_id: UserBookId,
    borrower: String,
    started_at: NaiveDate,
    ended_at: Option<NaiveDate>,

    #[serde(skip)]
    actions: ActionLog<BorrowingAction>,
}

impl Entity for Borrowing {
    type Id = BorrowingId;
    type Action = BorrowingAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> BorrowingId {
        self.id
    }

    fn apply(&mut self, action: &BorrowingAction) {
        match action {
            BorrowingAction::UpdateBorrower { borrower } => self.borrower = borrower.clone(),
            BorrowingAction::UpdateStartedAt { started_at } => self.started_at = *started_at,
            BorrowingAction::UpdateEndedAt { ended_at } => self.ended_at = *ended_at,
        }
    }

    fn actions(&self) -> &ActionLog<BorrowingAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<BorrowingAction> {
        &mut self.actions
    }
}

impl Borrowing {
    pub fn create(user_book_id: UserBookId, new: NewBorrowing) -> Result<Self> {
        Self::validate_borrower(&new.borrower)?;
        Self::validate_period(new.started_at, new.ended_at)?;

        Ok(Self {
            id: BorrowingId::new(),
            user_book_id,
            borrower: new.borrower,
            started_at: new.started_at,
            ended_at: new.ended_at,
            actions: ActionLog::default(),
        })
    }

    fn validate_borrower(borrower: &str) -> Result<()> {
        validation::text(ENTITY, "borrower", borrower, 1..=64)
    }

    fn validate_period(started_at: NaiveDate, ended_at: Option<NaiveDate>) -> Result<()> {
        match ended_at {
            Some(ended_at) if ended_at < started_at => Err(DomainError::input_not_valid(
                ENTITY,
                format!("borrowing cannot end ({ended_at}) before it starts ({started_at})"),
            )),
            _ => Ok(()),
        }
    }

    pub fn user_book_id(&self) -> UserBookId {
        self.user_book_id
    }

    pub fn borrower(&self) -> &str {
        &self.borrower
    }

    pub fn started_at(&self) -> NaiveDate {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<NaiveDate> {
        self.ended_at
    }

    /// True while the book has not been returned.
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn update_borrower(&mut self, borrower: impl Into<String>) -> Result<()> {
        let borrower = borrower.into();
        Self::validate_borrower(&borrower)?;
        record(self, BorrowingAction::UpdateBorrower { borrower });
        Ok(())
    }

    pub fn update_started_at(&mut self, started_at: NaiveDate) -> Result<()> {
        Self::validate_period(started_at, self.ended_at)?;
        record(self, BorrowingAction::UpdateStartedAt { started_at });
        Ok(())
    }

    /// Sets the return date, or clears it to mark the book as still lent.
    pub fn update_ended_at(&mut self, ended_at: Option<NaiveDate>) -> Result<()> {
        Self::validate_period(self.started_at, ended_at)?;
        record(self, BorrowingAction::UpdateEndedAt { ended_at });
        Ok(())
    }
}

pub struct BorrowingMapper;

impl Mapper for BorrowingMapper {
    type Entity = Borrowing;

    const TABLE: &'static str = "borrowings";

    fn map_to_domain(row: &Row) -> Result<Borrowing> {
        let err = mapping_error::<Self>;

        Ok(Borrowing {
            id: BorrowingId::from(row_uuid::<Self>(row, "id")?),
            user_book_id: UserBookId::from(row_uuid::<Self>(row, "user_book_id")?),
            borrower: row.text("borrower").map_err(err)?,
            started_at: row.date("started_at").map_err(err)?,
            ended_at: row.opt_date("ended_at").map_err(err)?,
            actions: ActionLog::default(),
        })
    }

    fn map_to_persistence(borrowing: &Borrowing) -> Row {
        Row::new()
            .with("id", borrowing.id.as_uuid())
            .with("user_book_id", borrowing.user_book_id.as_uuid())
            .with("borrower", borrowing.borrower.as_str())
            .with("started_at", borrowing.started_at)
            .with("ended_at", borrowing.ended_at)
    }
}

impl ActionTranslator for BorrowingMapper {
    fn action_statements(id: BorrowingId, action: &BorrowingAction) -> Vec<Statement> {
        vec![match action {
            BorrowingAction::UpdateBorrower { borrower } => {
                set_column::<Self>(id, "borrower", borrower.as_str())
            }
            BorrowingAction::UpdateStartedAt { started_at } => {
                set_column::<Self>(id, "started_at", *started_at)
            }
            BorrowingAction::UpdateEndedAt { ended_at } => {
                set_column::<Self>(id, "ended_at", *ended_at)
            }
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lent() -> Borrowing {
        Borrowing::create(
            UserBookId::new(),
            NewBorrowing {
                borrower: "Jessica".to_string(),
                started_at: date(2024, 5, 10),
                ended_at: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn returning_the_book_ends_the_borrowing() {
        let mut borrowing = lent();
        assert!(borrowing.is_active());

        borrowing.update_ended_at(Some(date(2024, 6, 1))).unwrap();

        assert!(!borrowing.is_active());
    }

    #[test]
    fn return_date_before_start_is_rejected() {
        let mut borrowing = lent();
        assert!(borrowing.update_ended_at(Some(date(2024, 5, 9))).is_err());
        assert!(!borrowing.has_pending_actions());
    }

    #[test]
    fn start_cannot_move_past_return_date() {
        let mut borrowing = lent();
        borrowing.update_ended_at(Some(date(2024, 6, 1))).unwrap();
        assert!(borrowing.update_started_at(date(2024, 6, 2)).is_err());
    }
}
