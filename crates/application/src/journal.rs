//! Readings, borrowings and quotes recorded against a user book.
//!
//! Every record inherits its access rule from the user book it belongs to.

use std::sync::Arc;

use chrono::NaiveDate;
use common::{BookReadingId, BorrowingId, QuoteId, UserBookId};
use domain::{
    BookReading, BookReadingMapper, Borrowing, BorrowingMapper, NewBookReading, NewBorrowing,
    NewQuote, Patch, Quote, QuoteMapper, Repository, Result, UserBookMapper,
};
use serde::Deserialize;
use store::{Filter, RowStore};

use crate::access::{AccessControl, Caller, Requirement};

/// Checks callers against the owner of a user book.
struct UserBookOwnership<S: RowStore> {
    user_books: Repository<S, UserBookMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> UserBookOwnership<S> {
    async fn check(&self, caller: &Caller, user_book_id: UserBookId) -> Result<()> {
        let user_book = self.user_books.find_by_id(user_book_id).await?;
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_book.user_id()))?;
        Ok(())
    }
}

fn by_user_book(user_book_id: UserBookId) -> Vec<Filter> {
    vec![Filter::eq("user_book_id", user_book_id.as_uuid())]
}

// Book readings

/// Command to edit a reading; absent fields are left untouched.
///
/// A single present date is paired with the other current date before the
/// ordering rule is checked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBookReading {
    #[serde(default)]
    pub rating: Patch<i32>,
    #[serde(default)]
    pub comment: Patch<Option<String>>,
    #[serde(default)]
    pub started_at: Patch<NaiveDate>,
    #[serde(default)]
    pub ended_at: Patch<NaiveDate>,
}

pub struct BookReadingService<S: RowStore> {
    readings: Repository<S, BookReadingMapper>,
    ownership: UserBookOwnership<S>,
}

impl<S: RowStore + Clone> BookReadingService<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            readings: Repository::new(store.clone()),
            ownership: UserBookOwnership {
                user_books: Repository::new(store),
                access,
            },
        }
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn create_book_reading(
        &self,
        caller: &Caller,
        user_book_id: UserBookId,
        new: NewBookReading,
    ) -> Result<BookReading> {
        self.ownership.check(caller, user_book_id).await?;

        let mut reading = BookReading::create(user_book_id, new)?;
        self.readings.create(&mut reading).await?;

        Ok(reading)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn update_book_reading(
        &self,
        caller: &Caller,
        reading_id: BookReadingId,
        cmd: UpdateBookReading,
    ) -> Result<BookReading> {
        let mut reading = self.readings.find_by_id(reading_id).await?;
        self.ownership.check(caller, reading.user_book_id()).await?;

        if let Patch::Present(rating) = cmd.rating {
            reading.update_rating(rating)?;
        }
        if let Patch::Present(comment) = cmd.comment {
            reading.update_comment(comment)?;
        }
        if cmd.started_at.is_present() || cmd.ended_at.is_present() {
            let started_at = cmd.started_at.into_option().unwrap_or(reading.started_at());
            let ended_at = cmd.ended_at.into_option().unwrap_or(reading.ended_at());
            reading.update_dates(started_at, ended_at)?;
        }
        self.readings.save(&mut reading).await?;

        Ok(reading)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn delete_book_reading(
        &self,
        caller: &Caller,
        reading_id: BookReadingId,
    ) -> Result<()> {
        let reading = self.readings.find_by_id(reading_id).await?;
        self.ownership.check(caller, reading.user_book_id()).await?;
        self.readings.delete(reading_id).await
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_by_user_book(
        &self,
        caller: &Caller,
        user_book_id: UserBookId,
    ) -> Result<Vec<BookReading>> {
        self.ownership.check(caller, user_book_id).await?;
        self.readings.find_many(by_user_book(user_book_id)).await
    }
}

// Borrowings

/// Command to edit a borrowing; absent fields are left untouched.
///
/// A present `null` return date marks the book as lent again.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBorrowing {
    #[serde(default)]
    pub borrower: Patch<String>,
    #[serde(default)]
    pub started_at: Patch<NaiveDate>,
    #[serde(default)]
    pub ended_at: Patch<Option<NaiveDate>>,
}

pub struct BorrowingService<S: RowStore> {
    borrowings: Repository<S, BorrowingMapper>,
    ownership: UserBookOwnership<S>,
}

impl<S: RowStore + Clone> BorrowingService<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            borrowings: Repository::new(store.clone()),
            ownership: UserBookOwnership {
                user_books: Repository::new(store),
                access,
            },
        }
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn create_borrowing(
        &self,
        caller: &Caller,
        user_book_id: UserBookId,
        new: NewBorrowing,
    ) -> Result<Borrowing> {
        self.ownership.check(caller, user_book_id).await?;

        let mut borrowing = Borrowing::create(user_book_id, new)?;
        self.borrowings.create(&mut borrowing).await?;

        Ok(borrowing)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn update_borrowing(
        &self,
        caller: &Caller,
        borrowing_id: BorrowingId,
        cmd: UpdateBorrowing,
    ) -> Result<Borrowing> {
        let mut borrowing = self.borrowings.find_by_id(borrowing_id).await?;
        self.ownership.check(caller, borrowing.user_book_id()).await?;

        if let Patch::Present(borrower) = cmd.borrower {
            borrowing.update_borrower(borrower)?;
        }

        // Moving the start later needs the new return date in place first
        let start_moves_later = cmd
            .started_at
            .value()
            .is_some_and(|started_at| *started_at > borrowing.started_at());
        if start_moves_later {
            if let Patch::Present(ended_at) = cmd.ended_at {
                borrowing.update_ended_at(ended_at)?;
            }
            if let Patch::Present(started_at) = cmd.started_at {
                borrowing.update_started_at(started_at)?;
            }
        } else {
            if let Patch::Present(started_at) = cmd.started_at {
                borrowing.update_started_at(started_at)?;
            }
            if let Patch::Present(ended_at) = cmd.ended_at {
                borrowing.update_ended_at(ended_at)?;
            }
        }
        self.borrowings.save(&mut borrowing).await?;

        Ok(borrowing)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn delete_borrowing(&self, caller: &Caller, borrowing_id: BorrowingId) -> Result<()> {
        let borrowing = self.borrowings.find_by_id(borrowing_id).await?;
        self.ownership.check(caller, borrowing.user_book_id()).await?;
        self.borrowings.delete(borrowing_id).await
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_by_user_book(
        &self,
        caller: &Caller,
        user_book_id: UserBookId,
    ) -> Result<Vec<Borrowing>> {
        self.ownership.check(caller, user_book_id).await?;
        self.borrowings.find_many(by_user_book(user_book_id)).await
    }
}

// Quotes

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateQuote {
    #[serde(default)]
    pub content: Patch<String>,
    #[serde(default)]
    pub page: Patch<Option<i32>>,
    #[serde(default)]
    pub is_favorite: Patch<bool>,
}

pub struct QuoteService<S: RowStore> {
    quotes: Repository<S, QuoteMapper>,
    ownership: UserBookOwnership<S>,
}

impl<S: RowStore + Clone> QuoteService<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            quotes: Repository::new(store.clone()),
            ownership: UserBookOwnership {
                user_books: Repository::new(store),
                access,
            },
        }
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn create_quote(
        &self,
        caller: &Caller,
        user_book_id: UserBookId,
        new: NewQuote,
    ) -> Result<Quote> {
        self.ownership.check(caller, user_book_id).await?;

        let mut quote = Quote::create(user_book_id, new)?;
        self.quotes.create(&mut quote).await?;

        Ok(quote)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn update_quote(
        &self,
        caller: &Caller,
        quote_id: QuoteId,
        cmd: UpdateQuote,
    ) -> Result<Quote> {
        let mut quote = self.quotes.find_by_id(quote_id).await?;
        self.ownership.check(caller, quote.user_book_id()).await?;

        if let Patch::Present(content) = cmd.content {
            quote.update_content(content)?;
        }
        if let Patch::Present(page) = cmd.page {
            quote.update_page(page)?;
        }
        if let Patch::Present(is_favorite) = cmd.is_favorite {
            quote.update_is_favorite(is_favorite)?;
        }
        self.quotes.save(&mut quote).await?;

        Ok(quote)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn delete_quote(&self, caller: &Caller, quote_id: QuoteId) -> Result<()> {
        let quote = self.quotes.find_by_id(quote_id).await?;
        self.ownership.check(caller, quote.user_book_id()).await?;
        self.quotes.delete(quote_id).await
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_by_user_book(
        &self,
        caller: &Caller,
        user_book_id: UserBookId,
    ) -> Result<Vec<Quote>> {
        self.ownership.check(caller, user_book_id).await?;
        self.quotes.find_many(by_user_book(user_book_id)).await
    }
}
