//! Bookshelf service.

use std::sync::Arc;

use common::{BookshelfId, UserId};
use domain::{Bookshelf, BookshelfMapper, DomainError, Repository, Result, UserBookMapper};
use serde::Deserialize;
use store::{Filter, RowStore};

use crate::access::{AccessControl, Caller, Requirement};

/// Command to create or rename a standard bookshelf.
#[derive(Debug, Clone, Deserialize)]
pub struct BookshelfName {
    pub name: String,
}

/// Service for managing a user's bookshelves.
///
/// The reading-state shelves created at registration can be neither renamed
/// nor deleted.
pub struct BookshelfService<S: RowStore> {
    bookshelves: Repository<S, BookshelfMapper>,
    user_books: Repository<S, UserBookMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore + Clone> BookshelfService<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            bookshelves: Repository::new(store.clone()),
            user_books: Repository::new(store),
            access,
        }
    }

    /// Loads a shelf and checks the caller may act on it.
    async fn load_owned(&self, caller: &Caller, bookshelf_id: BookshelfId) -> Result<Bookshelf> {
        let bookshelf = self.bookshelves.find_by_id(bookshelf_id).await?;
        self.access.check(caller, &Requirement::OwnerOrAdmin(bookshelf.user_id()))?;
        Ok(bookshelf)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn create_bookshelf(
        &self,
        caller: &Caller,
        user_id: UserId,
        cmd: BookshelfName,
    ) -> Result<Bookshelf> {
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;

        let mut bookshelf = Bookshelf::create(user_id, cmd.name)?;
        self.bookshelves.create(&mut bookshelf).await?;

        Ok(bookshelf)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn rename_bookshelf(
        &self,
        caller: &Caller,
        bookshelf_id: BookshelfId,
        cmd: BookshelfName,
    ) -> Result<Bookshelf> {
        let mut bookshelf = self.load_owned(caller, bookshelf_id).await?;
        bookshelf.update_name(cmd.name)?;
        self.bookshelves.save(&mut bookshelf).await?;

        Ok(bookshelf)
    }

    /// Deletes an empty standard shelf.
    #[tracing::instrument(skip(self, caller))]
    pub async fn delete_bookshelf(&self, caller: &Caller, bookshelf_id: BookshelfId) -> Result<()> {
        let bookshelf = self.load_owned(caller, bookshelf_id).await?;
        if !bookshelf.is_standard() {
            return Err(DomainError::operation_not_valid(format!(
                "{} bookshelves cannot be deleted",
                bookshelf.bookshelf_type()
            )));
        }

        let shelved = self
            .user_books
            .find_many(vec![Filter::eq("bookshelf_id", bookshelf_id.as_uuid())])
            .await?;
        if !shelved.is_empty() {
            return Err(DomainError::operation_not_valid(format!(
                "bookshelf {bookshelf_id} still holds {} books",
                shelved.len()
            )));
        }

        self.bookshelves.delete(bookshelf_id).await
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_user_bookshelves(
        &self,
        caller: &Caller,
        user_id: UserId,
    ) -> Result<Vec<Bookshelf>> {
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;
        self.bookshelves.find_many(vec![Filter::eq("user_id", user_id.as_uuid())]).await
    }
}
