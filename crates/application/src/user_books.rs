//! Service for the books in a user's personal library.

use std::sync::Arc;

use common::{BookshelfId, CollectionId, UserBookId, UserId};
use domain::{
    BookMapper, BookshelfMapper, CollectionMapper, DomainError, NewUserBook, Patch, RelationDelta,
    Repository, Result, UserBook, UserBookMapper, UserBookStatus,
};
use serde::Deserialize;
use store::{Filter, RowStore};

use crate::access::{AccessControl, Caller, Requirement};
use crate::pagination::{Page, Paginated};

/// Command to edit a user book; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserBook {
    #[serde(default)]
    pub status: Patch<UserBookStatus>,
    #[serde(default)]
    pub is_favorite: Patch<bool>,
    #[serde(default)]
    pub bookshelf_id: Patch<BookshelfId>,
    #[serde(default)]
    pub image_url: Patch<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct FindUserBooks {
    pub bookshelf_id: Option<BookshelfId>,
    pub status: Option<UserBookStatus>,
    pub is_favorite: Option<bool>,
    pub page: Page,
}

impl FindUserBooks {
    fn filters(&self, user_id: UserId) -> Vec<Filter> {
        let mut filters = vec![Filter::eq("user_id", user_id.as_uuid())];
        if let Some(bookshelf_id) = self.bookshelf_id {
            filters.push(Filter::eq("bookshelf_id", bookshelf_id.as_uuid()));
        }
        if let Some(status) = self.status {
            filters.push(Filter::eq("status", status.as_str()));
        }
        if let Some(is_favorite) = self.is_favorite {
            filters.push(Filter::eq("is_favorite", is_favorite));
        }
        filters
    }
}

/// Service for managing user books.
///
/// A user book always sits on one of its owner's shelves and may only join
/// its owner's collections.
pub struct UserBookService<S: RowStore> {
    user_books: Repository<S, UserBookMapper>,
    books: Repository<S, BookMapper>,
    bookshelves: Repository<S, BookshelfMapper>,
    collections: Repository<S, CollectionMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore + Clone> UserBookService<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            user_books: Repository::new(store.clone()),
            books: Repository::new(store.clone()),
            bookshelves: Repository::new(store.clone()),
            collections: Repository::new(store),
            access,
        }
    }

    async fn load_owned(&self, caller: &Caller, user_book_id: UserBookId) -> Result<UserBook> {
        let user_book = self.user_books.find_by_id(user_book_id).await?;
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_book.user_id()))?;
        Ok(user_book)
    }

    async fn require_own_bookshelf(
        &self,
        user_id: UserId,
        bookshelf_id: BookshelfId,
    ) -> Result<()> {
        let bookshelf = self.bookshelves.find_by_id(bookshelf_id).await?;
        if bookshelf.user_id() != user_id {
            return Err(DomainError::operation_not_valid(format!(
                "bookshelf {bookshelf_id} belongs to another user"
            )));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn create_user_book(
        &self,
        caller: &Caller,
        user_id: UserId,
        new: NewUserBook,
    ) -> Result<UserBook> {
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;

        self.books.find_by_id(new.book_id).await?;
        self.require_own_bookshelf(user_id, new.bookshelf_id).await?;

        let mut user_book = UserBook::create(user_id, new)?;
        self.user_books.create(&mut user_book).await?;

        Ok(user_book)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn update_user_book(
        &self,
        caller: &Caller,
        user_book_id: UserBookId,
        cmd: UpdateUserBook,
    ) -> Result<UserBook> {
        let mut user_book = self.load_owned(caller, user_book_id).await?;

        if let Patch::Present(status) = cmd.status {
            user_book.update_status(status)?;
        }
        if let Patch::Present(is_favorite) = cmd.is_favorite {
            user_book.update_is_favorite(is_favorite)?;
        }
        if let Patch::Present(bookshelf_id) = cmd.bookshelf_id {
            self.require_own_bookshelf(user_book.user_id(), bookshelf_id).await?;
            user_book.update_bookshelf(bookshelf_id)?;
        }
        if let Patch::Present(image_url) = cmd.image_url {
            user_book.update_image_url(image_url)?;
        }
        self.user_books.save(&mut user_book).await?;

        Ok(user_book)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn update_collections(
        &self,
        caller: &Caller,
        user_book_id: UserBookId,
        delta: RelationDelta<CollectionId>,
    ) -> Result<UserBook> {
        let mut user_book = self.load_owned(caller, user_book_id).await?;

        for collection_id in &delta.added {
            let collection = self.collections.find_by_id(*collection_id).await?;
            if collection.user_id() != user_book.user_id() {
                return Err(DomainError::operation_not_valid(format!(
                    "collection {collection_id} belongs to another user"
                )));
            }
        }

        user_book.update_collections(delta)?;
        self.user_books.save(&mut user_book).await?;

        Ok(user_book)
    }

    /// Deletes a user book with its readings, borrowings, quotes and
    /// collection links.
    #[tracing::instrument(skip(self, caller))]
    pub async fn delete_user_book(&self, caller: &Caller, user_book_id: UserBookId) -> Result<()> {
        self.load_owned(caller, user_book_id).await?;

        let dependents = UserBookMapper::dependents_delete_statements(user_book_id);
        self.user_books.delete_with(user_book_id, dependents).await
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_user_books(
        &self,
        caller: &Caller,
        user_id: UserId,
        query: FindUserBooks,
    ) -> Result<Paginated<UserBook>> {
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;

        let user_books = self.user_books.find_many(query.filters(user_id)).await?;
        Ok(query.page.apply(user_books))
    }
}
