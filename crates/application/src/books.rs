//! Book catalogue commands and queries.

use std::sync::Arc;

use async_trait::async_trait;
use common::{BookId, CategoryId, GenreId};
use domain::{
    AuthorMapper, Book, BookChanges, BookMapper, CategoryMapper, ChangeRequestMerger, Entity,
    GenreMapper, NewBook, Patch, RelationDelta, Repository, Result, UserBookMapper,
};
use serde::Deserialize;
use store::{Filter, RowStore};

use crate::access::{AccessControl, Caller, Requirement};
use crate::handler::{CommandHandler, QueryHandler};
use crate::lookup::require_all;
use crate::pagination::{Page, Paginated};

// Commands

/// Command to add a book to the catalogue.
///
/// Books created by administrators are approved immediately; anyone else's
/// book waits for moderation.
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub book: NewBook,
}

impl CreateBook {
    pub fn new(book: NewBook) -> Self {
        Self { book }
    }
}

/// Command to edit a book directly, bypassing moderation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    #[serde(skip)]
    pub book_id: BookId,

    /// Sparse scalar and author changes.
    #[serde(default)]
    pub changes: BookChanges,

    #[serde(default)]
    pub category_id: Patch<CategoryId>,

    /// Genres to add and remove.
    #[serde(default)]
    pub genres: Patch<RelationDelta<GenreId>>,
}

impl UpdateBook {
    pub fn new(book_id: BookId, changes: BookChanges) -> Self {
        Self {
            book_id,
            changes,
            ..Default::default()
        }
    }
}

/// Command to set a book's approval flag.
#[derive(Debug, Clone, Copy)]
pub struct ApproveBook {
    pub book_id: BookId,
    pub is_approved: bool,
}

impl ApproveBook {
    pub fn new(book_id: BookId, is_approved: bool) -> Self {
        Self {
            book_id,
            is_approved,
        }
    }
}

/// Command to remove a book and its author and genre links.
#[derive(Debug, Clone, Copy)]
pub struct DeleteBook {
    pub book_id: BookId,
}

impl DeleteBook {
    pub fn new(book_id: BookId) -> Self {
        Self { book_id }
    }
}

// Queries

#[derive(Debug, Clone, Copy)]
pub struct FindBookById {
    pub book_id: BookId,
}

impl FindBookById {
    pub fn new(book_id: BookId) -> Self {
        Self { book_id }
    }
}

/// Lists books matching every given criterion, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct FindBooks {
    pub category_id: Option<CategoryId>,
    pub is_approved: Option<bool>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    pub page: Page,
}

impl FindBooks {
    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(category_id) = self.category_id {
            filters.push(Filter::eq("category_id", category_id.as_uuid()));
        }
        if let Some(is_approved) = self.is_approved {
            filters.push(Filter::eq("is_approved", is_approved));
        }
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            filters.push(Filter::contains("title", title.trim()));
        }
        filters
    }
}

// Handlers

pub struct CreateBookCommandHandler<S: RowStore> {
    books: Repository<S, BookMapper>,
    authors: Repository<S, AuthorMapper>,
    genres: Repository<S, GenreMapper>,
    categories: Repository<S, CategoryMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore + Clone> CreateBookCommandHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            books: Repository::new(store.clone()),
            authors: Repository::new(store.clone()),
            genres: Repository::new(store.clone()),
            categories: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore + Clone> CommandHandler<CreateBook> for CreateBookCommandHandler<S> {
    type Output = Book;

    #[tracing::instrument(skip(self, caller, command), fields(title = %command.book.title))]
    async fn execute(&self, caller: &Caller, command: CreateBook) -> Result<Book> {
        let identity = self.access.check(caller, &Requirement::Authenticated)?;
        let is_admin = identity.is_admin();

        self.categories.find_by_id(command.book.category_id).await?;
        require_all(&self.authors, command.book.author_ids.iter().copied().collect()).await?;
        require_all(&self.genres, command.book.genre_ids.iter().copied().collect()).await?;

        let mut book = Book::create(command.book)?;
        if is_admin {
            book.update_approval(true)?;
        }
        self.books.create(&mut book).await?;

        tracing::info!(book_id = %book.id(), approved = book.is_approved(), "book created");
        Ok(book)
    }
}

pub struct UpdateBookCommandHandler<S: RowStore> {
    books: Repository<S, BookMapper>,
    authors: Repository<S, AuthorMapper>,
    genres: Repository<S, GenreMapper>,
    categories: Repository<S, CategoryMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore + Clone> UpdateBookCommandHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            books: Repository::new(store.clone()),
            authors: Repository::new(store.clone()),
            genres: Repository::new(store.clone()),
            categories: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore + Clone> CommandHandler<UpdateBook> for UpdateBookCommandHandler<S> {
    type Output = Book;

    #[tracing::instrument(skip(self, caller, command), fields(book_id = %command.book_id))]
    async fn execute(&self, caller: &Caller, command: UpdateBook) -> Result<Book> {
        self.access.check(caller, &Requirement::Admin)?;

        let mut book = self.books.find_by_id(command.book_id).await?;

        if let Patch::Present(author_ids) = &command.changes.author_ids {
            let added = author_ids.difference(book.authors()).copied().collect();
            require_all(&self.authors, added).await?;
        }
        let outcome = ChangeRequestMerger::apply_changes(&mut book, &command.changes)?;

        if let Patch::Present(category_id) = command.category_id {
            self.categories.find_by_id(category_id).await?;
            book.update_category(category_id)?;
        }
        if let Patch::Present(delta) = command.genres {
            require_all(&self.genres, delta.added.iter().copied().collect()).await?;
            book.update_genres(delta)?;
        }

        self.books.save(&mut book).await?;

        tracing::info!(fields = ?outcome.fields, "book updated");
        Ok(book)
    }
}

pub struct ApproveBookCommandHandler<S: RowStore> {
    books: Repository<S, BookMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> ApproveBookCommandHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            books: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore> CommandHandler<ApproveBook> for ApproveBookCommandHandler<S> {
    type Output = Book;

    #[tracing::instrument(skip(self, caller))]
    async fn execute(&self, caller: &Caller, command: ApproveBook) -> Result<Book> {
        self.access.check(caller, &Requirement::Admin)?;

        let mut book = self.books.find_by_id(command.book_id).await?;
        book.update_approval(command.is_approved)?;
        self.books.save(&mut book).await?;

        Ok(book)
    }
}

/// Deletes a book together with every user book shelving it and the
/// records kept against those user books, in one batch.
pub struct DeleteBookCommandHandler<S: RowStore> {
    books: Repository<S, BookMapper>,
    user_books: Repository<S, UserBookMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore + Clone> DeleteBookCommandHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            books: Repository::new(store.clone()),
            user_books: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore> CommandHandler<DeleteBook> for DeleteBookCommandHandler<S> {
    type Output = ();

    #[tracing::instrument(skip(self, caller))]
    async fn execute(&self, caller: &Caller, command: DeleteBook) -> Result<()> {
        self.access.check(caller, &Requirement::Admin)?;

        let shelved = self
            .user_books
            .find_many(vec![Filter::eq("book_id", command.book_id.as_uuid())])
            .await?;
        let mut dependents = Vec::new();
        for user_book in &shelved {
            dependents.extend(UserBookMapper::dependents_delete_statements(user_book.id()));
            dependents.extend(self.user_books.delete_statements(user_book.id()));
        }
        self.books.delete_with(command.book_id, dependents).await?;

        tracing::info!(book_id = %command.book_id, user_books = shelved.len(), "book deleted");
        Ok(())
    }
}

pub struct FindBookByIdQueryHandler<S: RowStore> {
    books: Repository<S, BookMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> FindBookByIdQueryHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            books: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore> QueryHandler<FindBookById> for FindBookByIdQueryHandler<S> {
    type Output = Book;

    #[tracing::instrument(skip(self, caller))]
    async fn execute(&self, caller: &Caller, query: FindBookById) -> Result<Book> {
        self.access.check(caller, &Requirement::Authenticated)?;
        self.books.find_by_id(query.book_id).await
    }
}

pub struct FindBooksQueryHandler<S: RowStore> {
    books: Repository<S, BookMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> FindBooksQueryHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            books: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore> QueryHandler<FindBooks> for FindBooksQueryHandler<S> {
    type Output = Paginated<Book>;

    #[tracing::instrument(skip(self, caller))]
    async fn execute(&self, caller: &Caller, query: FindBooks) -> Result<Paginated<Book>> {
        self.access.check(caller, &Requirement::Authenticated)?;

        let books = self.books.find_many(query.filters()).await?;
        Ok(query.page.apply(books))
    }
}
