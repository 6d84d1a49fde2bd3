//! Book aggregate and related types.

mod actions;
mod mapper;

pub use actions::BookAction;
pub use mapper::BookMapper;
pub(crate) use mapper::{BOOKS_AUTHORS, BOOKS_GENRES};

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::{AuthorId, BookId, CategoryId, GenreId};
use serde::{Deserialize, Serialize};

use crate::entity::{ActionLog, Entity, RelationDelta, record};
use crate::error::{DomainError, Result};
use crate::validation;
use crate::value_objects::BookFormat;

const ENTITY: &str = "Book";

/// Input for creating a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publisher: String,
    pub release_year: i32,
    pub language: String,
    #[serde(default)]
    pub translator: String,
    pub format: BookFormat,
    pub pages: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub author_ids: BTreeSet<AuthorId>,
    #[serde(default)]
    pub genre_ids: BTreeSet<GenreId>,
}

/// Book aggregate root.
///
/// Canonical catalogue record. Every change goes through a mutator that
/// validates, updates the fields and queues one [`BookAction`].
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    id: BookId,
    title: String,
    isbn: String,
    publisher: String,
    release_year: i32,
    language: String,
    translator: String,
    format: BookFormat,
    pages: i32,
    image_url: Option<String>,
    category_id: CategoryId,
    is_approved: bool,
    created_at: DateTime<Utc>,
    authors: BTreeSet<AuthorId>,
    genres: BTreeSet<GenreId>,

    #[serde(skip)]
    actions: ActionLog<BookAction>,
}

impl Entity for Book {
    type Id = BookId;
    type Action = BookAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> BookId {
        self.id
    }

    fn apply(&mut self, action: &BookAction) {
        match action {
            BookAction::UpdateTitle { title } => self.title = title.clone(),
            BookAction::UpdateIsbn { isbn } => self.isbn = isbn.clone(),
            BookAction::UpdatePublisher { publisher } => self.publisher = publisher.clone(),
            BookAction::UpdateReleaseYear { release_year } => self.release_year = *release_year,
            BookAction::UpdateLanguage { language } => self.language = language.clone(),
            BookAction::UpdateTranslator { translator } => self.translator = translator.clone(),
            BookAction::UpdateFormat { format } => self.format = *format,
            BookAction::UpdatePages { pages } => self.pages = *pages,
            BookAction::UpdateImageUrl { image_url } => self.image_url = image_url.clone(),
            BookAction::UpdateCategory { category_id } => self.category_id = *category_id,
            BookAction::UpdateApproval { is_approved } => self.is_approved = *is_approved,
            BookAction::AddAuthor { author_id } => {
                self.authors.insert(*author_id);
            }
            BookAction::DeleteAuthor { author_id } => {
                self.authors.remove(author_id);
            }
            BookAction::UpdateBookGenres(delta) => delta.apply_to(&mut self.genres),
        }
    }

    fn actions(&self) -> &ActionLog<BookAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<BookAction> {
        &mut self.actions
    }
}

// Field rules
impl Book {
    fn validate_title(title: &str) -> Result<()> {
        validation::text(ENTITY, "title", title, 1..=128)
    }

    fn validate_isbn(isbn: &str) -> Result<()> {
        validation::text(ENTITY, "isbn", isbn, 0..=64)
    }

    fn validate_publisher(publisher: &str) -> Result<()> {
        validation::text(ENTITY, "publisher", publisher, 0..=128)
    }

    fn validate_language(language: &str) -> Result<()> {
        validation::text(ENTITY, "language", language, 1..=64)
    }

    fn validate_translator(translator: &str) -> Result<()> {
        validation::text(ENTITY, "translator", translator, 0..=64)
    }

    fn validate_pages(pages: i32) -> Result<()> {
        validation::number(ENTITY, "pages", pages, 0..=20_000)
    }

    fn validate_image_url(image_url: Option<&str>) -> Result<()> {
        match image_url {
            Some(url) => validation::text(ENTITY, "image url", url, 0..=512),
            None => Ok(()),
        }
    }
}

// Construction
impl Book {
    /// Creates a new, unapproved book.
    ///
    /// The book is persisted through `Repository::create`, so no action is
    /// queued here.
    pub fn create(new: NewBook) -> Result<Self> {
        Self::validate_title(&new.title)?;
        Self::validate_isbn(&new.isbn)?;
        Self::validate_publisher(&new.publisher)?;
        validation::release_year(ENTITY, new.release_year)?;
        Self::validate_language(&new.language)?;
        Self::validate_translator(&new.translator)?;
        Self::validate_pages(new.pages)?;
        Self::validate_image_url(new.image_url.as_deref())?;

        Ok(Self {
            id: BookId::new(),
            title: new.title,
            isbn: new.isbn,
            publisher: new.publisher,
            release_year: new.release_year,
            language: new.language,
            translator: new.translator,
            format: new.format,
            pages: new.pages,
            image_url: new.image_url,
            category_id: new.category_id,
            is_approved: false,
            created_at: Utc::now(),
            authors: new.author_ids,
            genres: new.genre_ids,
            actions: ActionLog::default(),
        })
    }
}

// Query methods
impl Book {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn release_year(&self) -> i32 {
        self.release_year
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn translator(&self) -> &str {
        &self.translator
    }

    pub fn format(&self) -> BookFormat {
        self.format
    }

    pub fn pages(&self) -> i32 {
        self.pages
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the author ids in ascending order.
    pub fn authors(&self) -> &BTreeSet<AuthorId> {
        &self.authors
    }

    pub fn genres(&self) -> &BTreeSet<GenreId> {
        &self.genres
    }
}

// Mutators
impl Book {
    pub fn update_title(&mut self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        Self::validate_title(&title)?;
        record(self, BookAction::UpdateTitle { title });
        Ok(())
    }

    pub fn update_isbn(&mut self, isbn: impl Into<String>) -> Result<()> {
        let isbn = isbn.into();
        Self::validate_isbn(&isbn)?;
        record(self, BookAction::UpdateIsbn { isbn });
        Ok(())
    }

    pub fn update_publisher(&mut self, publisher: impl Into<String>) -> Result<()> {
        let publisher = publisher.into();
        Self::validate_publisher(&publisher)?;
        record(self, BookAction::UpdatePublisher { publisher });
        Ok(())
    }

    pub fn update_release_year(&mut self, release_year: i32) -> Result<()> {
        validation::release_year(ENTITY, release_year)?;
        record(self, BookAction::UpdateReleaseYear { release_year });
        Ok(())
    }

    pub fn update_language(&mut self, language: impl Into<String>) -> Result<()> {
        let language = language.into();
        Self::validate_language(&language)?;
        record(self, BookAction::UpdateLanguage { language });
        Ok(())
    }

    pub fn update_translator(&mut self, translator: impl Into<String>) -> Result<()> {
        let translator = translator.into();
        Self::validate_translator(&translator)?;
        record(self, BookAction::UpdateTranslator { translator });
        Ok(())
    }

    pub fn update_format(&mut self, format: BookFormat) -> Result<()> {
        record(self, BookAction::UpdateFormat { format });
        Ok(())
    }

    pub fn update_pages(&mut self, pages: i32) -> Result<()> {
        Self::validate_pages(pages)?;
        record(self, BookAction::UpdatePages { pages });
        Ok(())
    }

    /// Sets or clears the cover image.
    pub fn update_image_url(&mut self, image_url: Option<String>) -> Result<()> {
        Self::validate_image_url(image_url.as_deref())?;
        record(self, BookAction::UpdateImageUrl { image_url });
        Ok(())
    }

    pub fn update_category(&mut self, category_id: CategoryId) -> Result<()> {
        record(self, BookAction::UpdateCategory { category_id });
        Ok(())
    }

    pub fn update_approval(&mut self, is_approved: bool) -> Result<()> {
        record(self, BookAction::UpdateApproval { is_approved });
        Ok(())
    }

    pub fn add_author(&mut self, author_id: AuthorId) -> Result<()> {
        if self.authors.contains(&author_id) {
            return Err(DomainError::operation_not_valid(format!(
                "author {author_id} is already assigned to book {}",
                self.id
            )));
        }
        record(self, BookAction::AddAuthor { author_id });
        Ok(())
    }

    pub fn delete_author(&mut self, author_id: AuthorId) -> Result<()> {
        if !self.authors.contains(&author_id) {
            return Err(DomainError::operation_not_valid(format!(
                "author {author_id} is not assigned to book {}",
                self.id
            )));
        }
        record(self, BookAction::DeleteAuthor { author_id });
        Ok(())
    }

    pub fn update_genres(&mut self, delta: RelationDelta<GenreId>) -> Result<()> {
        delta.validate_against(&self.genres, "genre")?;
        record(self, BookAction::UpdateBookGenres(delta));
        Ok(())
    }
}
