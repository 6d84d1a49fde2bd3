//! Domain layer of the library catalogue.
//!
//! This crate provides the core domain abstractions including:
//! - Entity and DomainAction traits for mutation-tracked aggregates
//! - Mappers translating rows to entities and actions to statements
//! - Repository persisting each entity's action log as one atomic batch
//! - Book change requests and the merger applying them field by field

pub mod author;
pub mod book;
pub mod book_reading;
pub mod bookshelf;
pub mod borrowing;
pub mod change_request;
pub mod collection;
pub mod dictionary;
pub mod entity;
pub mod error;
pub mod mapper;
pub mod patch;
pub mod quote;
pub mod repository;
pub mod schema;
pub mod user;
pub mod user_book;
mod validation;
pub mod value_objects;

pub use author::{Author, AuthorAction, AuthorMapper};
pub use book::{Book, BookAction, BookMapper, NewBook};
pub use book_reading::{BookReading, BookReadingAction, BookReadingMapper, NewBookReading};
pub use bookshelf::{Bookshelf, BookshelfAction, BookshelfMapper};
pub use borrowing::{Borrowing, BorrowingAction, BorrowingMapper, NewBorrowing};
pub use change_request::{
    BookChangeRequest, BookChangeRequestAction, BookChangeRequestMapper, BookChanges,
    ChangeRequestMerger, MergeOutcome,
};
pub use collection::{Collection, CollectionAction, CollectionMapper};
pub use dictionary::{Category, CategoryMapper, Dictionary, DictionaryAction, Genre, GenreMapper};
pub use entity::{ActionLog, DomainAction, Entity, RelationDelta};
pub use error::{DomainError, Result};
pub use mapper::{ActionTranslator, Mapper};
pub use patch::Patch;
pub use quote::{NewQuote, Quote, QuoteAction, QuoteMapper};
pub use repository::Repository;
pub use user::{NewUser, User, UserAction, UserMapper};
pub use user_book::{NewUserBook, UserBook, UserBookAction, UserBookMapper};
pub use value_objects::{BookFormat, BookshelfType, UserBookStatus, UserRole};
