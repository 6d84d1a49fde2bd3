//! Constraint set mirroring the PostgreSQL migrations.

use store::{InMemoryRowStore, UniqueConstraint};

use crate::author::AuthorMapper;
use crate::book::{BOOKS_AUTHORS, BOOKS_GENRES, BookMapper};
use crate::book_reading::BookReadingMapper;
use crate::bookshelf::BookshelfMapper;
use crate::borrowing::BorrowingMapper;
use crate::change_request::BookChangeRequestMapper;
use crate::collection::CollectionMapper;
use crate::dictionary::{CategoryMapper, GenreMapper};
use crate::mapper::Mapper;
use crate::quote::QuoteMapper;
use crate::user::UserMapper;
use crate::user_book::{USER_BOOKS_COLLECTIONS, UserBookMapper};

/// Returns an empty in-memory store enforcing the same uniqueness rules as
/// the relational schema, under the same constraint names.
pub fn in_memory_store() -> InMemoryRowStore {
    let primary_keys = [
        ("books_pkey", BookMapper::TABLE),
        ("authors_pkey", AuthorMapper::TABLE),
        ("genres_pkey", GenreMapper::TABLE),
        ("categories_pkey", CategoryMapper::TABLE),
        ("book_change_requests_pkey", BookChangeRequestMapper::TABLE),
        ("users_pkey", UserMapper::TABLE),
        ("bookshelves_pkey", BookshelfMapper::TABLE),
        ("collections_pkey", CollectionMapper::TABLE),
        ("user_books_pkey", UserBookMapper::TABLE),
        ("book_readings_pkey", BookReadingMapper::TABLE),
        ("borrowings_pkey", BorrowingMapper::TABLE),
        ("quotes_pkey", QuoteMapper::TABLE),
    ];

    primary_keys
        .into_iter()
        .fold(InMemoryRowStore::new(), |store, (name, table)| {
            store.with_unique_constraint(UniqueConstraint::new(name, table, vec!["id"]))
        })
        .with_unique_constraint(UniqueConstraint::new(
            "genres_name_key",
            GenreMapper::TABLE,
            vec!["name"],
        ))
        .with_unique_constraint(UniqueConstraint::new(
            "categories_name_key",
            CategoryMapper::TABLE,
            vec!["name"],
        ))
        .with_unique_constraint(UniqueConstraint::new(
            "users_email_key",
            UserMapper::TABLE,
            vec!["email"],
        ))
        .with_unique_constraint(UniqueConstraint::new(
            "books_authors_pkey",
            BOOKS_AUTHORS,
            vec!["book_id", "author_id"],
        ))
        .with_unique_constraint(UniqueConstraint::new(
            "books_genres_pkey",
            BOOKS_GENRES,
            vec!["book_id", "genre_id"],
        ))
        .with_unique_constraint(UniqueConstraint::new(
            "user_books_collections_pkey",
            USER_BOOKS_COLLECTIONS,
            vec!["user_book_id", "collection_id"],
        ))
}
