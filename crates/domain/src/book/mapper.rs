//! Persistence mapping for books.

use common::{AuthorId, BookId, CategoryId, EntityId, GenreId};
use store::{Filter, Join, Row, Statement};

use super::{Book, BookAction};
use crate::entity::ActionLog;
use crate::error::Result;
use crate::mapper::{
    ActionTranslator, Mapper, mapping_error, parse_text, relation_statements, row_uuid,
    set_column,
};

pub(crate) const BOOKS_AUTHORS: &str = "books_authors";
pub(crate) const BOOKS_GENRES: &str = "books_genres";

/// Maps the `books` table and its author and genre join tables.
pub struct BookMapper;

impl Mapper for BookMapper {
    type Entity = Book;

    const TABLE: &'static str = "books";

    fn map_to_domain(row: &Row) -> Result<Book> {
        let err = mapping_error::<Self>;

        Ok(Book {
            id: BookId::from(row_uuid::<Self>(row, "id")?),
            title: row.text("title").map_err(err)?,
            isbn: row.text("isbn").map_err(err)?,
            publisher: row.text("publisher").map_err(err)?,
            release_year: row.int32("release_year").map_err(err)?,
            language: row.text("language").map_err(err)?,
            translator: row.text("translator").map_err(err)?,
            format: parse_text::<Self, _>(row, "format")?,
            pages: row.int32("pages").map_err(err)?,
            image_url: row.opt_text("image_url").map_err(err)?,
            category_id: CategoryId::from(row_uuid::<Self>(row, "category_id")?),
            is_approved: row.boolean("is_approved").map_err(err)?,
            created_at: row.timestamp("created_at").map_err(err)?,
            authors: Default::default(),
            genres: Default::default(),
            actions: ActionLog::default(),
        })
    }

    fn joins() -> Vec<Join> {
        vec![
            Join::new(BOOKS_AUTHORS, "book_id", vec!["author_id"]),
            Join::new(BOOKS_GENRES, "book_id", vec!["genre_id"]),
        ]
    }

    fn fold_join_row(book: &mut Book, row: &Row) -> Result<()> {
        let err = mapping_error::<Self>;

        if let Some(author_id) = row.opt_uuid("author_id").map_err(err)? {
            book.authors.insert(AuthorId::from(author_id));
        }
        if let Some(genre_id) = row.opt_uuid("genre_id").map_err(err)? {
            book.genres.insert(GenreId::from(genre_id));
        }
        Ok(())
    }

    fn map_to_persistence(book: &Book) -> Row {
        Row::new()
            .with("id", book.id.as_uuid())
            .with("title", book.title.as_str())
            .with("isbn", book.isbn.as_str())
            .with("publisher", book.publisher.as_str())
            .with("release_year", book.release_year)
            .with("language", book.language.as_str())
            .with("translator", book.translator.as_str())
            .with("format", book.format.as_str())
            .with("pages", book.pages)
            .with("image_url", book.image_url.clone())
            .with("category_id", book.category_id.as_uuid())
            .with("is_approved", book.is_approved)
            .with("created_at", book.created_at)
    }

    fn map_relations_to_persistence(book: &Book) -> Vec<(&'static str, Row)> {
        let authors = book.authors.iter().map(|author_id| {
            (
                BOOKS_AUTHORS,
                Row::new()
                    .with("book_id", book.id.as_uuid())
                    .with("author_id", author_id.as_uuid()),
            )
        });
        let genres = book.genres.iter().map(|genre_id| {
            (
                BOOKS_GENRES,
                Row::new()
                    .with("book_id", book.id.as_uuid())
                    .with("genre_id", genre_id.as_uuid()),
            )
        });
        authors.chain(genres).collect()
    }
}

impl ActionTranslator for BookMapper {
    fn action_statements(id: BookId, action: &BookAction) -> Vec<Statement> {
        let set = |column, value: store::Value| vec![set_column::<Self>(id, column, value)];

        match action {
            BookAction::UpdateTitle { title } => set("title", title.as_str().into()),
            BookAction::UpdateIsbn { isbn } => set("isbn", isbn.as_str().into()),
            BookAction::UpdatePublisher { publisher } => {
                set("publisher", publisher.as_str().into())
            }
            BookAction::UpdateReleaseYear { release_year } => {
                set("release_year", (*release_year).into())
            }
            BookAction::UpdateLanguage { language } => set("language", language.as_str().into()),
            BookAction::UpdateTranslator { translator } => {
                set("translator", translator.as_str().into())
            }
            BookAction::UpdateFormat { format } => set("format", format.as_str().into()),
            BookAction::UpdatePages { pages } => set("pages", (*pages).into()),
            BookAction::UpdateImageUrl { image_url } => set("image_url", image_url.clone().into()),
            BookAction::UpdateCategory { category_id } => {
                set("category_id", category_id.as_uuid().into())
            }
            BookAction::UpdateApproval { is_approved } => set("is_approved", (*is_approved).into()),
            BookAction::AddAuthor { author_id } => vec![Statement::insert(
                BOOKS_AUTHORS,
                Row::new()
                    .with("book_id", id.as_uuid())
                    .with("author_id", author_id.as_uuid()),
            )],
            BookAction::DeleteAuthor { author_id } => vec![Statement::delete(
                BOOKS_AUTHORS,
                vec![
                    Filter::eq("book_id", id.as_uuid()),
                    Filter::eq("author_id", author_id.as_uuid()),
                ],
            )],
            BookAction::UpdateBookGenres(delta) => {
                relation_statements(BOOKS_GENRES, "book_id", id, "genre_id", delta)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::book::NewBook;
    use crate::book::tests::new_book;
    use crate::entity::{Entity, RelationDelta};
    use crate::error::DomainError;

    fn joined_rows(book: &Book) -> Vec<Row> {
        let base = BookMapper::map_to_persistence(book);
        let mut rows = Vec::new();
        for author in &book.authors {
            for genre in &book.genres {
                let mut row = base.clone();
                row.insert("author_id", author.as_uuid());
                row.insert("genre_id", genre.as_uuid());
                rows.push(row);
            }
        }
        rows
    }

    #[test]
    fn persisted_row_maps_back_with_empty_log() {
        let book = Book::create(new_book()).unwrap();
        let row = BookMapper::map_to_persistence(&book);

        let mapped = BookMapper::map_to_domain(&row).unwrap();

        assert_eq!(mapped.id(), book.id());
        assert_eq!(mapped.title(), book.title());
        assert_eq!(mapped.format(), book.format());
        assert_eq!(mapped.image_url(), None);
        assert!(!mapped.has_pending_actions());
    }

    #[test]
    fn join_rows_fold_into_relation_sets() {
        let authors = BTreeSet::from([AuthorId::new(), AuthorId::new()]);
        let genres = BTreeSet::from([GenreId::new(), GenreId::new()]);
        let book = Book::create(NewBook {
            author_ids: authors.clone(),
            genre_ids: genres.clone(),
            ..new_book()
        })
        .unwrap();

        let mapped = BookMapper::map_raw_with_joins_to_domain(&joined_rows(&book)).unwrap();

        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].authors(), &authors);
        assert_eq!(mapped[0].genres(), &genres);
    }

    #[test]
    fn null_join_columns_yield_empty_sets() {
        let book = Book::create(new_book()).unwrap();
        let row = BookMapper::map_to_persistence(&book)
            .with("author_id", store::Value::Null)
            .with("genre_id", store::Value::Null);

        let mapped = BookMapper::map_raw_with_joins_to_domain(&[row]).unwrap();

        assert!(mapped[0].authors().is_empty());
        assert!(mapped[0].genres().is_empty());
    }

    #[test]
    fn interleaved_ids_are_malformed() {
        let first = BookMapper::map_to_persistence(&Book::create(new_book()).unwrap());
        let second = BookMapper::map_to_persistence(&Book::create(new_book()).unwrap());

        let result = BookMapper::map_raw_with_joins_to_domain(&[first.clone(), second, first]);

        assert!(matches!(result, Err(DomainError::Mapping { .. })));
    }

    #[test]
    fn missing_column_is_mapping_error() {
        let mut row = BookMapper::map_to_persistence(&Book::create(new_book()).unwrap());
        row = row
            .columns()
            .filter(|(column, _)| *column != "title")
            .fold(Row::new(), |acc, (column, value)| acc.with(column, value.clone()));

        assert!(matches!(
            BookMapper::map_to_domain(&row),
            Err(DomainError::Mapping { entity_type: "Book", .. })
        ));
    }

    #[test]
    fn scalar_update_is_one_statement() {
        let id = BookId::new();
        let statements = BookMapper::action_statements(
            id,
            &BookAction::UpdateTitle {
                title: "Dune".to_string(),
            },
        );

        assert_eq!(
            statements,
            vec![Statement::update(
                "books",
                vec![Filter::eq("id", id.as_uuid())],
                Row::new().with("title", "Dune"),
            )]
        );
    }

    #[test]
    fn genre_delta_deletes_then_inserts() {
        let (added, removed) = (GenreId::new(), GenreId::new());
        let statements = BookMapper::action_statements(
            BookId::new(),
            &BookAction::UpdateBookGenres(RelationDelta::new([added], [removed])),
        );

        let kinds: Vec<_> = statements.iter().map(Statement::kind).collect();
        assert_eq!(kinds, vec!["delete", "insert"]);
        assert!(statements.iter().all(|s| s.table() == BOOKS_GENRES));
    }

    #[test]
    fn delete_removes_join_rows_before_book() {
        let tables: Vec<_> = BookMapper::delete_statements(BookId::new())
            .iter()
            .map(Statement::table)
            .collect();
        assert_eq!(tables, vec![BOOKS_AUTHORS, BOOKS_GENRES, "books"]);
    }
}
