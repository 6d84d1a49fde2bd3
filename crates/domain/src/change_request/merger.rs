use serde::Serialize;

use super::{BookChangeRequest, BookChanges};
use crate::book::Book;
use crate::entity::{Entity, RelationDelta};
use crate::error::{DomainError, Result};
use crate::patch::Patch;

/// Summary of what a merge changed on the book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// Scalar fields that were set, in merge order.
    pub fields: Vec<&'static str>,
    pub authors_added: usize,
    pub authors_removed: usize,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.authors_added == 0 && self.authors_removed == 0
    }
}

/// Merges sparse proposals onto a book through the book's own mutators.
///
/// The merge is all-or-nothing: it runs against a copy of the book, and the
/// book only takes the copy's state once every mutator has succeeded.
pub struct ChangeRequestMerger;

impl ChangeRequestMerger {
    /// Merges a change request onto its target book.
    pub fn merge(book: &mut Book, request: &BookChangeRequest) -> Result<MergeOutcome> {
        if request.book_id() != book.id() {
            return Err(DomainError::operation_not_valid(format!(
                "change request {} targets book {}, not {}",
                request.id(),
                request.book_id(),
                book.id()
            )));
        }
        Self::apply_changes(book, request.changes())
    }

    /// Applies every present field; absent fields are left untouched.
    ///
    /// A present `author_ids` is the desired author set: only the symmetric
    /// difference with the current set is added or deleted.
    pub fn apply_changes(book: &mut Book, changes: &BookChanges) -> Result<MergeOutcome> {
        let mut staged = book.clone();
        let mut outcome = MergeOutcome::default();

        if let Patch::Present(title) = &changes.title {
            staged.update_title(title.clone())?;
            outcome.fields.push("title");
        }
        if let Patch::Present(isbn) = &changes.isbn {
            staged.update_isbn(isbn.clone())?;
            outcome.fields.push("isbn");
        }
        if let Patch::Present(publisher) = &changes.publisher {
            staged.update_publisher(publisher.clone())?;
            outcome.fields.push("publisher");
        }
        if let Patch::Present(release_year) = changes.release_year {
            staged.update_release_year(release_year)?;
            outcome.fields.push("release_year");
        }
        if let Patch::Present(language) = &changes.language {
            staged.update_language(language.clone())?;
            outcome.fields.push("language");
        }
        if let Patch::Present(translator) = &changes.translator {
            staged.update_translator(translator.clone())?;
            outcome.fields.push("translator");
        }
        if let Patch::Present(format) = changes.format {
            staged.update_format(format)?;
            outcome.fields.push("format");
        }
        if let Patch::Present(pages) = changes.pages {
            staged.update_pages(pages)?;
            outcome.fields.push("pages");
        }
        if let Patch::Present(image_url) = &changes.image_url {
            staged.update_image_url(Some(image_url.clone()))?;
            outcome.fields.push("image_url");
        }
        if let Patch::Present(author_ids) = &changes.author_ids {
            let delta = RelationDelta::between(staged.authors(), author_ids);
            for author_id in &delta.added {
                staged.add_author(*author_id)?;
            }
            for author_id in &delta.removed {
                staged.delete_author(*author_id)?;
            }
            outcome.authors_added = delta.added.len();
            outcome.authors_removed = delta.removed.len();
        }

        *book = staged;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use common::{AuthorId, BookId};

    use super::*;
    use crate::book::tests::new_book;
    use crate::book::{BookAction, NewBook};

    fn changes() -> BookChanges {
        BookChanges::default()
    }

    #[test]
    fn absent_fields_are_untouched() {
        let mut book = Book::create(new_book()).unwrap();

        let outcome = ChangeRequestMerger::apply_changes(
            &mut book,
            &BookChanges {
                title: Patch::Present("Dune".to_string()),
                ..changes()
            },
        )
        .unwrap();

        assert_eq!(book.title(), "Dune");
        assert_eq!(book.isbn(), "123");
        assert_eq!(outcome.fields, vec!["title"]);
        assert_eq!(book.pending_actions().len(), 1);
    }

    #[test]
    fn empty_string_and_zero_are_applied() {
        let mut book = Book::create(new_book()).unwrap();

        ChangeRequestMerger::apply_changes(
            &mut book,
            &BookChanges {
                isbn: Patch::Present(String::new()),
                pages: Patch::Present(0),
                ..changes()
            },
        )
        .unwrap();

        assert_eq!(book.isbn(), "");
        assert_eq!(book.pages(), 0);
    }

    #[test]
    fn authors_change_by_symmetric_difference() {
        let (a1, a2, a3) = (AuthorId::new(), AuthorId::new(), AuthorId::new());
        let mut book = Book::create(NewBook {
            author_ids: BTreeSet::from([a1, a2]),
            ..new_book()
        })
        .unwrap();

        let outcome = ChangeRequestMerger::apply_changes(
            &mut book,
            &BookChanges {
                author_ids: Patch::Present(BTreeSet::from([a1, a3])),
                ..changes()
            },
        )
        .unwrap();

        assert_eq!(book.authors(), &BTreeSet::from([a1, a3]));
        assert_eq!(
            book.pending_actions(),
            &[
                BookAction::AddAuthor { author_id: a3 },
                BookAction::DeleteAuthor { author_id: a2 },
            ]
        );
        assert_eq!((outcome.authors_added, outcome.authors_removed), (1, 1));
    }

    #[test]
    fn unchanged_author_set_queues_nothing() {
        let a1 = AuthorId::new();
        let mut book = Book::create(NewBook {
            author_ids: BTreeSet::from([a1]),
            ..new_book()
        })
        .unwrap();

        let outcome = ChangeRequestMerger::apply_changes(
            &mut book,
            &BookChanges {
                author_ids: Patch::Present(BTreeSet::from([a1])),
                ..changes()
            },
        )
        .unwrap();

        assert!(outcome.is_empty());
        assert!(!book.has_pending_actions());
    }

    #[test]
    fn invalid_field_leaves_book_unchanged() {
        let mut book = Book::create(new_book()).unwrap();

        let result = ChangeRequestMerger::apply_changes(
            &mut book,
            &BookChanges {
                title: Patch::Present("Dune".to_string()),
                pages: Patch::Present(-1),
                ..changes()
            },
        );

        assert!(matches!(result, Err(DomainError::InputNotValid { .. })));
        assert_eq!(book.title(), "Old Title");
        assert!(!book.has_pending_actions());
    }

    #[test]
    fn request_for_another_book_is_rejected() {
        let mut book = Book::create(new_book()).unwrap();
        let request = BookChangeRequest::create(
            BookId::new(),
            "reader@example.com",
            BookChanges {
                title: Patch::Present("Dune".to_string()),
                ..changes()
            },
        )
        .unwrap();

        assert!(matches!(
            ChangeRequestMerger::merge(&mut book, &request),
            Err(DomainError::OperationNotValid { .. })
        ));
    }
}
