//! Integration tests for the catalogue handlers over the in-memory store.
//!
//! These tests exercise authorization, the change-request moderation
//! workflow, and the cascades performed by the user-owned services.

use std::collections::BTreeSet;
use std::sync::Arc;

use application::{
    ApplyBookChangeRequest, ApproveBook, BookshelfName, Caller, Catalog, CommandHandler,
    CreateAuthor, CreateBook, CreateBookChangeRequest, CreateCollection, DeleteBook,
    DeleteBookChangeRequest, DictionaryName, FindBookChangeRequest, FindBookChangeRequests,
    FindBooks, Page, QueryHandler, RoleBasedAccessControl, UpdateBook, UpdateBorrowing,
    UpdateUser,
};
use chrono::NaiveDate;
use common::{AuthorId, BookId, CategoryId, UserId};
use domain::{
    Book, BookChanges, BookFormat, DomainError, Entity, NewBook, NewBookReading, NewBorrowing,
    NewQuote, NewUser, NewUserBook, Patch, RelationDelta, User, UserBookStatus, UserRole, schema,
};
use store::{Filter, InMemoryRowStore, RowStore, Statement};

struct Fixture {
    catalog: Catalog<InMemoryRowStore>,
    store: InMemoryRowStore,
    admin: Caller,
}

fn fixture() -> Fixture {
    let store = schema::in_memory_store();
    Fixture {
        catalog: Catalog::new(store.clone(), Arc::new(RoleBasedAccessControl)),
        store,
        admin: Caller::admin(UserId::new(), "admin@example.com"),
    }
}

impl Fixture {
    async fn category(&self) -> CategoryId {
        let name = DictionaryName {
            name: "Fiction".to_string(),
        };
        self.catalog.categories.create(&self.admin, name).await.unwrap().id()
    }

    async fn author(&self, name: &str) -> AuthorId {
        let cmd = CreateAuthor {
            name: name.to_string(),
        };
        self.catalog.authors.create_author(&self.admin, cmd).await.unwrap().id()
    }

    async fn book(&self, category_id: CategoryId, authors: &[AuthorId]) -> Book {
        let cmd = CreateBook::new(new_book(category_id, authors));
        self.catalog.books.create.execute(&self.admin, cmd).await.unwrap()
    }

    async fn reader(&self, email: &str) -> (User, Caller) {
        let new = NewUser {
            email: email.to_string(),
            first_name: "Paul".to_string(),
            last_name: "Atreides".to_string(),
            password_hash: "$argon2id$hash".to_string(),
        };
        let user = self.catalog.users.register_user(&self.admin, new).await.unwrap();
        let caller = Caller::user(user.id(), email);
        (user, caller)
    }
}

fn new_book(category_id: CategoryId, authors: &[AuthorId]) -> NewBook {
    NewBook {
        title: "Old Title".to_string(),
        isbn: "123".to_string(),
        publisher: "Chilton".to_string(),
        release_year: 1965,
        language: "English".to_string(),
        translator: String::new(),
        format: BookFormat::Hardcover,
        pages: 412,
        image_url: None,
        category_id,
        author_ids: authors.iter().copied().collect(),
        genre_ids: BTreeSet::new(),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

mod books {
    use super::*;

    #[tokio::test]
    async fn anonymous_callers_are_unauthorized() {
        let f = fixture();

        let result = f
            .catalog
            .books
            .find
            .execute(&Caller::Anonymous, FindBooks::default())
            .await;

        assert!(matches!(result, Err(DomainError::Unauthorized)));
    }

    #[tokio::test]
    async fn only_admin_books_start_approved() {
        let f = fixture();
        let category_id = f.category().await;
        let (_, reader) = f.reader("reader@example.com").await;

        let by_admin = f.book(category_id, &[]).await;
        let by_reader = f
            .catalog
            .books
            .create
            .execute(&reader, CreateBook::new(new_book(category_id, &[])))
            .await
            .unwrap();

        assert!(by_admin.is_approved());
        assert!(!by_reader.is_approved());
    }

    #[tokio::test]
    async fn unknown_category_or_author_is_not_found() {
        let f = fixture();
        let category_id = f.category().await;

        let missing_category = f
            .catalog
            .books
            .create
            .execute(&f.admin, CreateBook::new(new_book(CategoryId::new(), &[])))
            .await;
        let missing_author = f
            .catalog
            .books
            .create
            .execute(&f.admin, CreateBook::new(new_book(category_id, &[AuthorId::new()])))
            .await;

        assert!(matches!(
            missing_category,
            Err(DomainError::ResourceNotFound {
                resource: "Category",
                ..
            })
        ));
        assert!(matches!(
            missing_author,
            Err(DomainError::ResourceNotFound {
                resource: "Author",
                ..
            })
        ));
        assert!(f.store.rows("books").await.is_empty());
    }

    #[tokio::test]
    async fn direct_update_requires_admin() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (_, reader) = f.reader("reader@example.com").await;

        let changes = BookChanges {
            title: Patch::Present("Dune".to_string()),
            ..Default::default()
        };
        let result = f
            .catalog
            .books
            .update
            .execute(&reader, UpdateBook::new(book.id(), changes))
            .await;

        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn direct_update_changes_fields_and_genres() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let genre = f
            .catalog
            .genres
            .create(
                &f.admin,
                DictionaryName {
                    name: "Science fiction".to_string(),
                },
            )
            .await
            .unwrap();

        let cmd = UpdateBook {
            book_id: book.id(),
            changes: BookChanges {
                pages: Patch::Present(0),
                ..Default::default()
            },
            genres: Patch::Present(RelationDelta::new([genre.id()], [])),
            ..Default::default()
        };
        let updated = f.catalog.books.update.execute(&f.admin, cmd).await.unwrap();

        assert_eq!(updated.pages(), 0);
        assert_eq!(updated.title(), "Old Title");
        assert_eq!(updated.genres(), &BTreeSet::from([genre.id()]));
        assert_eq!(f.store.rows("books_genres").await.len(), 1);
    }

    #[tokio::test]
    async fn find_filters_by_title_and_paginates() {
        let f = fixture();
        let category_id = f.category().await;
        for _ in 0..3 {
            f.book(category_id, &[]).await;
        }

        let page = f
            .catalog
            .books
            .find
            .execute(
                &f.admin,
                FindBooks {
                    title: Some("old".to_string()),
                    page: Page::new(2, 2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let none = f
            .catalog
            .books
            .find
            .execute(
                &f.admin,
                FindBooks {
                    title: Some("missing".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(none.total, 0);
    }

    #[tokio::test]
    async fn approve_then_delete() {
        let f = fixture();
        let (_, reader) = f.reader("reader@example.com").await;
        let book = f
            .catalog
            .books
            .create
            .execute(&reader, CreateBook::new(new_book(f.category().await, &[])))
            .await
            .unwrap();

        let approved = f
            .catalog
            .books
            .approve
            .execute(&f.admin, ApproveBook::new(book.id(), true))
            .await
            .unwrap();
        f.catalog
            .books
            .delete
            .execute(&f.admin, DeleteBook::new(book.id()))
            .await
            .unwrap();
        let again = f
            .catalog
            .books
            .delete
            .execute(&f.admin, DeleteBook::new(book.id()))
            .await;

        assert!(approved.is_approved());
        assert!(matches!(again, Err(DomainError::ResourceNotFound { .. })));
    }
}

mod change_requests {
    use super::*;

    fn retitle(book_id: BookId, title: &str) -> CreateBookChangeRequest {
        CreateBookChangeRequest::new(
            book_id,
            BookChanges {
                title: Patch::Present(title.to_string()),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn submission_records_proposer_email() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (_, reader) = f.reader("reader@example.com").await;

        let request = f
            .catalog
            .change_requests
            .create
            .execute(&reader, retitle(book.id(), "Dune"))
            .await
            .unwrap();

        assert_eq!(request.user_email(), "reader@example.com");
        assert_eq!(request.book_id(), book.id());
        assert_eq!(f.store.rows("book_change_requests").await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_proposals_fail_at_submission() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;

        let empty = f
            .catalog
            .change_requests
            .create
            .execute(&f.admin, CreateBookChangeRequest::new(book.id(), BookChanges::default()))
            .await;
        let blank_title = f
            .catalog
            .change_requests
            .create
            .execute(&f.admin, retitle(book.id(), "  "))
            .await;
        let unknown_author = f
            .catalog
            .change_requests
            .create
            .execute(
                &f.admin,
                CreateBookChangeRequest::new(
                    book.id(),
                    BookChanges {
                        author_ids: Patch::Present(BTreeSet::from([AuthorId::new()])),
                        ..Default::default()
                    },
                ),
            )
            .await;
        let unknown_book = f
            .catalog
            .change_requests
            .create
            .execute(&f.admin, retitle(BookId::new(), "Dune"))
            .await;

        assert!(matches!(empty, Err(DomainError::OperationNotValid { .. })));
        assert!(matches!(blank_title, Err(DomainError::InputNotValid { .. })));
        assert!(matches!(
            unknown_author,
            Err(DomainError::ResourceNotFound {
                resource: "Author",
                ..
            })
        ));
        assert!(matches!(
            unknown_book,
            Err(DomainError::ResourceNotFound { resource: "Book", .. })
        ));
        assert!(f.store.rows("book_change_requests").await.is_empty());
    }

    #[tokio::test]
    async fn apply_merges_fields_swaps_authors_and_consumes_request() {
        let f = fixture();
        let a1 = f.author("Frank Herbert").await;
        let a9 = f.author("Brian Herbert").await;
        let book = f.book(f.category().await, &[a1]).await;
        let (_, reader) = f.reader("reader@example.com").await;

        let changes = BookChanges {
            title: Patch::Present("New Title".to_string()),
            author_ids: Patch::Present(BTreeSet::from([a9])),
            ..Default::default()
        };
        let request = f
            .catalog
            .change_requests
            .create
            .execute(&reader, CreateBookChangeRequest::new(book.id(), changes))
            .await
            .unwrap();

        let merged = f
            .catalog
            .change_requests
            .apply
            .execute(&f.admin, ApplyBookChangeRequest::new(request.id()))
            .await
            .unwrap();

        assert_eq!(merged.title(), "New Title");
        assert_eq!(merged.isbn(), "123");
        assert_eq!(merged.authors(), &BTreeSet::from([a9]));
        assert!(f.store.rows("book_change_requests").await.is_empty());

        let reloaded = f
            .catalog
            .books
            .find_by_id
            .execute(&f.admin, application::FindBookById::new(book.id()))
            .await
            .unwrap();
        assert_eq!(reloaded.title(), "New Title");
        assert_eq!(reloaded.authors(), &BTreeSet::from([a9]));
    }

    #[tokio::test]
    async fn request_is_consumed_exactly_once() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let request = f
            .catalog
            .change_requests
            .create
            .execute(&f.admin, retitle(book.id(), "Dune"))
            .await
            .unwrap();
        let apply = ApplyBookChangeRequest::new(request.id());

        f.catalog.change_requests.apply.execute(&f.admin, apply).await.unwrap();
        let second_apply = f.catalog.change_requests.apply.execute(&f.admin, apply).await;
        let reject = f
            .catalog
            .change_requests
            .delete
            .execute(&f.admin, DeleteBookChangeRequest::new(request.id()))
            .await;

        assert!(matches!(second_apply, Err(DomainError::ResourceNotFound { .. })));
        assert!(matches!(reject, Err(DomainError::ResourceNotFound { .. })));
    }

    #[tokio::test]
    async fn request_outliving_its_book_cannot_be_applied() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let request = f
            .catalog
            .change_requests
            .create
            .execute(&f.admin, retitle(book.id(), "Dune"))
            .await
            .unwrap();
        f.catalog
            .books
            .delete
            .execute(&f.admin, DeleteBook::new(book.id()))
            .await
            .unwrap();

        let result = f
            .catalog
            .change_requests
            .apply
            .execute(&f.admin, ApplyBookChangeRequest::new(request.id()))
            .await;

        assert!(matches!(result, Err(DomainError::OperationNotValid { .. })));
        assert_eq!(f.store.rows("book_change_requests").await.len(), 1);
    }

    #[tokio::test]
    async fn author_removed_after_submission_is_not_found_on_apply() {
        let f = fixture();
        let a1 = f.author("Frank Herbert").await;
        let a9 = f.author("Brian Herbert").await;
        let book = f.book(f.category().await, &[a1]).await;
        let changes = BookChanges {
            author_ids: Patch::Present(BTreeSet::from([a1, a9])),
            ..Default::default()
        };
        let request = f
            .catalog
            .change_requests
            .create
            .execute(&f.admin, CreateBookChangeRequest::new(book.id(), changes))
            .await
            .unwrap();
        f.store
            .execute(vec![Statement::delete("authors", vec![Filter::eq("id", a9.as_uuid())])])
            .await
            .unwrap();

        let result = f
            .catalog
            .change_requests
            .apply
            .execute(&f.admin, ApplyBookChangeRequest::new(request.id()))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::ResourceNotFound { resource: "Author", .. })
        ));
        assert_eq!(f.store.rows("books_authors").await.len(), 1);
        assert_eq!(f.store.rows("book_change_requests").await.len(), 1);
    }

    #[tokio::test]
    async fn failed_merge_leaves_book_and_request_untouched() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let request = f
            .catalog
            .change_requests
            .create
            .execute(&f.admin, retitle(book.id(), "Dune"))
            .await
            .unwrap();
        f.store.reject_statements_for("book_change_requests").await;

        let result = f
            .catalog
            .change_requests
            .apply
            .execute(&f.admin, ApplyBookChangeRequest::new(request.id()))
            .await;

        assert!(matches!(result, Err(DomainError::Repository { .. })));
        f.store.accept_all_statements().await;
        let reloaded = f
            .catalog
            .books
            .find_by_id
            .execute(&f.admin, application::FindBookById::new(book.id()))
            .await
            .unwrap();
        assert_eq!(reloaded.title(), "Old Title");
        assert_eq!(f.store.rows("book_change_requests").await.len(), 1);
    }

    #[tokio::test]
    async fn moderation_requires_admin() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (_, reader) = f.reader("reader@example.com").await;
        let request = f
            .catalog
            .change_requests
            .create
            .execute(&reader, retitle(book.id(), "Dune"))
            .await
            .unwrap();

        let apply = f
            .catalog
            .change_requests
            .apply
            .execute(&reader, ApplyBookChangeRequest::new(request.id()))
            .await;
        let list = f
            .catalog
            .change_requests
            .find
            .execute(&reader, FindBookChangeRequests::default())
            .await;

        assert!(matches!(apply, Err(DomainError::Forbidden { .. })));
        assert!(matches!(list, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn proposer_and_admin_can_read_a_request() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (_, proposer) = f.reader("proposer@example.com").await;
        let (_, stranger) = f.reader("stranger@example.com").await;
        let request = f
            .catalog
            .change_requests
            .create
            .execute(&proposer, retitle(book.id(), "Dune"))
            .await
            .unwrap();
        let query = FindBookChangeRequest::new(request.id());

        let handler = &f.catalog.change_requests.find_by_id;
        assert!(handler.execute(&proposer, query).await.is_ok());
        assert!(handler.execute(&f.admin, query).await.is_ok());
        assert!(matches!(
            handler.execute(&stranger, query).await,
            Err(DomainError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn list_filters_by_book() {
        let f = fixture();
        let category_id = f.category().await;
        let first = f.book(category_id, &[]).await;
        let second = f.book(category_id, &[]).await;
        for (book_id, title) in [(first.id(), "A"), (first.id(), "B"), (second.id(), "C")] {
            f.catalog
                .change_requests
                .create
                .execute(&f.admin, retitle(book_id, title))
                .await
                .unwrap();
        }

        let listed = f
            .catalog
            .change_requests
            .find
            .execute(
                &f.admin,
                FindBookChangeRequests {
                    book_id: Some(first.id()),
                    page: Page::default(),
                },
            )
            .await
            .unwrap();

        assert_eq!(listed.total, 2);
        assert!(listed.items.iter().all(|r| r.book_id() == first.id()));
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn registration_creates_reading_state_shelves() {
        let f = fixture();
        let (user, reader) = f.reader("reader@example.com").await;

        let shelves = f
            .catalog
            .bookshelves
            .find_user_bookshelves(&reader, user.id())
            .await
            .unwrap();

        assert_eq!(shelves.len(), 3);
        assert!(shelves.iter().all(|shelf| !shelf.is_standard()));
    }

    #[tokio::test]
    async fn duplicate_email_already_exists() {
        let f = fixture();
        f.reader("reader@example.com").await;

        let duplicate = f
            .catalog
            .users
            .register_user(
                &f.admin,
                NewUser {
                    email: "reader@example.com".to_string(),
                    first_name: "Chani".to_string(),
                    last_name: "Kynes".to_string(),
                    password_hash: "hash".to_string(),
                },
            )
            .await;

        assert!(matches!(duplicate, Err(DomainError::ResourceAlreadyExists { .. })));
        assert_eq!(f.store.rows("bookshelves").await.len(), 3);
    }

    #[tokio::test]
    async fn owner_may_rename_but_not_promote() {
        let f = fixture();
        let (user, reader) = f.reader("reader@example.com").await;

        let renamed = f
            .catalog
            .users
            .update_user(
                &reader,
                user.id(),
                UpdateUser {
                    first_name: Patch::Present("Muad'Dib".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let promote = f
            .catalog
            .users
            .update_user(
                &reader,
                user.id(),
                UpdateUser {
                    role: Patch::Present(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(renamed.first_name(), "Muad'Dib");
        assert!(matches!(promote, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn admin_email_change_resets_verification() {
        let f = fixture();
        let (user, _) = f.reader("reader@example.com").await;
        f.catalog.users.verify_email(&f.admin, user.id()).await.unwrap();

        let updated = f
            .catalog
            .users
            .update_user(
                &f.admin,
                user.id(),
                UpdateUser {
                    email: Patch::Present("paul@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email(), "paul@example.com");
        assert!(!updated.is_email_verified());
    }
}

mod personal_library {
    use super::*;

    #[tokio::test]
    async fn reading_state_shelves_cannot_be_deleted() {
        let f = fixture();
        let (user, reader) = f.reader("reader@example.com").await;
        let shelves = f
            .catalog
            .bookshelves
            .find_user_bookshelves(&reader, user.id())
            .await
            .unwrap();

        let result = f.catalog.bookshelves.delete_bookshelf(&reader, shelves[0].id()).await;

        assert!(matches!(result, Err(DomainError::OperationNotValid { .. })));
    }

    #[tokio::test]
    async fn shelves_holding_books_cannot_be_deleted() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (user, reader) = f.reader("reader@example.com").await;
        let shelf = f
            .catalog
            .bookshelves
            .create_bookshelf(
                &reader,
                user.id(),
                BookshelfName {
                    name: "Favourites".to_string(),
                },
            )
            .await
            .unwrap();
        let user_book = f
            .catalog
            .user_books
            .create_user_book(
                &reader,
                user.id(),
                NewUserBook {
                    book_id: book.id(),
                    bookshelf_id: shelf.id(),
                    status: UserBookStatus::Reading,
                    is_favorite: true,
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let occupied = f.catalog.bookshelves.delete_bookshelf(&reader, shelf.id()).await;
        f.catalog.user_books.delete_user_book(&reader, user_book.id()).await.unwrap();
        let emptied = f.catalog.bookshelves.delete_bookshelf(&reader, shelf.id()).await;

        assert!(matches!(occupied, Err(DomainError::OperationNotValid { .. })));
        assert!(emptied.is_ok());
    }

    #[tokio::test]
    async fn books_cannot_go_on_another_users_shelf() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (owner, owner_caller) = f.reader("owner@example.com").await;
        let (other, _) = f.reader("other@example.com").await;
        let foreign_shelf = f
            .catalog
            .bookshelves
            .create_bookshelf(
                &f.admin,
                other.id(),
                BookshelfName {
                    name: "Theirs".to_string(),
                },
            )
            .await
            .unwrap();

        let result = f
            .catalog
            .user_books
            .create_user_book(
                &owner_caller,
                owner.id(),
                NewUserBook {
                    book_id: book.id(),
                    bookshelf_id: foreign_shelf.id(),
                    status: UserBookStatus::ToRead,
                    is_favorite: false,
                    image_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::OperationNotValid { .. })));
    }

    #[tokio::test]
    async fn deleting_a_user_book_removes_its_records() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (user, reader) = f.reader("reader@example.com").await;
        let shelves = f
            .catalog
            .bookshelves
            .find_user_bookshelves(&reader, user.id())
            .await
            .unwrap();
        let user_book = f
            .catalog
            .user_books
            .create_user_book(
                &reader,
                user.id(),
                NewUserBook {
                    book_id: book.id(),
                    bookshelf_id: shelves[0].id(),
                    status: UserBookStatus::Read,
                    is_favorite: false,
                    image_url: None,
                },
            )
            .await
            .unwrap();
        let collection = f
            .catalog
            .collections
            .create_collection(
                &reader,
                user.id(),
                CreateCollection {
                    name: "Desert planets".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        f.catalog
            .user_books
            .update_collections(
                &reader,
                user_book.id(),
                RelationDelta::new([collection.id()], []),
            )
            .await
            .unwrap();
        f.catalog
            .book_readings
            .create_book_reading(
                &reader,
                user_book.id(),
                NewBookReading {
                    rating: 9,
                    comment: None,
                    started_at: date(2024, 1, 1),
                    ended_at: date(2024, 2, 1),
                },
            )
            .await
            .unwrap();
        f.catalog
            .quotes
            .create_quote(
                &reader,
                user_book.id(),
                NewQuote {
                    content: "Fear is the mind-killer.".to_string(),
                    page: Some(8),
                    is_favorite: true,
                },
            )
            .await
            .unwrap();

        f.catalog.user_books.delete_user_book(&reader, user_book.id()).await.unwrap();

        for table in ["user_books", "user_books_collections", "book_readings", "quotes"] {
            assert!(f.store.rows(table).await.is_empty(), "{table} not emptied");
        }
        assert_eq!(f.store.rows("collections").await.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_book_removes_it_from_every_shelf() {
        let f = fixture();
        let category_id = f.category().await;
        let doomed = f.book(category_id, &[]).await;
        let kept = f.book(category_id, &[]).await;
        let (user, reader) = f.reader("reader@example.com").await;
        let shelf = f
            .catalog
            .bookshelves
            .create_bookshelf(
                &reader,
                user.id(),
                BookshelfName {
                    name: "Lent out".to_string(),
                },
            )
            .await
            .unwrap();
        let shelves = f
            .catalog
            .bookshelves
            .find_user_bookshelves(&reader, user.id())
            .await
            .unwrap();
        let shelve = |book_id: BookId, bookshelf_id| NewUserBook {
            book_id,
            bookshelf_id,
            status: UserBookStatus::Read,
            is_favorite: false,
            image_url: None,
        };
        let lent = f
            .catalog
            .user_books
            .create_user_book(&reader, user.id(), shelve(doomed.id(), shelf.id()))
            .await
            .unwrap();
        f.catalog
            .user_books
            .create_user_book(&reader, user.id(), shelve(kept.id(), shelves[0].id()))
            .await
            .unwrap();
        f.catalog
            .borrowings
            .create_borrowing(
                &reader,
                lent.id(),
                NewBorrowing {
                    borrower: "Chani".to_string(),
                    started_at: date(2024, 3, 1),
                    ended_at: None,
                },
            )
            .await
            .unwrap();

        f.catalog
            .books
            .delete
            .execute(&f.admin, DeleteBook::new(doomed.id()))
            .await
            .unwrap();

        let remaining = f
            .catalog
            .user_books
            .find_user_books(&reader, user.id(), Default::default())
            .await
            .unwrap();
        assert_eq!(remaining.total, 1);
        assert_eq!(remaining.items[0].book_id(), kept.id());
        assert!(f.store.rows("borrowings").await.is_empty());
        assert!(
            f.catalog
                .bookshelves
                .delete_bookshelf(&reader, shelf.id())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn deleting_a_collection_detaches_it() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (user, reader) = f.reader("reader@example.com").await;
        let shelves = f
            .catalog
            .bookshelves
            .find_user_bookshelves(&reader, user.id())
            .await
            .unwrap();
        let user_book = f
            .catalog
            .user_books
            .create_user_book(
                &reader,
                user.id(),
                NewUserBook {
                    book_id: book.id(),
                    bookshelf_id: shelves[0].id(),
                    status: UserBookStatus::ToRead,
                    is_favorite: false,
                    image_url: None,
                },
            )
            .await
            .unwrap();
        let collection = f
            .catalog
            .collections
            .create_collection(
                &reader,
                user.id(),
                CreateCollection {
                    name: "Classics".to_string(),
                    description: Some("Old but gold".to_string()),
                },
            )
            .await
            .unwrap();
        f.catalog
            .user_books
            .update_collections(
                &reader,
                user_book.id(),
                RelationDelta::new([collection.id()], []),
            )
            .await
            .unwrap();

        f.catalog.collections.delete_collection(&reader, collection.id()).await.unwrap();

        let user_books = f
            .catalog
            .user_books
            .find_user_books(&reader, user.id(), Default::default())
            .await
            .unwrap();
        assert!(user_books.items[0].collections().is_empty());
        assert!(f.store.rows("user_books_collections").await.is_empty());
    }

    #[tokio::test]
    async fn strangers_cannot_read_another_users_quotes() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (user, reader) = f.reader("reader@example.com").await;
        let (_, stranger) = f.reader("stranger@example.com").await;
        let shelves = f
            .catalog
            .bookshelves
            .find_user_bookshelves(&reader, user.id())
            .await
            .unwrap();
        let user_book = f
            .catalog
            .user_books
            .create_user_book(
                &reader,
                user.id(),
                NewUserBook {
                    book_id: book.id(),
                    bookshelf_id: shelves[0].id(),
                    status: UserBookStatus::ToRead,
                    is_favorite: false,
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let result = f.catalog.quotes.find_by_user_book(&stranger, user_book.id()).await;

        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn borrowing_period_can_move_forward_in_one_edit() {
        let f = fixture();
        let book = f.book(f.category().await, &[]).await;
        let (user, reader) = f.reader("reader@example.com").await;
        let shelves = f
            .catalog
            .bookshelves
            .find_user_bookshelves(&reader, user.id())
            .await
            .unwrap();
        let user_book = f
            .catalog
            .user_books
            .create_user_book(
                &reader,
                user.id(),
                NewUserBook {
                    book_id: book.id(),
                    bookshelf_id: shelves[2].id(),
                    status: UserBookStatus::Read,
                    is_favorite: false,
                    image_url: None,
                },
            )
            .await
            .unwrap();
        let borrowing = f
            .catalog
            .borrowings
            .create_borrowing(
                &reader,
                user_book.id(),
                NewBorrowing {
                    borrower: "Gurney".to_string(),
                    started_at: date(2024, 1, 1),
                    ended_at: Some(date(2024, 1, 10)),
                },
            )
            .await
            .unwrap();

        let moved = f
            .catalog
            .borrowings
            .update_borrowing(
                &reader,
                borrowing.id(),
                UpdateBorrowing {
                    started_at: Patch::Present(date(2024, 3, 1)),
                    ended_at: Patch::Present(Some(date(2024, 3, 15))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let inverted = f
            .catalog
            .borrowings
            .update_borrowing(
                &reader,
                borrowing.id(),
                UpdateBorrowing {
                    ended_at: Patch::Present(Some(date(2024, 2, 1))),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(moved.started_at(), date(2024, 3, 1));
        assert_eq!(moved.ended_at(), Some(date(2024, 3, 15)));
        assert!(matches!(inverted, Err(DomainError::InputNotValid { .. })));
    }
}
