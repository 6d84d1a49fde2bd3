//! Start-up wiring of every handler and service over one store.

use std::sync::Arc;

use store::RowStore;

use crate::access::AccessControl;
use crate::authors::AuthorService;
use crate::books::{
    ApproveBookCommandHandler, CreateBookCommandHandler, DeleteBookCommandHandler,
    FindBookByIdQueryHandler, FindBooksQueryHandler, UpdateBookCommandHandler,
};
use crate::bookshelves::BookshelfService;
use crate::change_requests::{
    ApplyBookChangeRequestCommandHandler, CreateBookChangeRequestCommandHandler,
    DeleteBookChangeRequestCommandHandler, FindBookChangeRequestQueryHandler,
    FindBookChangeRequestsQueryHandler,
};
use crate::collections::CollectionService;
use crate::dictionaries::{CategoryService, GenreService};
use crate::journal::{BookReadingService, BorrowingService, QuoteService};
use crate::user_books::UserBookService;
use crate::users::UserService;

pub struct BookHandlers<S: RowStore> {
    pub create: CreateBookCommandHandler<S>,
    pub update: UpdateBookCommandHandler<S>,
    pub approve: ApproveBookCommandHandler<S>,
    pub delete: DeleteBookCommandHandler<S>,
    pub find_by_id: FindBookByIdQueryHandler<S>,
    pub find: FindBooksQueryHandler<S>,
}

pub struct ChangeRequestHandlers<S: RowStore> {
    pub create: CreateBookChangeRequestCommandHandler<S>,
    pub apply: ApplyBookChangeRequestCommandHandler<S>,
    pub delete: DeleteBookChangeRequestCommandHandler<S>,
    pub find_by_id: FindBookChangeRequestQueryHandler<S>,
    pub find: FindBookChangeRequestsQueryHandler<S>,
}

/// Every handler and service of the catalogue.
///
/// Built once at start-up; repositories share the store and every handler
/// shares the access-control collaborator.
pub struct Catalog<S: RowStore> {
    pub books: BookHandlers<S>,
    pub change_requests: ChangeRequestHandlers<S>,
    pub authors: AuthorService<S>,
    pub genres: GenreService<S>,
    pub categories: CategoryService<S>,
    pub users: UserService<S>,
    pub bookshelves: BookshelfService<S>,
    pub user_books: UserBookService<S>,
    pub collections: CollectionService<S>,
    pub book_readings: BookReadingService<S>,
    pub borrowings: BorrowingService<S>,
    pub quotes: QuoteService<S>,
}

impl<S: RowStore + Clone> Catalog<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        let books = BookHandlers {
            create: CreateBookCommandHandler::new(store.clone(), access.clone()),
            update: UpdateBookCommandHandler::new(store.clone(), access.clone()),
            approve: ApproveBookCommandHandler::new(store.clone(), access.clone()),
            delete: DeleteBookCommandHandler::new(store.clone(), access.clone()),
            find_by_id: FindBookByIdQueryHandler::new(store.clone(), access.clone()),
            find: FindBooksQueryHandler::new(store.clone(), access.clone()),
        };

        let change_requests = ChangeRequestHandlers {
            create: CreateBookChangeRequestCommandHandler::new(store.clone(), access.clone()),
            apply: ApplyBookChangeRequestCommandHandler::new(store.clone(), access.clone()),
            delete: DeleteBookChangeRequestCommandHandler::new(store.clone(), access.clone()),
            find_by_id: FindBookChangeRequestQueryHandler::new(store.clone(), access.clone()),
            find: FindBookChangeRequestsQueryHandler::new(store.clone(), access.clone()),
        };

        Self {
            books,
            change_requests,
            authors: AuthorService::new(store.clone(), access.clone()),
            genres: GenreService::new(store.clone(), access.clone()),
            categories: CategoryService::new(store.clone(), access.clone()),
            users: UserService::new(store.clone(), access.clone()),
            bookshelves: BookshelfService::new(store.clone(), access.clone()),
            user_books: UserBookService::new(store.clone(), access.clone()),
            collections: CollectionService::new(store.clone(), access.clone()),
            book_readings: BookReadingService::new(store.clone(), access.clone()),
            borrowings: BorrowingService::new(store.clone(), access.clone()),
            quotes: QuoteService::new(store, access),
        }
    }
}
