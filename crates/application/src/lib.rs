//! Application layer of the library catalogue.
//!
//! Handlers and services authorize the caller, load aggregates through
//! their repositories, invoke domain mutators and save the resulting action
//! logs. Domain errors propagate unchanged to the boundary.

pub mod access;
pub mod authors;
pub mod books;
pub mod bookshelves;
pub mod catalog;
pub mod change_requests;
pub mod collections;
pub mod dictionaries;
pub mod handler;
pub mod journal;
mod lookup;
pub mod pagination;
pub mod user_books;
pub mod users;

pub use access::{AccessControl, Caller, Identity, Requirement, RoleBasedAccessControl};
pub use authors::{AuthorService, CreateAuthor, FindAuthors, UpdateAuthor};
pub use books::{
    ApproveBook, ApproveBookCommandHandler, CreateBook, CreateBookCommandHandler, DeleteBook,
    DeleteBookCommandHandler, FindBookById, FindBookByIdQueryHandler, FindBooks,
    FindBooksQueryHandler, UpdateBook, UpdateBookCommandHandler,
};
pub use bookshelves::{BookshelfName, BookshelfService};
pub use catalog::{BookHandlers, Catalog, ChangeRequestHandlers};
pub use change_requests::{
    ApplyBookChangeRequest, ApplyBookChangeRequestCommandHandler, CreateBookChangeRequest,
    CreateBookChangeRequestCommandHandler, DeleteBookChangeRequest,
    DeleteBookChangeRequestCommandHandler, FindBookChangeRequest,
    FindBookChangeRequestQueryHandler, FindBookChangeRequests,
    FindBookChangeRequestsQueryHandler,
};
pub use collections::{CollectionService, CreateCollection, UpdateCollection};
pub use dictionaries::{CategoryService, DictionaryName, DictionaryService, GenreService};
pub use handler::{CommandHandler, QueryHandler};
pub use journal::{
    BookReadingService, BorrowingService, QuoteService, UpdateBookReading, UpdateBorrowing,
    UpdateQuote,
};
pub use pagination::{Page, Paginated};
pub use user_books::{FindUserBooks, UpdateUserBook, UserBookService};
pub use users::{UpdateUser, UserService};
