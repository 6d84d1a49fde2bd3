//! Strongly typed identifiers shared by every crate of the library catalogue.

mod ids;

pub use ids::{
    AuthorId, BookChangeRequestId, BookId, BookReadingId, BookshelfId, BorrowingId, CategoryId,
    CollectionId, EntityId, GenreId, QuoteId, UserBookId, UserId,
};
