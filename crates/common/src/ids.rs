use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Behaviour shared by every entity identifier.
///
/// Identifiers are stable for the lifetime of an entity and are never reused
/// across aggregate types, so each aggregate gets its own newtype.
pub trait EntityId:
    Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + From<Uuid> + Send + Sync + 'static
{
    /// Returns the underlying UUID.
    fn as_uuid(&self) -> Uuid;
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl EntityId for $name {
            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a catalogue book.
    BookId
);
define_id!(
    /// Identifier of a book author.
    AuthorId
);
define_id!(
    /// Identifier of a literary genre.
    GenreId
);
define_id!(
    /// Identifier of a book category.
    CategoryId
);
define_id!(
    /// Identifier of a user account.
    UserId
);
define_id!(BookshelfId);
define_id!(
    /// Identifier of a book placed on a user's shelf.
    UserBookId
);
define_id!(CollectionId);
define_id!(BookReadingId);
define_id!(BorrowingId);
define_id!(QuoteId);
define_id!(
    /// Identifier of a pending moderation request against a book.
    BookChangeRequestId
);
