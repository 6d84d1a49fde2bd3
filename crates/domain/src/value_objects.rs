//! Enumerated attribute values persisted as text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Returns the persisted text form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} {other:?}", stringify!($name))),
                }
            }
        }
    };
}

text_enum!(
    /// Physical or digital edition of a book.
    BookFormat {
        Paperback => "paperback",
        Hardcover => "hardcover",
        Ebook => "ebook",
        Audiobook => "audiobook",
    }
);

text_enum!(
    /// Role of a user account.
    UserRole {
        User => "user",
        Admin => "admin",
    }
);

text_enum!(
    /// Kind of bookshelf.
    ///
    /// Every user owns one shelf of each reading-state kind; only standard
    /// shelves are created and named by the user.
    BookshelfType {
        Standard => "standard",
        ToRead => "to_read",
        Reading => "reading",
        Read => "read",
    }
);

text_enum!(
    /// Reading status of a book on a user's shelf.
    UserBookStatus {
        ToRead => "to_read",
        Reading => "reading",
        Read => "read",
        Abandoned => "abandoned",
    }
);
