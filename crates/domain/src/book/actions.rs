//! Book domain actions.

use common::{AuthorId, CategoryId, GenreId};
use serde::{Deserialize, Serialize};

use crate::entity::{DomainAction, RelationDelta};
use crate::value_objects::BookFormat;

/// Mutations recorded by a [`super::Book`].
///
/// One variant per independently settable attribute or relation delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BookAction {
    UpdateTitle { title: String },
    UpdateIsbn { isbn: String },
    UpdatePublisher { publisher: String },
    UpdateReleaseYear { release_year: i32 },
    UpdateLanguage { language: String },
    UpdateTranslator { translator: String },
    UpdateFormat { format: BookFormat },
    UpdatePages { pages: i32 },
    UpdateImageUrl { image_url: Option<String> },
    UpdateCategory { category_id: CategoryId },
    UpdateApproval { is_approved: bool },
    AddAuthor { author_id: AuthorId },
    DeleteAuthor { author_id: AuthorId },
    UpdateBookGenres(RelationDelta<GenreId>),
}

impl DomainAction for BookAction {
    fn action_type(&self) -> &'static str {
        match self {
            BookAction::UpdateTitle { .. } => "UpdateTitle",
            BookAction::UpdateIsbn { .. } => "UpdateIsbn",
            BookAction::UpdatePublisher { .. } => "UpdatePublisher",
            BookAction::UpdateReleaseYear { .. } => "UpdateReleaseYear",
            BookAction::UpdateLanguage { .. } => "UpdateLanguage",
            BookAction::UpdateTranslator { .. } => "UpdateTranslator",
            BookAction::UpdateFormat { .. } => "UpdateFormat",
            BookAction::UpdatePages { .. } => "UpdatePages",
            BookAction::UpdateImageUrl { .. } => "UpdateImageUrl",
            BookAction::UpdateCategory { .. } => "UpdateCategory",
            BookAction::UpdateApproval { .. } => "UpdateApproval",
            BookAction::AddAuthor { .. } => "AddAuthor",
            BookAction::DeleteAuthor { .. } => "DeleteAuthor",
            BookAction::UpdateBookGenres(_) => "UpdateBookGenres",
        }
    }
}
