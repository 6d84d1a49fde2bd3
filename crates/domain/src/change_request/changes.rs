use std::collections::BTreeSet;

use common::AuthorId;
use serde::{Deserialize, Serialize};

use crate::patch::Patch;
use crate::value_objects::BookFormat;

/// A sparse set of proposed book field values.
///
/// Every field is independently present or absent. Absent fields are never
/// touched by a merge; `author_ids`, when present, is the complete desired
/// author set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookChanges {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub isbn: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub publisher: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub release_year: Patch<i32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub language: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub translator: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub format: Patch<BookFormat>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub pages: Patch<i32>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub image_url: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub author_ids: Patch<BTreeSet<AuthorId>>,
}

impl BookChanges {
    /// Returns true if no field is proposed.
    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }

    /// Names of the proposed fields, in declaration order.
    pub fn present_fields(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_present()),
            ("isbn", self.isbn.is_present()),
            ("publisher", self.publisher.is_present()),
            ("release_year", self.release_year.is_present()),
            ("language", self.language.is_present()),
            ("translator", self.translator.is_present()),
            ("format", self.format.is_present()),
            ("pages", self.pages.is_present()),
            ("image_url", self.image_url.is_present()),
            ("author_ids", self.author_ids.is_present()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}
