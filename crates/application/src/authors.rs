//! Author catalogue service.

use std::sync::Arc;

use common::AuthorId;
use domain::{Author, AuthorMapper, Entity, Patch, Repository, Result};
use serde::Deserialize;
use store::{Filter, RowStore};

use crate::access::{AccessControl, Caller, Requirement};
use crate::pagination::{Page, Paginated};

/// Command to add an author.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuthor {
    pub name: String,
}

/// Command to edit an author; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAuthor {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub is_approved: Patch<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct FindAuthors {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    pub is_approved: Option<bool>,
    pub page: Page,
}

/// Service for managing authors.
///
/// Any signed-in user may propose an author; it stays unapproved until an
/// administrator edits it.
pub struct AuthorService<S: RowStore> {
    authors: Repository<S, AuthorMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> AuthorService<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            authors: Repository::new(store),
            access,
        }
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn create_author(&self, caller: &Caller, cmd: CreateAuthor) -> Result<Author> {
        let identity = self.access.check(caller, &Requirement::Authenticated)?;

        let mut author = Author::create(cmd.name, identity.is_admin())?;
        self.authors.create(&mut author).await?;

        tracing::info!(author_id = %author.id(), "author created");
        Ok(author)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn update_author(
        &self,
        caller: &Caller,
        author_id: AuthorId,
        cmd: UpdateAuthor,
    ) -> Result<Author> {
        self.access.check(caller, &Requirement::Admin)?;

        let mut author = self.authors.find_by_id(author_id).await?;
        if let Patch::Present(name) = cmd.name {
            author.update_name(name)?;
        }
        if let Patch::Present(is_approved) = cmd.is_approved {
            author.update_approval(is_approved)?;
        }
        self.authors.save(&mut author).await?;

        Ok(author)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_author_by_id(&self, caller: &Caller, author_id: AuthorId) -> Result<Author> {
        self.access.check(caller, &Requirement::Authenticated)?;
        self.authors.find_by_id(author_id).await
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_authors(
        &self,
        caller: &Caller,
        query: FindAuthors,
    ) -> Result<Paginated<Author>> {
        self.access.check(caller, &Requirement::Authenticated)?;

        let mut filters = Vec::new();
        if let Some(name) = query.name.as_deref().filter(|n| !n.trim().is_empty()) {
            filters.push(Filter::contains("name", name.trim()));
        }
        if let Some(is_approved) = query.is_approved {
            filters.push(Filter::eq("is_approved", is_approved));
        }

        let authors = self.authors.find_many(filters).await?;
        Ok(query.page.apply(authors))
    }
}
