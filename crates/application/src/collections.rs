//! Collection service.

use std::sync::Arc;

use common::{CollectionId, UserId};
use domain::{Collection, CollectionMapper, Patch, Repository, Result, UserBookMapper};
use serde::Deserialize;
use store::{Filter, RowStore};

use crate::access::{AccessControl, Caller, Requirement};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollection {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Command to edit a collection; absent fields are left untouched.
///
/// The description is nullable, so a present `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCollection {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<Option<String>>,
}

pub struct CollectionService<S: RowStore> {
    collections: Repository<S, CollectionMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> CollectionService<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            collections: Repository::new(store),
            access,
        }
    }

    async fn load_owned(&self, caller: &Caller, collection_id: CollectionId) -> Result<Collection> {
        let collection = self.collections.find_by_id(collection_id).await?;
        self.access.check(caller, &Requirement::OwnerOrAdmin(collection.user_id()))?;
        Ok(collection)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn create_collection(
        &self,
        caller: &Caller,
        user_id: UserId,
        cmd: CreateCollection,
    ) -> Result<Collection> {
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;

        let mut collection = Collection::create(user_id, cmd.name, cmd.description)?;
        self.collections.create(&mut collection).await?;

        Ok(collection)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn update_collection(
        &self,
        caller: &Caller,
        collection_id: CollectionId,
        cmd: UpdateCollection,
    ) -> Result<Collection> {
        let mut collection = self.load_owned(caller, collection_id).await?;
        if let Patch::Present(name) = cmd.name {
            collection.update_name(name)?;
        }
        if let Patch::Present(description) = cmd.description {
            collection.update_description(description)?;
        }
        self.collections.save(&mut collection).await?;

        Ok(collection)
    }

    /// Deletes a collection and detaches it from every user book.
    #[tracing::instrument(skip(self, caller))]
    pub async fn delete_collection(
        &self,
        caller: &Caller,
        collection_id: CollectionId,
    ) -> Result<()> {
        self.load_owned(caller, collection_id).await?;

        let detach = vec![UserBookMapper::detach_collection_statement(collection_id)];
        self.collections.delete_with(collection_id, detach).await
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_user_collections(
        &self,
        caller: &Caller,
        user_id: UserId,
    ) -> Result<Vec<Collection>> {
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;
        self.collections.find_many(vec![Filter::eq("user_id", user_id.as_uuid())]).await
    }
}
