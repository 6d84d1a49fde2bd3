//! Genre and category dictionaries.

use std::sync::Arc;

use domain::{
    ActionTranslator, CategoryMapper, Dictionary, Entity, GenreMapper, Mapper, Repository, Result,
};
use serde::Deserialize;
use store::RowStore;

use crate::access::{AccessControl, Caller, Requirement};

type EntryOf<M> = <M as Mapper>::Entity;
type IdOf<M> = <EntryOf<M> as Entity>::Id;

/// Command to add or rename a dictionary entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DictionaryName {
    pub name: String,
}

/// Service for one uniquely named dictionary.
///
/// Entries are administered by moderators and readable by every signed-in
/// user. Duplicate names surface as already-exists from the store.
pub struct DictionaryService<S, M>
where
    S: RowStore,
    M: ActionTranslator,
{
    entries: Repository<S, M>,
    access: Arc<dyn AccessControl>,
}

pub type GenreService<S> = DictionaryService<S, GenreMapper>;
pub type CategoryService<S> = DictionaryService<S, CategoryMapper>;

impl<S, M> DictionaryService<S, M>
where
    S: RowStore,
    M: ActionTranslator,
    EntryOf<M>: Dictionary,
{
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            entries: Repository::new(store),
            access,
        }
    }

    #[tracing::instrument(skip(self, caller), fields(dictionary = M::TABLE))]
    pub async fn create(&self, caller: &Caller, cmd: DictionaryName) -> Result<EntryOf<M>> {
        self.access.check(caller, &Requirement::Admin)?;

        let mut entry = <EntryOf<M> as Dictionary>::create(cmd.name)?;
        self.entries.create(&mut entry).await?;

        Ok(entry)
    }

    #[tracing::instrument(skip(self, caller), fields(dictionary = M::TABLE))]
    pub async fn rename(
        &self,
        caller: &Caller,
        id: IdOf<M>,
        cmd: DictionaryName,
    ) -> Result<EntryOf<M>> {
        self.access.check(caller, &Requirement::Admin)?;

        let mut entry = self.entries.find_by_id(id).await?;
        entry.update_name(cmd.name)?;
        self.entries.save(&mut entry).await?;

        Ok(entry)
    }

    pub async fn find_by_id(&self, caller: &Caller, id: IdOf<M>) -> Result<EntryOf<M>> {
        self.access.check(caller, &Requirement::Authenticated)?;
        self.entries.find_by_id(id).await
    }

    /// Every entry, ordered by id.
    pub async fn find_all(&self, caller: &Caller) -> Result<Vec<EntryOf<M>>> {
        self.access.check(caller, &Requirement::Authenticated)?;
        self.entries.find_many(Vec::new()).await
    }
}
