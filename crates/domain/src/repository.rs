//! Loading and saving entities through a row store.

use std::marker::PhantomData;
use std::time::Instant;

use common::EntityId;
use store::{Filter, RowQuery, RowStore, RowStoreExt, Statement};

use crate::entity::{DomainAction, Entity};
use crate::error::{DomainError, Result};
use crate::mapper::ActionTranslator;

type EntityOf<M> = <M as crate::mapper::Mapper>::Entity;
type IdOf<M> = <EntityOf<M> as Entity>::Id;

/// Repository for one aggregate type.
///
/// The repository is responsible for:
/// 1. Loading entities with an empty action log
/// 2. Translating pending actions into statements on save
/// 3. Executing each save as one atomic batch
/// 4. Clearing the action log only after the batch commits
pub struct Repository<S, M>
where
    S: RowStore,
    M: ActionTranslator,
{
    store: S,
    _mapper: PhantomData<M>,
}

impl<S, M> Clone for Repository<S, M>
where
    S: RowStore + Clone,
    M: ActionTranslator,
{
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<S, M> Repository<S, M>
where
    S: RowStore,
    M: ActionTranslator,
{
    /// Creates a new repository over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _mapper: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn entity_type() -> &'static str {
        <EntityOf<M> as Entity>::entity_type()
    }

    fn query() -> RowQuery {
        RowQuery::new(M::TABLE)
            .primary_key(M::PRIMARY_KEY)
            .joins(M::joins())
    }

    /// Loads an entity, failing with not-found if no row exists.
    pub async fn find_by_id(&self, id: IdOf<M>) -> Result<EntityOf<M>> {
        self.find_optional(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Self::entity_type(), id))
    }

    /// Loads an entity, returning None if no row exists.
    pub async fn find_optional(&self, id: IdOf<M>) -> Result<Option<EntityOf<M>>> {
        let query = Self::query().filter(Filter::eq(M::PRIMARY_KEY, id.as_uuid()));
        Ok(self.fetch(query, "find_by_id").await?.into_iter().next())
    }

    /// Loads every entity whose own columns satisfy all filters.
    pub async fn find_many(&self, filters: Vec<Filter>) -> Result<Vec<EntityOf<M>>> {
        self.fetch(Self::query().filters(filters), "find_many").await
    }

    /// Checks whether an entity's own row exists, without loading joins.
    pub async fn exists(&self, id: IdOf<M>) -> Result<bool> {
        let query = RowQuery::new(M::TABLE)
            .primary_key(M::PRIMARY_KEY)
            .filter(Filter::eq(M::PRIMARY_KEY, id.as_uuid()));
        self.store
            .exists(query)
            .await
            .map_err(|e| DomainError::from_store(Self::entity_type(), "exists", e))
    }

    async fn fetch(&self, query: RowQuery, operation: &'static str) -> Result<Vec<EntityOf<M>>> {
        let rows = self
            .store
            .fetch(query)
            .await
            .map_err(|e| DomainError::from_store(Self::entity_type(), operation, e))?;
        M::map_raw_with_joins_to_domain(&rows)
    }

    /// Persists a newly constructed entity together with its relations.
    pub async fn create(&self, entity: &mut EntityOf<M>) -> Result<()> {
        self.create_with(entity, Vec::new()).await
    }

    /// Persists a new entity and runs `extra` statements in the same batch.
    #[tracing::instrument(
        skip(self, entity, extra),
        fields(entity_type = Self::entity_type(), id = %entity.id())
    )]
    pub async fn create_with(&self, entity: &mut EntityOf<M>, extra: Vec<Statement>) -> Result<()> {
        let mut statements = M::insert_statements(entity);
        statements.extend(extra);
        self.run(statements, "create").await?;
        entity.actions_mut().clear();
        Ok(())
    }

    /// Saves an entity by replaying its pending actions.
    ///
    /// An empty action log is a no-op issuing no statements. On failure the
    /// action log is left intact.
    pub async fn save(&self, entity: &mut EntityOf<M>) -> Result<()> {
        self.save_with(entity, Vec::new()).await
    }

    /// Saves an entity and runs `extra` statements in the same batch.
    ///
    /// The extra statements are appended after the entity's own, so a
    /// failing extra statement rolls back the entity's changes too.
    #[tracing::instrument(
        skip(self, entity, extra),
        fields(
            entity_type = Self::entity_type(),
            id = %entity.id(),
            actions = entity.pending_actions().len(),
        )
    )]
    pub async fn save_with(&self, entity: &mut EntityOf<M>, extra: Vec<Statement>) -> Result<()> {
        let id = entity.id();
        let mut statements: Vec<Statement> = entity
            .pending_actions()
            .iter()
            .flat_map(|action| M::action_statements(id, action))
            .collect();
        statements.extend(extra);

        if statements.is_empty() {
            tracing::debug!("nothing to save");
            return Ok(());
        }

        for action in entity.pending_actions() {
            tracing::trace!(action = action.action_type(), "persisting action");
        }

        self.run(statements, "save").await?;
        entity.actions_mut().clear();
        Ok(())
    }

    /// Deletes an entity and its relation rows.
    pub async fn delete(&self, id: IdOf<M>) -> Result<()> {
        self.delete_with(id, Vec::new()).await
    }

    /// Deletes an entity after running `extra` statements in the same batch.
    ///
    /// Used to remove rows of other tables that reference the entity.
    #[tracing::instrument(skip(self, extra), fields(entity_type = Self::entity_type()))]
    pub async fn delete_with(&self, id: IdOf<M>, extra: Vec<Statement>) -> Result<()> {
        let mut statements = extra;
        statements.extend(M::delete_statements(id));
        let counts = self.run(statements, "delete").await?;
        if counts.last().copied().unwrap_or(0) == 0 {
            return Err(DomainError::not_found(Self::entity_type(), id));
        }
        Ok(())
    }

    /// Statements deleting an entity, for composing into another batch.
    pub fn delete_statements(&self, id: IdOf<M>) -> Vec<Statement> {
        M::delete_statements(id)
    }

    async fn run(&self, statements: Vec<Statement>, operation: &'static str) -> Result<Vec<u64>> {
        let entity_type = Self::entity_type();
        let statement_count = statements.len() as u64;
        let start = Instant::now();

        match self.store.execute(statements).await {
            Ok(counts) => {
                metrics::counter!(
                    "repository_saves_total",
                    "entity" => entity_type,
                    "operation" => operation
                )
                .increment(1);
                metrics::counter!("repository_statements_total", "entity" => entity_type)
                    .increment(statement_count);
                metrics::histogram!("repository_save_duration_seconds", "entity" => entity_type)
                    .record(start.elapsed().as_secs_f64());
                Ok(counts)
            }
            Err(error) => {
                metrics::counter!(
                    "repository_save_failures_total",
                    "entity" => entity_type,
                    "operation" => operation
                )
                .increment(1);
                tracing::warn!(%error, operation, "statement batch failed");
                Err(DomainError::from_store(entity_type, operation, error))
            }
        }
    }
}
