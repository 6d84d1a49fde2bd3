//! Translation between persisted rows and entities.

use std::collections::HashSet;

use common::EntityId;
use store::{Filter, Join, Row, RowError, Statement};

use crate::entity::Entity;
use crate::error::{DomainError, Result};

/// Maps raw rows of one table to entities and back.
///
/// Mapped entities always start with an empty action log. The mapper owns
/// the table and column names; the repository consults it to translate
/// pending actions into statements.
pub trait Mapper: Send + Sync + 'static {
    /// The entity this mapper produces.
    type Entity: Entity;

    /// The entity's table.
    const TABLE: &'static str;

    /// The primary key column of [`Self::TABLE`].
    const PRIMARY_KEY: &'static str = "id";

    /// Builds an entity from one row of its own table.
    fn map_to_domain(row: &Row) -> Result<Self::Entity>;

    /// Child tables folded into relation sets, left-joined on load.
    fn joins() -> Vec<Join> {
        Vec::new()
    }

    /// Folds the join columns of one row into the entity's relation sets.
    fn fold_join_row(_entity: &mut Self::Entity, _row: &Row) -> Result<()> {
        Ok(())
    }

    /// Maps joined rows into entities, one per primary id.
    ///
    /// Rows must arrive grouped by primary id. An id that reappears after
    /// another id has started is malformed input and fails the whole batch.
    fn map_raw_with_joins_to_domain(rows: &[Row]) -> Result<Vec<Self::Entity>> {
        let mut entities: Vec<Self::Entity> = Vec::new();
        let mut seen = HashSet::new();

        for row in rows {
            let id =
                <Self::Entity as Entity>::Id::from(row_uuid::<Self>(row, Self::PRIMARY_KEY)?);

            let continues_current = entities.last().is_some_and(|current| current.id() == id);
            if !continues_current {
                if !seen.insert(id) {
                    return Err(DomainError::Mapping {
                        entity_type: <Self::Entity as Entity>::entity_type(),
                        reason: format!("rows for {id} are not contiguous"),
                    });
                }
                entities.push(Self::map_to_domain(row)?);
            }

            if let Some(current) = entities.last_mut() {
                Self::fold_join_row(current, row)?;
            }
        }

        Ok(entities)
    }

    /// Renders the entity's own row, as inserted on create.
    fn map_to_persistence(entity: &Self::Entity) -> Row;

    /// Renders the join rows of the entity's relation sets, keyed by table.
    fn map_relations_to_persistence(_entity: &Self::Entity) -> Vec<(&'static str, Row)> {
        Vec::new()
    }
}

/// Translates pending actions into persistence statements.
pub trait ActionTranslator: Mapper {
    /// Resolves one action to the statements that persist it.
    ///
    /// Scalar updates yield one statement; relation deltas yield the deletes
    /// for removed ids followed by the inserts for added ids.
    fn action_statements(
        id: <Self::Entity as Entity>::Id,
        action: &<Self::Entity as Entity>::Action,
    ) -> Vec<Statement>;

    /// Statements creating the entity with its relations.
    fn insert_statements(entity: &Self::Entity) -> Vec<Statement> {
        let mut statements = vec![Statement::insert(
            Self::TABLE,
            Self::map_to_persistence(entity),
        )];
        statements.extend(
            Self::map_relations_to_persistence(entity)
                .into_iter()
                .map(|(table, row)| Statement::insert(table, row)),
        );
        statements
    }

    /// Statements deleting the entity; the last one removes its own row.
    fn delete_statements(id: <Self::Entity as Entity>::Id) -> Vec<Statement> {
        let mut statements: Vec<Statement> = Self::joins()
            .into_iter()
            .map(|join| {
                Statement::delete(join.table, vec![Filter::eq(join.foreign_key, id.as_uuid())])
            })
            .collect();
        statements.push(Statement::delete(
            Self::TABLE,
            vec![Filter::eq(Self::PRIMARY_KEY, id.as_uuid())],
        ));
        statements
    }
}

/// Reads a UUID column, reporting failures against the mapper's entity.
pub(crate) fn row_uuid<M: Mapper + ?Sized>(row: &Row, column: &str) -> Result<uuid::Uuid> {
    row.uuid(column).map_err(|e| mapping_error::<M>(e))
}

pub(crate) fn mapping_error<M: Mapper + ?Sized>(error: RowError) -> DomainError {
    DomainError::mapping(<M::Entity as Entity>::entity_type(), error)
}

/// Parses a text column into an enumerated value.
pub(crate) fn parse_text<M, T>(row: &Row, column: &str) -> Result<T>
where
    M: Mapper + ?Sized,
    T: std::str::FromStr<Err = String>,
{
    let text = row.text(column).map_err(mapping_error::<M>)?;
    text.parse().map_err(|reason| DomainError::Mapping {
        entity_type: <M::Entity as Entity>::entity_type(),
        reason,
    })
}

/// Shorthand for a single-column update keyed on the entity's primary key.
pub(crate) fn set_column<M: Mapper + ?Sized>(
    id: impl EntityId,
    column: &'static str,
    value: impl Into<store::Value>,
) -> Statement {
    Statement::update(
        M::TABLE,
        vec![Filter::eq(M::PRIMARY_KEY, id.as_uuid())],
        Row::new().with(column, value),
    )
}

/// Statements for a relation delta on a join table.
pub(crate) fn relation_statements<I: EntityId>(
    table: &'static str,
    owner_column: &'static str,
    owner: impl EntityId,
    member_column: &'static str,
    delta: &crate::entity::RelationDelta<I>,
) -> Vec<Statement> {
    let deletes = delta.removed.iter().map(|member| {
        Statement::delete(
            table,
            vec![
                Filter::eq(owner_column, owner.as_uuid()),
                Filter::eq(member_column, member.as_uuid()),
            ],
        )
    });
    let inserts = delta.added.iter().map(|member| {
        Statement::insert(
            table,
            Row::new()
                .with(owner_column, owner.as_uuid())
                .with(member_column, member.as_uuid()),
        )
    });
    deletes.chain(inserts).collect()
}
