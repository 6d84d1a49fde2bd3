//! User-defined collections of user books.

use chrono::{DateTime, Utc};
use common::{CollectionId, EntityId, UserId};
use serde::{Deserialize, Serialize};
use store::{Row, Statement};

use crate::entity::{ActionLog, DomainAction, Entity, record};
use crate::error::Result;
use crate::mapper::{ActionTranslator, Mapper, mapping_error, row_uuid, set_column};
use crate::validation;

const ENTITY: &str = "Collection";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum CollectionAction {
    UpdateName { name: String },
    UpdateDescription { description: Option<String> },
}

impl DomainAction for CollectionAction {
    fn action_type(&self) -> &'static str {
        match self {
            CollectionAction::UpdateName { .. } => "UpdateName",
            CollectionAction::UpdateDescription { .. } => "UpdateDescription",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    id: CollectionId,
    user_id: UserId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,

    #[serde(skip)]
    actions: ActionLog<CollectionAction>,
}

impl Entity for Collection {
    type Id = CollectionId;
    type Action = CollectionAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> CollectionId {
        self.id
    }

    fn apply(&mut self, action: &CollectionAction) {
        match action {
            CollectionAction::UpdateName { name } => self.name = name.clone(),
            CollectionAction::UpdateDescription { description } => {
                self.description = description.clone()
            }
        }
    }

    fn actions(&self) -> &ActionLog<CollectionAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<CollectionAction> {
        &mut self.actions
    }
}

impl Collection {
    pub fn create(
        user_id: UserId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Self::validate_description(description.as_deref())?;

        Ok(Self {
            id: CollectionId::new(),
            user_id,
            name,
            description,
            created_at: Utc::now(),
            actions: ActionLog::default(),
        })
    }

    fn validate_name(name: &str) -> Result<()> {
        validation::text(ENTITY, "name", name, 1..=64)
    }

    fn validate_description(description: Option<&str>) -> Result<()> {
        description.map_or(Ok(()), |d| validation::text(ENTITY, "description", d, 0..=1000))
    }

    /// Owner of the collection.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn update_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        Self::validate_name(&name)?;
        record(self, CollectionAction::UpdateName { name });
        Ok(())
    }

    pub fn update_description(&mut self, description: Option<String>) -> Result<()> {
        Self::validate_description(description.as_deref())?;
        record(self, CollectionAction::UpdateDescription { description });
        Ok(())
    }
}

pub struct CollectionMapper;

impl Mapper for CollectionMapper {
    type Entity = Collection;

    const TABLE: &'static str = "collections";

    fn map_to_domain(row: &Row) -> Result<Collection> {
        let err = mapping_error::<Self>;

        Ok(Collection {
            id: CollectionId::from(row_uuid::<Self>(row, "id")?),
            user_id: UserId::from(row_uuid::<Self>(row, "user_id")?),
            name: row.text("name").map_err(err)?,
            description: row.opt_text("description").map_err(err)?,
            created_at: row.timestamp("created_at").map_err(err)?,
            actions: ActionLog::default(),
        })
    }

    fn map_to_persistence(collection: &Collection) -> Row {
        Row::new()
            .with("id", collection.id.as_uuid())
            .with("user_id", collection.user_id.as_uuid())
            .with("name", collection.name.as_str())
            .with("description", collection.description.clone())
            .with("created_at", collection.created_at)
    }
}

impl ActionTranslator for CollectionMapper {
    fn action_statements(id: CollectionId, action: &CollectionAction) -> Vec<Statement> {
        vec![match action {
            CollectionAction::UpdateName { name } => set_column::<Self>(id, "name", name.as_str()),
            CollectionAction::UpdateDescription { description } => {
                set_column::<Self>(id, "description", description.clone())
            }
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_can_be_cleared() {
        let mut collection =
            Collection::create(UserId::new(), "Favourites", Some("Re-reads".to_string())).unwrap();

        collection.update_description(None).unwrap();

        assert_eq!(collection.description(), None);
        assert_eq!(
            CollectionMapper::action_statements(collection.id(), &collection.pending_actions()[0]),
            vec![set_column::<CollectionMapper>(
                collection.id(),
                "description",
                store::Value::Null
            )]
        );
    }
}
