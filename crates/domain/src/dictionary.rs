//! Genres and categories: uniquely named catalogue dictionaries.

use common::{CategoryId, EntityId, GenreId};
use serde::{Deserialize, Serialize};
use store::{Row, Statement};

use crate::entity::{ActionLog, DomainAction, Entity, record};
use crate::error::Result;
use crate::mapper::{ActionTranslator, Mapper, mapping_error, row_uuid, set_column};
use crate::validation;

/// Action shared by every dictionary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DictionaryAction {
    UpdateName { name: String },
}

impl DomainAction for DictionaryAction {
    fn action_type(&self) -> &'static str {
        match self {
            DictionaryAction::UpdateName { .. } => "UpdateName",
        }
    }
}

/// A uniquely named dictionary entry.
pub trait Dictionary: Entity<Action = DictionaryAction> + Serialize {
    fn create(name: String) -> Result<Self>;

    fn name(&self) -> &str;

    fn update_name(&mut self, name: String) -> Result<()>;
}

macro_rules! dictionary_entity {
    ($(#[$meta:meta])* $name:ident, $mapper:ident, $id:ident, $table:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize)]
        pub struct $name {
            id: $id,
            name: String,

            #[serde(skip)]
            actions: ActionLog<DictionaryAction>,
        }

        impl Entity for $name {
            type Id = $id;
            type Action = DictionaryAction;

            fn entity_type() -> &'static str {
                stringify!($name)
            }

            fn id(&self) -> $id {
                self.id
            }

            fn apply(&mut self, action: &DictionaryAction) {
                match action {
                    DictionaryAction::UpdateName { name } => self.name = name.clone(),
                }
            }

            fn actions(&self) -> &ActionLog<DictionaryAction> {
                &self.actions
            }

            fn actions_mut(&mut self) -> &mut ActionLog<DictionaryAction> {
                &mut self.actions
            }
        }

        impl Dictionary for $name {
            fn create(name: String) -> Result<Self> {
                validation::text(stringify!($name), "name", &name, 1..=64)?;
                Ok(Self {
                    id: $id::new(),
                    name,
                    actions: ActionLog::default(),
                })
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn update_name(&mut self, name: String) -> Result<()> {
                validation::text(stringify!($name), "name", &name, 1..=64)?;
                record(self, DictionaryAction::UpdateName { name });
                Ok(())
            }
        }

        pub struct $mapper;

        impl Mapper for $mapper {
            type Entity = $name;

            const TABLE: &'static str = $table;

            fn map_to_domain(row: &Row) -> Result<$name> {
                Ok($name {
                    id: $id::from(row_uuid::<Self>(row, "id")?),
                    name: row.text("name").map_err(mapping_error::<Self>)?,
                    actions: ActionLog::default(),
                })
            }

            fn map_to_persistence(entity: &$name) -> Row {
                Row::new()
                    .with("id", entity.id.as_uuid())
                    .with("name", entity.name.as_str())
            }
        }

        impl ActionTranslator for $mapper {
            fn action_statements(id: $id, action: &DictionaryAction) -> Vec<Statement> {
                match action {
                    DictionaryAction::UpdateName { name } => {
                        vec![set_column::<Self>(id, "name", name.as_str())]
                    }
                }
            }
        }
    };
}

dictionary_entity!(
    /// A literary genre; names are unique.
    Genre,
    GenreMapper,
    GenreId,
    "genres"
);

dictionary_entity!(
    /// A shelf category every book belongs to; names are unique.
    Category,
    CategoryMapper,
    CategoryId,
    "categories"
);
