//! Author aggregate.

use chrono::{DateTime, Utc};
use common::{AuthorId, EntityId};
use serde::{Deserialize, Serialize};
use store::{Row, Statement};

use crate::entity::{ActionLog, DomainAction, Entity, record};
use crate::error::Result;
use crate::mapper::{ActionTranslator, Mapper, mapping_error, row_uuid, set_column};
use crate::validation;

const ENTITY: &str = "Author";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AuthorAction {
    UpdateName { name: String },
    UpdateApproval { is_approved: bool },
}

impl DomainAction for AuthorAction {
    fn action_type(&self) -> &'static str {
        match self {
            AuthorAction::UpdateName { .. } => "UpdateName",
            AuthorAction::UpdateApproval { .. } => "UpdateApproval",
        }
    }
}

/// An author in the catalogue. Proposed authors start unapproved.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    id: AuthorId,
    name: String,
    is_approved: bool,
    created_at: DateTime<Utc>,

    #[serde(skip)]
    actions: ActionLog<AuthorAction>,
}

impl Entity for Author {
    type Id = AuthorId;
    type Action = AuthorAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> AuthorId {
        self.id
    }

    fn apply(&mut self, action: &AuthorAction) {
        match action {
            AuthorAction::UpdateName { name } => self.name = name.clone(),
            AuthorAction::UpdateApproval { is_approved } => self.is_approved = *is_approved,
        }
    }

    fn actions(&self) -> &ActionLog<AuthorAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<AuthorAction> {
        &mut self.actions
    }
}

impl Author {
    pub fn create(name: impl Into<String>, is_approved: bool) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;

        Ok(Self {
            id: AuthorId::new(),
            name,
            is_approved,
            created_at: Utc::now(),
            actions: ActionLog::default(),
        })
    }

    fn validate_name(name: &str) -> Result<()> {
        validation::text(ENTITY, "name", name, 1..=128)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn update_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        Self::validate_name(&name)?;
        record(self, AuthorAction::UpdateName { name });
        Ok(())
    }

    pub fn update_approval(&mut self, is_approved: bool) -> Result<()> {
        record(self, AuthorAction::UpdateApproval { is_approved });
        Ok(())
    }
}

pub struct AuthorMapper;

impl Mapper for AuthorMapper {
    type Entity = Author;

    const TABLE: &'static str = "authors";

    fn map_to_domain(row: &Row) -> Result<Author> {
        let err = mapping_error::<Self>;

        Ok(Author {
            id: AuthorId::from(row_uuid::<Self>(row, "id")?),
            name: row.text("name").map_err(err)?,
            is_approved: row.boolean("is_approved").map_err(err)?,
            created_at: row.timestamp("created_at").map_err(err)?,
            actions: ActionLog::default(),
        })
    }

    fn map_to_persistence(author: &Author) -> Row {
        Row::new()
            .with("id", author.id.as_uuid())
            .with("name", author.name.as_str())
            .with("is_approved", author.is_approved)
            .with("created_at", author.created_at)
    }
}

impl ActionTranslator for AuthorMapper {
    fn action_statements(id: AuthorId, action: &AuthorAction) -> Vec<Statement> {
        vec![match action {
            AuthorAction::UpdateName { name } => set_column::<Self>(id, "name", name.as_str()),
            AuthorAction::UpdateApproval { is_approved } => {
                set_column::<Self>(id, "is_approved", *is_approved)
            }
        }]
    }
}
