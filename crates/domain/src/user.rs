//! User account aggregate.
//!
//! Passwords are hashed by the authentication service; this aggregate only
//! stores the resulting hash.

use chrono::{DateTime, Utc};
use common::{EntityId, UserId};
use serde::{Deserialize, Serialize};
use store::{Row, Statement};

use crate::entity::{ActionLog, DomainAction, Entity, record};
use crate::error::{DomainError, Result};
use crate::mapper::{ActionTranslator, Mapper, mapping_error, parse_text, row_uuid, set_column};
use crate::validation;
use crate::value_objects::UserRole;

const ENTITY: &str = "User";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum UserAction {
    UpdateEmail { email: String },
    UpdateFirstName { first_name: String },
    UpdateLastName { last_name: String },
    UpdatePassword { password_hash: String },
    UpdateRole { role: UserRole },
    VerifyEmail,
}

impl DomainAction for UserAction {
    fn action_type(&self) -> &'static str {
        match self {
            UserAction::UpdateEmail { .. } => "UpdateEmail",
            UserAction::UpdateFirstName { .. } => "UpdateFirstName",
            UserAction::UpdateLastName { .. } => "UpdateLastName",
            UserAction::UpdatePassword { .. } => "UpdatePassword",
            UserAction::UpdateRole { .. } => "UpdateRole",
            UserAction::VerifyEmail => "VerifyEmail",
        }
    }
}

/// Input for registering a user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    id: UserId,
    email: String,
    first_name: String,
    last_name: String,
    #[serde(skip)]
    password_hash: String,
    role: UserRole,
    is_email_verified: bool,
    created_at: DateTime<Utc>,

    #[serde(skip)]
    actions: ActionLog<UserAction>,
}

impl Entity for User {
    type Id = UserId;
    type Action = UserAction;

    fn entity_type() -> &'static str {
        ENTITY
    }

    fn id(&self) -> UserId {
        self.id
    }

    fn apply(&mut self, action: &UserAction) {
        match action {
            UserAction::UpdateEmail { email } => {
                self.email = email.clone();
                self.is_email_verified = false;
            }
            UserAction::UpdateFirstName { first_name } => self.first_name = first_name.clone(),
            UserAction::UpdateLastName { last_name } => self.last_name = last_name.clone(),
            UserAction::UpdatePassword { password_hash } => {
                self.password_hash = password_hash.clone()
            }
            UserAction::UpdateRole { role } => self.role = *role,
            UserAction::VerifyEmail => self.is_email_verified = true,
        }
    }

    fn actions(&self) -> &ActionLog<UserAction> {
        &self.actions
    }

    fn actions_mut(&mut self) -> &mut ActionLog<UserAction> {
        &mut self.actions
    }
}

impl User {
    /// Registers a user with the `User` role and an unverified email.
    pub fn create(new: NewUser) -> Result<Self> {
        validation::email(ENTITY, &new.email)?;
        Self::validate_name("first name", &new.first_name)?;
        Self::validate_name("last name", &new.last_name)?;
        Self::validate_password_hash(&new.password_hash)?;

        Ok(Self {
            id: UserId::new(),
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            role: UserRole::User,
            is_email_verified: false,
            created_at: Utc::now(),
            actions: ActionLog::default(),
        })
    }

    fn validate_name(field: &str, name: &str) -> Result<()> {
        validation::text(ENTITY, field, name, 1..=64)
    }

    fn validate_password_hash(hash: &str) -> Result<()> {
        if hash.is_empty() {
            return Err(DomainError::input_not_valid(
                ENTITY,
                "password hash must not be empty",
            ));
        }
        Ok(())
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_email_verified(&self) -> bool {
        self.is_email_verified
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Changes the email; the new address starts unverified.
    pub fn update_email(&mut self, email: impl Into<String>) -> Result<()> {
        let email = email.into();
        validation::email(ENTITY, &email)?;
        record(self, UserAction::UpdateEmail { email });
        Ok(())
    }

    pub fn update_first_name(&mut self, first_name: impl Into<String>) -> Result<()> {
        let first_name = first_name.into();
        Self::validate_name("first name", &first_name)?;
        record(self, UserAction::UpdateFirstName { first_name });
        Ok(())
    }

    pub fn update_last_name(&mut self, last_name: impl Into<String>) -> Result<()> {
        let last_name = last_name.into();
        Self::validate_name("last name", &last_name)?;
        record(self, UserAction::UpdateLastName { last_name });
        Ok(())
    }

    pub fn update_password(&mut self, password_hash: impl Into<String>) -> Result<()> {
        let password_hash = password_hash.into();
        Self::validate_password_hash(&password_hash)?;
        record(self, UserAction::UpdatePassword { password_hash });
        Ok(())
    }

    pub fn update_role(&mut self, role: UserRole) -> Result<()> {
        record(self, UserAction::UpdateRole { role });
        Ok(())
    }

    pub fn verify_email(&mut self) -> Result<()> {
        record(self, UserAction::VerifyEmail);
        Ok(())
    }
}

pub struct UserMapper;

impl Mapper for UserMapper {
    type Entity = User;

    const TABLE: &'static str = "users";

    fn map_to_domain(row: &Row) -> Result<User> {
        let err = mapping_error::<Self>;

        Ok(User {
            id: UserId::from(row_uuid::<Self>(row, "id")?),
            email: row.text("email").map_err(err)?,
            first_name: row.text("first_name").map_err(err)?,
            last_name: row.text("last_name").map_err(err)?,
            password_hash: row.text("password_hash").map_err(err)?,
            role: parse_text::<Self, _>(row, "role")?,
            is_email_verified: row.boolean("is_email_verified").map_err(err)?,
            created_at: row.timestamp("created_at").map_err(err)?,
            actions: ActionLog::default(),
        })
    }

    fn map_to_persistence(user: &User) -> Row {
        Row::new()
            .with("id", user.id.as_uuid())
            .with("email", user.email.as_str())
            .with("first_name", user.first_name.as_str())
            .with("last_name", user.last_name.as_str())
            .with("password_hash", user.password_hash.as_str())
            .with("role", user.role.as_str())
            .with("is_email_verified", user.is_email_verified)
            .with("created_at", user.created_at)
    }
}

impl ActionTranslator for UserMapper {
    fn action_statements(id: UserId, action: &UserAction) -> Vec<Statement> {
        let statement = match action {
            UserAction::UpdateEmail { email } => Statement::update(
                Self::TABLE,
                vec![store::Filter::eq(Self::PRIMARY_KEY, id.as_uuid())],
                Row::new()
                    .with("email", email.as_str())
                    .with("is_email_verified", false),
            ),
            UserAction::UpdateFirstName { first_name } => {
                set_column::<Self>(id, "first_name", first_name.as_str())
            }
            UserAction::UpdateLastName { last_name } => {
                set_column::<Self>(id, "last_name", last_name.as_str())
            }
            UserAction::UpdatePassword { password_hash } => {
                set_column::<Self>(id, "password_hash", password_hash.as_str())
            }
            UserAction::UpdateRole { role } => set_column::<Self>(id, "role", role.as_str()),
            UserAction::VerifyEmail => set_column::<Self>(id, "is_email_verified", true),
        };
        vec![statement]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: "Paul".to_string(),
            last_name: "Atreides".to_string(),
            password_hash: "$argon2id$v=19$hash".to_string(),
        }
    }

    #[test]
    fn registers_unverified_regular_user() {
        let user = User::create(new_user("paul@arrakis.example")).unwrap();
        assert_eq!(user.role(), UserRole::User);
        assert!(!user.is_email_verified());
    }

    #[test]
    fn changing_email_resets_verification() {
        let mut user = User::create(new_user("paul@arrakis.example")).unwrap();
        user.verify_email().unwrap();
        user.update_email("muaddib@arrakis.example").unwrap();

        assert!(!user.is_email_verified());
        assert_eq!(user.pending_actions().len(), 2);
    }

    #[test]
    fn rejects_empty_password_hash() {
        let result = User::create(NewUser {
            password_hash: String::new(),
            ..new_user("paul@arrakis.example")
        });
        assert!(matches!(result, Err(DomainError::InputNotValid { .. })));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User::create(new_user("paul@arrakis.example")).unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
