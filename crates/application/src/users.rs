//! User account service.

use std::sync::Arc;

use common::UserId;
use domain::{
    ActionTranslator, Bookshelf, BookshelfMapper, DomainError, Entity, NewUser, Patch, Repository,
    Result, User, UserMapper, UserRole,
};
use serde::Deserialize;
use store::{RowStore, Statement};

use crate::access::{AccessControl, Caller, Requirement};

/// Command to edit a user account; absent fields are left untouched.
///
/// Owners may change their names. Email and role are reserved for
/// administrators.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUser {
    #[serde(default)]
    pub first_name: Patch<String>,
    #[serde(default)]
    pub last_name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub role: Patch<UserRole>,
}

impl UpdateUser {
    fn touches_privileged_fields(&self) -> bool {
        self.email.is_present() || self.role.is_present()
    }
}

/// Service for managing user accounts.
pub struct UserService<S: RowStore> {
    users: Repository<S, UserMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> UserService<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            users: Repository::new(store),
            access,
        }
    }

    /// Registers a user together with their reading-state bookshelves.
    ///
    /// Called by the token service on sign-up, acting as an administrator.
    #[tracing::instrument(skip(self, caller, new), fields(email = %new.email))]
    pub async fn register_user(&self, caller: &Caller, new: NewUser) -> Result<User> {
        self.access.check(caller, &Requirement::Admin)?;

        let mut user = User::create(new)?;
        let shelves: Vec<Statement> = Bookshelf::defaults_for(user.id())
            .iter()
            .flat_map(BookshelfMapper::insert_statements)
            .collect();
        self.users.create_with(&mut user, shelves).await?;

        tracing::info!(user_id = %user.id(), "user registered");
        Ok(user)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn update_user(
        &self,
        caller: &Caller,
        user_id: UserId,
        cmd: UpdateUser,
    ) -> Result<User> {
        let identity = self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;
        if cmd.touches_privileged_fields() && !identity.is_admin() {
            return Err(DomainError::forbidden("only administrators may change email or role"));
        }

        let mut user = self.users.find_by_id(user_id).await?;
        if let Patch::Present(first_name) = cmd.first_name {
            user.update_first_name(first_name)?;
        }
        if let Patch::Present(last_name) = cmd.last_name {
            user.update_last_name(last_name)?;
        }
        if let Patch::Present(email) = cmd.email {
            user.update_email(email)?;
        }
        if let Patch::Present(role) = cmd.role {
            user.update_role(role)?;
        }
        self.users.save(&mut user).await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, caller, password_hash))]
    pub async fn change_password(
        &self,
        caller: &Caller,
        user_id: UserId,
        password_hash: String,
    ) -> Result<()> {
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;

        let mut user = self.users.find_by_id(user_id).await?;
        user.update_password(password_hash)?;
        self.users.save(&mut user).await
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn verify_email(&self, caller: &Caller, user_id: UserId) -> Result<User> {
        self.access.check(caller, &Requirement::Admin)?;

        let mut user = self.users.find_by_id(user_id).await?;
        user.verify_email()?;
        self.users.save(&mut user).await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, caller))]
    pub async fn find_user_by_id(&self, caller: &Caller, user_id: UserId) -> Result<User> {
        self.access.check(caller, &Requirement::OwnerOrAdmin(user_id))?;
        self.users.find_by_id(user_id).await
    }
}
