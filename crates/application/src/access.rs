//! Caller identity and the access-control collaborator.

use common::UserId;
use domain::{DomainError, Result, UserRole};
use serde::{Deserialize, Serialize};

/// An authenticated principal as asserted by the token service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl Identity {
    pub fn new(user_id: UserId, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Whoever invoked a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated(Identity),
}

impl Caller {
    pub fn user(user_id: UserId, email: impl Into<String>) -> Self {
        Caller::Authenticated(Identity::new(user_id, email, UserRole::User))
    }

    pub fn admin(user_id: UserId, email: impl Into<String>) -> Self {
        Caller::Authenticated(Identity::new(user_id, email, UserRole::Admin))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(identity) => Some(identity),
        }
    }
}

/// What a handler demands of its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any signed-in user.
    Authenticated,
    /// Moderation and catalogue administration.
    Admin,
    /// The owning user, or an administrator.
    OwnerOrAdmin(UserId),
    /// The user holding this email address, or an administrator.
    EmailOrAdmin(String),
}

/// Decides whether a caller satisfies a requirement.
pub trait AccessControl: Send + Sync {
    /// Returns the caller's identity on success.
    ///
    /// Fails with `Unauthorized` for anonymous callers and `Forbidden` when
    /// an authenticated caller lacks the required role or ownership.
    fn check<'a>(&self, caller: &'a Caller, requirement: &Requirement) -> Result<&'a Identity>;
}

/// Grants access based on the caller's role and ownership only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleBasedAccessControl;

impl AccessControl for RoleBasedAccessControl {
    fn check<'a>(&self, caller: &'a Caller, requirement: &Requirement) -> Result<&'a Identity> {
        let identity = caller.identity().ok_or(DomainError::Unauthorized)?;

        let allowed = match requirement {
            Requirement::Authenticated => true,
            Requirement::Admin => identity.is_admin(),
            Requirement::OwnerOrAdmin(owner) => identity.is_admin() || identity.user_id == *owner,
            Requirement::EmailOrAdmin(email) => {
                identity.is_admin() || identity.email.eq_ignore_ascii_case(email)
            }
        };

        if allowed {
            Ok(identity)
        } else {
            tracing::debug!(user_id = %identity.user_id, ?requirement, "access denied");
            Err(DomainError::forbidden(format!(
                "user {} does not satisfy {requirement:?}",
                identity.user_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::EntityId;

    #[test]
    fn anonymous_caller_is_unauthorized() {
        let result = RoleBasedAccessControl.check(&Caller::Anonymous, &Requirement::Authenticated);
        assert!(matches!(result, Err(DomainError::Unauthorized)));
    }

    #[test]
    fn admin_requirement_rejects_plain_users() {
        let caller = Caller::user(UserId::new(), "reader@example.com");

        let result = RoleBasedAccessControl.check(&caller, &Requirement::Admin);

        assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    }

    #[test]
    fn owner_passes_and_stranger_is_forbidden() {
        let owner = UserId::new();
        let requirement = Requirement::OwnerOrAdmin(owner);

        assert!(
            RoleBasedAccessControl
                .check(&Caller::user(owner, "owner@example.com"), &requirement)
                .is_ok()
        );
        assert!(
            RoleBasedAccessControl
                .check(&Caller::user(UserId::new(), "x@example.com"), &requirement)
                .is_err()
        );
        assert!(
            RoleBasedAccessControl
                .check(&Caller::admin(UserId::new(), "admin@example.com"), &requirement)
                .is_ok()
        );
    }

    #[test]
    fn email_match_ignores_ascii_case() {
        let caller = Caller::user(UserId::new(), "Reader@Example.com");
        let requirement = Requirement::EmailOrAdmin("reader@example.com".to_string());

        let identity = RoleBasedAccessControl.check(&caller, &requirement).unwrap();

        assert_eq!(identity.email, "Reader@Example.com");
    }
}
