/// Role-based authorization for project-scoped operations.
///
/// A caller's privilege in a project is exactly the role on their
/// (user, project) membership row. The role set is closed and deliberately
/// carries no hierarchy: every protected operation names the roles it
/// accepts, so granting `admin` access to something `project_admin` can do
/// is always an explicit decision at the call site, never an implicit
/// "higher role wins" rule.
///
/// # Example
///
/// ```no_run
/// use taskcamp_shared::auth::authorization::{AuthorizationGuard, ProjectRole, PROJECT_MANAGERS};
/// use uuid::Uuid;
///
/// # async fn example(guard: AuthorizationGuard, user_id: Uuid, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Only admins and project admins may delete the project
/// let role = guard.require_role(user_id, project_id, PROJECT_MANAGERS).await?;
/// if role == ProjectRole::Admin {
///     // extra privilege available without a second lookup
/// }
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{MembershipStore, StoreError};

/// Roles a project membership can carry.
///
/// Stored as the Postgres enum `project_role`. `admin` is kept as a
/// per-project role value resolved through the same membership lookup as
/// the others; there is no cross-project superuser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Admin,
    ProjectAdmin,
    Member,
}

impl ProjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Admin => "admin",
            ProjectRole::ProjectAdmin => "project_admin",
            ProjectRole::Member => "member",
        }
    }
}

/// Roles allowed to manage a project itself: delete it, and add, remove,
/// or re-role its members.
pub const PROJECT_MANAGERS: &[ProjectRole] = &[ProjectRole::Admin, ProjectRole::ProjectAdmin];

/// Every role; for operations any member of the project may perform.
pub const ANY_MEMBER: &[ProjectRole] = &[
    ProjectRole::Admin,
    ProjectRole::ProjectAdmin,
    ProjectRole::Member,
];

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller holds no membership in the target project
    #[error("not a member of project {0}")]
    NotAMember(Uuid),

    /// Caller's role is not in the operation's allowed set
    #[error("role {actual:?} is not allowed here")]
    Forbidden {
        actual: ProjectRole,
        allowed: Vec<ProjectRole>,
    },

    /// Membership lookup failed
    #[error("membership lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// Resolves and enforces a caller's role for a target project.
///
/// Identity is established before this guard runs (the access-token
/// middleware); the guard only answers "what may this user do in this
/// project".
#[derive(Clone)]
pub struct AuthorizationGuard {
    memberships: Arc<dyn MembershipStore>,
}

impl AuthorizationGuard {
    pub fn new(memberships: Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    /// Looks up the caller's role via the unique (user, project) pair.
    ///
    /// # Errors
    ///
    /// `AuthzError::NotAMember` when no membership row exists.
    pub async fn resolve_role(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectRole, AuthzError> {
        let membership = self
            .memberships
            .find(user_id, project_id)
            .await?
            .ok_or(AuthzError::NotAMember(project_id))?;

        Ok(membership.role)
    }

    /// Resolves the caller's role and requires it to be in `allowed`.
    ///
    /// Returns the resolved role so callers can branch on privilege level
    /// without a second lookup.
    ///
    /// # Errors
    ///
    /// - `AuthzError::NotAMember` when the caller has no membership
    /// - `AuthzError::Forbidden` when the role is outside `allowed`
    pub async fn require_role(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        allowed: &[ProjectRole],
    ) -> Result<ProjectRole, AuthzError> {
        let role = self.resolve_role(user_id, project_id).await?;

        if !allowed.contains(&role) {
            return Err(AuthzError::Forbidden {
                actual: role,
                allowed: allowed.to_vec(),
            });
        }

        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_match_wire_format() {
        assert_eq!(ProjectRole::Admin.as_str(), "admin");
        assert_eq!(ProjectRole::ProjectAdmin.as_str(), "project_admin");
        assert_eq!(ProjectRole::Member.as_str(), "member");

        assert_eq!(
            serde_json::to_string(&ProjectRole::ProjectAdmin).unwrap(),
            "\"project_admin\""
        );
    }

    #[test]
    fn allow_lists_are_explicit() {
        // No hierarchy: member is outside the managers set, admin is not
        // implicitly everywhere.
        assert!(PROJECT_MANAGERS.contains(&ProjectRole::Admin));
        assert!(PROJECT_MANAGERS.contains(&ProjectRole::ProjectAdmin));
        assert!(!PROJECT_MANAGERS.contains(&ProjectRole::Member));

        assert_eq!(ANY_MEMBER.len(), 3);
    }
}
