/// Storage seams consumed by the session, authorization, and lifecycle
/// components.
///
/// Each trait states the read/write contract one component depends on;
/// the Postgres implementations in [`postgres`] delegate to the sqlx
/// models. The components only assume per-call atomicity — nothing here
/// offers a cross-entity transaction.
///
/// Splitting `SessionStore` out of `CredentialStore` isolates the
/// single-refresh-token-slot session model: multi-session support would
/// replace that one implementation without touching the session manager.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::member::{NewMember, ProjectMember};
use crate::models::project::{NewProject, Project};
use crate::models::subtask::{NewSubTask, SubTask};
use crate::models::task::{NewTask, Task};
use crate::models::user::{NewUser, User};

/// Error type shared by all stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// The storage backend failed
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.to_string());
            }
        }

        StoreError::Backend(err.to_string())
    }
}

/// User identity and credential state.
///
/// Token parameters are always digests; raw one-time tokens never reach
/// the store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Single lookup matching either identity field, for duplicate checks.
    async fn by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn by_verification_hash(&self, token_hash: &str) -> Result<Option<User>, StoreError>;

    async fn by_reset_hash(&self, token_hash: &str) -> Result<Option<User>, StoreError>;

    async fn set_verification_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Flips the verified flag and clears the verification token fields.
    async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError>;

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn clear_reset_token(&self, id: Uuid) -> Result<(), StoreError>;

    async fn replace_password_hash(&self, id: Uuid, password_hash: &str)
        -> Result<(), StoreError>;
}

/// The single refresh-token slot per user.
///
/// Storing overwrites unconditionally; the previous session, if any, is
/// thereby revoked.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn current_refresh_token(&self, user_id: Uuid) -> Result<Option<String>, StoreError>;

    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> Result<(), StoreError>;

    /// Idempotent; clearing an empty slot is not an error.
    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), StoreError>;
}

/// (user, project, role) membership rows, unique per pair.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn find(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<ProjectMember>, StoreError>;

    async fn insert(&self, member: NewMember) -> Result<ProjectMember, StoreError>;

    async fn set_role(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        role: crate::auth::authorization::ProjectRole,
    ) -> Result<Option<ProjectMember>, StoreError>;

    async fn remove(&self, user_id: Uuid, project_id: Uuid) -> Result<bool, StoreError>;

    async fn remove_by_project(&self, project_id: Uuid) -> Result<u64, StoreError>;

    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, StoreError>;
}

/// The project → task → subtask containment tree, plus the note and bulk
/// delete operations the project cascade needs.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn project_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError>;

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn task_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn task_ids_by_project(&self, project_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_tasks_by_project(&self, project_id: Uuid) -> Result<u64, StoreError>;

    async fn subtask_by_id(&self, id: Uuid) -> Result<Option<SubTask>, StoreError>;

    async fn insert_subtask(&self, subtask: NewSubTask) -> Result<SubTask, StoreError>;

    async fn delete_subtask(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_subtasks_by_task(&self, task_id: Uuid) -> Result<u64, StoreError>;

    async fn delete_subtasks_by_tasks(&self, task_ids: &[Uuid]) -> Result<u64, StoreError>;

    async fn delete_notes_by_project(&self, project_id: Uuid) -> Result<u64, StoreError>;
}
