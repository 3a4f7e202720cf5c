/// Postgres implementations of the store seams.
///
/// Each store is a thin newtype over the shared [`PgPool`]; the query logic
/// lives with the models.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::ProjectRole;
use crate::models::member::{NewMember, ProjectMember};
use crate::models::note::ProjectNote;
use crate::models::project::{NewProject, Project};
use crate::models::subtask::{NewSubTask, SubTask};
use crate::models::task::{NewTask, Task};
use crate::models::user::{NewUser, User};

use super::{CredentialStore, MembershipStore, SessionStore, StoreError, WorkspaceStore};

/// [`CredentialStore`] backed by the `users` table
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        Ok(User::create(&self.pool, user).await?)
    }

    async fn by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email_or_username(&self.pool, email, username).await?)
    }

    async fn by_verification_hash(&self, token_hash: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_verification_hash(&self.pool, token_hash).await?)
    }

    async fn by_reset_hash(&self, token_hash: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_reset_hash(&self.pool, token_hash).await?)
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(User::set_verification_token(&self.pool, id, token_hash, expires_at).await?)
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(User::mark_email_verified(&self.pool, id).await?)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(User::set_reset_token(&self.pool, id, token_hash, expires_at).await?)
    }

    async fn clear_reset_token(&self, id: Uuid) -> Result<(), StoreError> {
        Ok(User::clear_reset_token(&self.pool, id).await?)
    }

    async fn replace_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        Ok(User::replace_password_hash(&self.pool, id, password_hash).await?)
    }
}

/// [`SessionStore`] backed by the refresh-token column on `users`
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn current_refresh_token(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(User::current_refresh_token(&self.pool, user_id).await?)
    }

    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        Ok(User::store_refresh_token(&self.pool, user_id, token).await?)
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), StoreError> {
        Ok(User::clear_refresh_token(&self.pool, user_id).await?)
    }
}

/// [`MembershipStore`] backed by the `project_members` table
#[derive(Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn find(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<ProjectMember>, StoreError> {
        Ok(ProjectMember::find(&self.pool, user_id, project_id).await?)
    }

    async fn insert(&self, member: NewMember) -> Result<ProjectMember, StoreError> {
        Ok(ProjectMember::create(&self.pool, member).await?)
    }

    async fn set_role(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<ProjectMember>, StoreError> {
        Ok(ProjectMember::set_role(&self.pool, user_id, project_id, role).await?)
    }

    async fn remove(&self, user_id: Uuid, project_id: Uuid) -> Result<bool, StoreError> {
        Ok(ProjectMember::remove(&self.pool, user_id, project_id).await?)
    }

    async fn remove_by_project(&self, project_id: Uuid) -> Result<u64, StoreError> {
        Ok(ProjectMember::remove_by_project(&self.pool, project_id).await?)
    }

    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, StoreError> {
        Ok(ProjectMember::list_by_project(&self.pool, project_id).await?)
    }
}

/// [`WorkspaceStore`] backed by the project/task/subtask/note tables
#[derive(Clone)]
pub struct PgWorkspaceStore {
    pool: PgPool,
}

impl PgWorkspaceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkspaceStore for PgWorkspaceStore {
    async fn project_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError> {
        Ok(Project::create(&self.pool, project).await?)
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn task_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        Ok(Task::create(&self.pool, task).await?)
    }

    async fn task_ids_by_project(&self, project_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(Task::ids_by_project(&self.pool, project_id).await?)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn delete_tasks_by_project(&self, project_id: Uuid) -> Result<u64, StoreError> {
        Ok(Task::delete_by_project(&self.pool, project_id).await?)
    }

    async fn subtask_by_id(&self, id: Uuid) -> Result<Option<SubTask>, StoreError> {
        Ok(SubTask::find_by_id(&self.pool, id).await?)
    }

    async fn insert_subtask(&self, subtask: NewSubTask) -> Result<SubTask, StoreError> {
        Ok(SubTask::create(&self.pool, subtask).await?)
    }

    async fn delete_subtask(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(SubTask::delete(&self.pool, id).await?)
    }

    async fn delete_subtasks_by_task(&self, task_id: Uuid) -> Result<u64, StoreError> {
        Ok(SubTask::delete_by_task(&self.pool, task_id).await?)
    }

    async fn delete_subtasks_by_tasks(&self, task_ids: &[Uuid]) -> Result<u64, StoreError> {
        Ok(SubTask::delete_by_tasks(&self.pool, task_ids).await?)
    }

    async fn delete_notes_by_project(&self, project_id: Uuid) -> Result<u64, StoreError> {
        Ok(ProjectNote::delete_by_project(&self.pool, project_id).await?)
    }
}
