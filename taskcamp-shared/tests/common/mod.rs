//! Shared test fixtures: in-memory store fakes and a recording mailer.
//!
//! The session, authorization, and lifecycle components only see the store
//! traits, so these fakes let the integration tests exercise full flows
//! (register, verify, login, refresh, cascading deletes) without a running
//! Postgres.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use taskcamp_shared::auth::authorization::{AuthorizationGuard, ProjectRole};
use taskcamp_shared::auth::session::{SessionManager, TokenSettings};
use taskcamp_shared::lifecycle::LifecycleCoordinator;
use taskcamp_shared::mail::{MailError, MailMessage, Mailer};
use taskcamp_shared::models::member::{NewMember, ProjectMember};
use taskcamp_shared::models::note::ProjectNote;
use taskcamp_shared::models::project::{NewProject, Project};
use taskcamp_shared::models::subtask::{NewSubTask, SubTask};
use taskcamp_shared::models::task::{NewTask, Task};
use taskcamp_shared::models::user::{NewUser, User};
use taskcamp_shared::store::{
    CredentialStore, MembershipStore, SessionStore, StoreError, WorkspaceStore,
};

pub const ACCESS_SECRET: &str = "test-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &str = "test-refresh-secret-0123456789abcde";
pub const BASE_URL: &str = "https://app.test";

/// Polls `condition` until it holds or the timeout passes.
pub async fn wait_for<F, Fut>(condition: F, timeout_secs: u64) -> Result<(), String>
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);

    while Instant::now() < deadline {
        if condition().await {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    Err("condition not met before timeout".to_string())
}

/// Pulls the raw one-time token out of a recorded mail body.
///
/// Verification and reset mails place the link on its own line, ending in
/// the raw token.
pub fn token_from_mail(message: &MailMessage) -> String {
    message
        .body
        .lines()
        .find(|line| line.contains("/verify-email/") || line.contains("/reset-password/"))
        .and_then(|line| line.trim().rsplit('/').next())
        .expect("mail body should contain a token link")
        .to_string()
}

/// Mailer that records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// In-memory [`CredentialStore`] and [`SessionStore`]
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    fn find_where<F: Fn(&User) -> bool>(&self, pred: F) -> Option<User> {
        self.users.lock().unwrap().values().find(|u| pred(u)).cloned()
    }

    fn mutate(&self, id: Uuid, f: impl FnOnce(&mut User)) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend("no such user".to_string()))?;
        f(user);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryUserStore {
    async fn insert(&self, data: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();

        if users
            .values()
            .any(|u| u.email == data.email || u.username == data.username)
        {
            return Err(StoreError::Duplicate("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            username: data.username,
            full_name: data.full_name,
            password_hash: data.password_hash,
            email_verified: false,
            email_verification_token: None,
            email_verification_expiry: None,
            forgot_password_token: None,
            forgot_password_expiry: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find_where(|u| u.email == email))
    }

    async fn by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self.find_where(|u| u.email == email || u.username == username))
    }

    async fn by_verification_hash(&self, token_hash: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find_where(|u| u.email_verification_token.as_deref() == Some(token_hash)))
    }

    async fn by_reset_hash(&self, token_hash: &str) -> Result<Option<User>, StoreError> {
        Ok(self.find_where(|u| u.forgot_password_token.as_deref() == Some(token_hash)))
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.mutate(id, |u| {
            u.email_verification_token = Some(token_hash.to_string());
            u.email_verification_expiry = Some(expires_at);
        })
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), StoreError> {
        self.mutate(id, |u| {
            u.email_verified = true;
            u.email_verification_token = None;
            u.email_verification_expiry = None;
        })
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.mutate(id, |u| {
            u.forgot_password_token = Some(token_hash.to_string());
            u.forgot_password_expiry = Some(expires_at);
        })
    }

    async fn clear_reset_token(&self, id: Uuid) -> Result<(), StoreError> {
        self.mutate(id, |u| {
            u.forgot_password_token = None;
            u.forgot_password_expiry = None;
        })
    }

    async fn replace_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        self.mutate(id, |u| {
            u.password_hash = password_hash.to_string();
        })
    }
}

#[async_trait]
impl SessionStore for MemoryUserStore {
    async fn current_refresh_token(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(&user_id)
            .and_then(|u| u.refresh_token.clone()))
    }

    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> Result<(), StoreError> {
        self.mutate(user_id, |u| {
            u.refresh_token = Some(token.to_string());
        })
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), StoreError> {
        // Clearing an unknown user's slot is still idempotent
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.refresh_token = None;
        }
        Ok(())
    }
}

/// In-memory [`MembershipStore`]
#[derive(Default)]
pub struct MemoryMembershipStore {
    rows: Mutex<Vec<ProjectMember>>,
}

impl MemoryMembershipStore {
    pub fn count_for(&self, user_id: Uuid, project_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id && m.project_id == project_id)
            .count()
    }

    pub fn count_for_project(&self, project_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.project_id == project_id)
            .count()
    }
}

#[async_trait]
impl MembershipStore for MemoryMembershipStore {
    async fn find(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<ProjectMember>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.user_id == user_id && m.project_id == project_id)
            .cloned())
    }

    async fn insert(&self, member: NewMember) -> Result<ProjectMember, StoreError> {
        let mut rows = self.rows.lock().unwrap();

        if rows
            .iter()
            .any(|m| m.user_id == member.user_id && m.project_id == member.project_id)
        {
            return Err(StoreError::Duplicate(
                "project_members_user_id_project_id_key".to_string(),
            ));
        }

        let now = Utc::now();
        let row = ProjectMember {
            id: Uuid::new_v4(),
            user_id: member.user_id,
            project_id: member.project_id,
            role: member.role,
            created_at: now,
            updated_at: now,
        };

        rows.push(row.clone());
        Ok(row)
    }

    async fn set_role(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<ProjectMember>, StoreError> {
        let mut rows = self.rows.lock().unwrap();

        if let Some(row) = rows
            .iter_mut()
            .find(|m| m.user_id == user_id && m.project_id == project_id)
        {
            row.role = role;
            row.updated_at = Utc::now();
            return Ok(Some(row.clone()));
        }

        Ok(None)
    }

    async fn remove(&self, user_id: Uuid, project_id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|m| !(m.user_id == user_id && m.project_id == project_id));
        Ok(rows.len() < before)
    }

    async fn remove_by_project(&self, project_id: Uuid) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|m| m.project_id != project_id);
        Ok((before - rows.len()) as u64)
    }

    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<ProjectMember>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }
}

/// In-memory [`WorkspaceStore`]
#[derive(Default)]
pub struct MemoryWorkspaceStore {
    projects: Mutex<HashMap<Uuid, Project>>,
    tasks: Mutex<HashMap<Uuid, Task>>,
    subtasks: Mutex<HashMap<Uuid, SubTask>>,
    notes: Mutex<HashMap<Uuid, ProjectNote>>,
}

impl MemoryWorkspaceStore {
    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn subtask_count(&self) -> usize {
        self.subtasks.lock().unwrap().len()
    }

    pub fn note_count(&self) -> usize {
        self.notes.lock().unwrap().len()
    }

    /// Seeds a note directly; note creation itself is route-level glue.
    pub fn add_note(&self, project_id: Uuid, created_by: Uuid) -> ProjectNote {
        let now = Utc::now();
        let note = ProjectNote {
            id: Uuid::new_v4(),
            project_id,
            content: "a note".to_string(),
            created_by,
            created_at: now,
            updated_at: now,
        };

        self.notes.lock().unwrap().insert(note.id, note.clone());
        note
    }
}

#[async_trait]
impl WorkspaceStore for MemoryWorkspaceStore {
    async fn project_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.lock().unwrap().get(&id).cloned())
    }

    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let now = Utc::now();
        let row = Project {
            id: Uuid::new_v4(),
            name: project.name,
            description: project.description,
            created_by: project.created_by,
            created_at: now,
            updated_at: now,
        };

        self.projects.lock().unwrap().insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.projects.lock().unwrap().remove(&id).is_some())
    }

    async fn task_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let now = Utc::now();
        let row = Task {
            id: Uuid::new_v4(),
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            assigned_to: task.assigned_to,
            assigned_by: task.assigned_by,
            status: task.status,
            attachments: sqlx::types::Json(task.attachments),
            created_at: now,
            updated_at: now,
        };

        self.tasks.lock().unwrap().insert(row.id, row.clone());
        Ok(row)
    }

    async fn task_ids_by_project(&self, project_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.project_id == project_id)
            .map(|t| t.id)
            .collect())
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tasks.lock().unwrap().remove(&id).is_some())
    }

    async fn delete_tasks_by_project(&self, project_id: Uuid) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|_, t| t.project_id != project_id);
        Ok((before - tasks.len()) as u64)
    }

    async fn subtask_by_id(&self, id: Uuid) -> Result<Option<SubTask>, StoreError> {
        Ok(self.subtasks.lock().unwrap().get(&id).cloned())
    }

    async fn insert_subtask(&self, subtask: NewSubTask) -> Result<SubTask, StoreError> {
        let now = Utc::now();
        let row = SubTask {
            id: Uuid::new_v4(),
            task_id: subtask.task_id,
            title: subtask.title,
            is_completed: false,
            created_by: subtask.created_by,
            created_at: now,
            updated_at: now,
        };

        self.subtasks.lock().unwrap().insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_subtask(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.subtasks.lock().unwrap().remove(&id).is_some())
    }

    async fn delete_subtasks_by_task(&self, task_id: Uuid) -> Result<u64, StoreError> {
        let mut subtasks = self.subtasks.lock().unwrap();
        let before = subtasks.len();
        subtasks.retain(|_, s| s.task_id != task_id);
        Ok((before - subtasks.len()) as u64)
    }

    async fn delete_subtasks_by_tasks(&self, task_ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut subtasks = self.subtasks.lock().unwrap();
        let before = subtasks.len();
        subtasks.retain(|_, s| !task_ids.contains(&s.task_id));
        Ok((before - subtasks.len()) as u64)
    }

    async fn delete_notes_by_project(&self, project_id: Uuid) -> Result<u64, StoreError> {
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|_, n| n.project_id != project_id);
        Ok((before - notes.len()) as u64)
    }
}

/// Session manager over in-memory stores, plus handles to the fakes.
pub struct SessionFixture {
    pub sessions: SessionManager,
    pub users: Arc<MemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn session_fixture() -> SessionFixture {
    let users = Arc::new(MemoryUserStore::default());
    let mailer = Arc::new(RecordingMailer::default());

    let sessions = SessionManager::new(
        Arc::clone(&users) as Arc<dyn CredentialStore>,
        Arc::clone(&users) as Arc<dyn SessionStore>,
        Arc::clone(&mailer) as Arc<dyn Mailer>,
        TokenSettings::new(
            ACCESS_SECRET.to_string(),
            REFRESH_SECRET.to_string(),
            BASE_URL.to_string(),
        ),
    );

    SessionFixture {
        sessions,
        users,
        mailer,
    }
}

/// Lifecycle coordinator and guard over in-memory stores.
pub struct WorkspaceFixture {
    pub lifecycle: LifecycleCoordinator,
    pub guard: AuthorizationGuard,
    pub workspace: Arc<MemoryWorkspaceStore>,
    pub memberships: Arc<MemoryMembershipStore>,
}

pub fn workspace_fixture() -> WorkspaceFixture {
    let workspace = Arc::new(MemoryWorkspaceStore::default());
    let memberships = Arc::new(MemoryMembershipStore::default());

    let lifecycle = LifecycleCoordinator::new(
        Arc::clone(&workspace) as Arc<dyn WorkspaceStore>,
        Arc::clone(&memberships) as Arc<dyn MembershipStore>,
    );
    let guard = AuthorizationGuard::new(Arc::clone(&memberships) as Arc<dyn MembershipStore>);

    WorkspaceFixture {
        lifecycle,
        guard,
        workspace,
        memberships,
    }
}
