/// Task model and database operations
///
/// Tasks belong to a project and own zero-or-more subtasks; deleting a task
/// must go through the lifecycle coordinator so the subtasks are removed
/// first.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     assigned_to UUID NOT NULL REFERENCES users(id),
///     assigned_by UUID NOT NULL REFERENCES users(id),
///     status task_status NOT NULL DEFAULT 'todo',
///     attachments JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Attachments are stored as a JSONB list of upload metadata; the files
/// themselves live wherever the upload collaborator put them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Metadata for one uploaded attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Where the upload collaborator stored the file
    pub url: String,

    /// MIME type reported at upload time
    pub mime_type: String,

    /// Size in bytes
    pub size: i64,
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Project this task belongs to
    pub project_id: Uuid,

    pub title: String,
    pub description: String,

    /// User the task is assigned to
    pub assigned_to: Uuid,

    /// User who made the assignment
    pub assigned_by: Uuid,

    pub status: TaskStatus,

    /// Attachment metadata (JSONB)
    pub attachments: Json<Vec<Attachment>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub status: TaskStatus,
    pub attachments: Vec<Attachment>,
}

/// Fields a task update may change; None leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub attachments: Option<Vec<Attachment>>,
}

/// Task joined with the usernames behind its user references.
///
/// The read-side resolver for task detail views: one explicit query instead
/// of per-field lazy loads.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskDetail {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub assigned_to: Uuid,
    pub assigned_to_username: String,
    pub assigned_by: Uuid,
    pub assigned_by_username: String,
    pub status: TaskStatus,
    pub attachments: Json<Vec<Attachment>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const TASK_COLUMNS: &str = "id, project_id, title, description, assigned_to, assigned_by, \
     status, attachments, created_at, updated_at";

impl Task {
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (project_id, title, description, assigned_to, assigned_by, status, attachments)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.project_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.assigned_to)
            .bind(data.assigned_by)
            .bind(data.status)
            .bind(Json(data.attachments))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Detail view with assignee and assigner usernames resolved.
    pub async fn find_detail(pool: &PgPool, id: Uuid) -> Result<Option<TaskDetail>, sqlx::Error> {
        sqlx::query_as::<_, TaskDetail>(
            "SELECT t.id, t.project_id, t.title, t.description,
                    t.assigned_to, assignee.username AS assigned_to_username,
                    t.assigned_by, assigner.username AS assigned_by_username,
                    t.status, t.attachments, t.created_at, t.updated_at
             FROM tasks t
             JOIN users assignee ON assignee.id = t.assigned_to
             JOIN users assigner ON assigner.id = t.assigned_by
             WHERE t.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Ids of every task under a project, for cascading subtask deletion.
    pub async fn ids_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: TaskUpdate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 status = COALESCE($4, status),
                 attachments = COALESCE($5, attachments),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.attachments.map(Json))
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task under a project. Returns the number deleted.
    pub async fn delete_by_project(pool: &PgPool, project_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn attachment_roundtrip() {
        let attachment = Attachment {
            url: "https://files.example.com/a.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 1024,
        };

        let json = serde_json::to_string(&attachment).unwrap();
        let back: Attachment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attachment);
    }
}
