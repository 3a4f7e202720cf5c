/// SubTask model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subtasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     title VARCHAR(255) NOT NULL,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// SubTask row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubTask {
    pub id: Uuid,

    /// Task this subtask belongs to
    pub task_id: Uuid,

    pub title: String,
    pub is_completed: bool,

    /// User who created the subtask
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a subtask
#[derive(Debug, Clone)]
pub struct NewSubTask {
    pub task_id: Uuid,
    pub title: String,
    pub created_by: Uuid,
}

impl SubTask {
    pub async fn create(pool: &PgPool, data: NewSubTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "INSERT INTO subtasks (task_id, title, created_by)
             VALUES ($1, $2, $3)
             RETURNING id, task_id, title, is_completed, created_by, created_at, updated_at",
        )
        .bind(data.task_id)
        .bind(data.title)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "SELECT id, task_id, title, is_completed, created_by, created_at, updated_at
             FROM subtasks
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "SELECT id, task_id, title, is_completed, created_by, created_at, updated_at
             FROM subtasks
             WHERE task_id = $1
             ORDER BY created_at",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        title: Option<String>,
        is_completed: Option<bool>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SubTask>(
            "UPDATE subtasks
             SET title = COALESCE($2, title),
                 is_completed = COALESCE($3, is_completed),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING id, task_id, title, is_completed, created_by, created_at, updated_at",
        )
        .bind(id)
        .bind(title)
        .bind(is_completed)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subtasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every subtask under one task. Returns the number deleted.
    pub async fn delete_by_task(pool: &PgPool, task_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subtasks WHERE task_id = $1")
            .bind(task_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every subtask under any of the given tasks, for project
    /// cascades. Returns the number deleted.
    pub async fn delete_by_tasks(pool: &PgPool, task_ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM subtasks WHERE task_id = ANY($1)")
            .bind(task_ids)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
