/// Project note model
///
/// Notes are plain-text comments attached to a project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_notes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     content TEXT NOT NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Note row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectNote {
    pub id: Uuid,
    pub project_id: Uuid,
    pub content: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Note joined with its author's username, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteWithAuthor {
    pub id: Uuid,
    pub project_id: Uuid,
    pub content: String,
    pub created_by: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectNote {
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        content: &str,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectNote>(
            "INSERT INTO project_notes (project_id, content, created_by)
             VALUES ($1, $2, $3)
             RETURNING id, project_id, content, created_by, created_at, updated_at",
        )
        .bind(project_id)
        .bind(content)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectNote>(
            "SELECT id, project_id, content, created_by, created_at, updated_at
             FROM project_notes
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Notes of a project with author usernames, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<NoteWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, NoteWithAuthor>(
            "SELECT n.id, n.project_id, n.content, n.created_by,
                    u.username AS author_username, n.created_at, n.updated_at
             FROM project_notes n
             JOIN users u ON u.id = n.created_by
             WHERE n.project_id = $1
             ORDER BY n.created_at DESC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_content(
        pool: &PgPool,
        id: Uuid,
        content: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectNote>(
            "UPDATE project_notes
             SET content = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING id, project_id, content, created_by, created_at, updated_at",
        )
        .bind(id)
        .bind(content)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every note of a project, as part of the project cascade.
    pub async fn delete_by_project(pool: &PgPool, project_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_notes WHERE project_id = $1")
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
