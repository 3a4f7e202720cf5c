/// Project membership model
///
/// A row grants one user one role in one project; the (user, project) pair
/// is unique, so a user can never hold two roles in the same project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('admin', 'project_admin', 'member');
///
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id),
///     project_id UUID NOT NULL REFERENCES projects(id),
///     role project_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (user_id, project_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::ProjectRole;

/// Membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub role: ProjectRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for adding a member to a project
#[derive(Debug, Clone)]
pub struct NewMember {
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub role: ProjectRole,
}

/// Membership joined with the member's public identity, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub role: ProjectRole,
    pub username: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProjectMember {
    pub async fn create(pool: &PgPool, data: NewMember) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "INSERT INTO project_members (user_id, project_id, role)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, project_id, role, created_at, updated_at",
        )
        .bind(data.user_id)
        .bind(data.project_id)
        .bind(data.role)
        .fetch_one(pool)
        .await
    }

    /// Looks up the unique (user, project) membership.
    pub async fn find(
        pool: &PgPool,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "SELECT id, user_id, project_id, role, created_at, updated_at
             FROM project_members
             WHERE user_id = $1 AND project_id = $2",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Overwrites the role of an existing membership.
    pub async fn set_role(
        pool: &PgPool,
        user_id: Uuid,
        project_id: Uuid,
        role: ProjectRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "UPDATE project_members
             SET role = $3, updated_at = NOW()
             WHERE user_id = $1 AND project_id = $2
             RETURNING id, user_id, project_id, role, created_at, updated_at",
        )
        .bind(user_id)
        .bind(project_id)
        .bind(role)
        .fetch_optional(pool)
        .await
    }

    pub async fn remove(
        pool: &PgPool,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE user_id = $1 AND project_id = $2")
                .bind(user_id)
                .bind(project_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every membership of a project. Returns the number removed.
    pub async fn remove_by_project(pool: &PgPool, project_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "SELECT id, user_id, project_id, role, created_at, updated_at
             FROM project_members
             WHERE project_id = $1
             ORDER BY created_at",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Member listing with usernames resolved in one query.
    pub async fn list_with_users(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        sqlx::query_as::<_, MemberWithUser>(
            "SELECT m.id, m.user_id, m.project_id, m.role,
                    u.username, u.full_name, m.created_at
             FROM project_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.project_id = $1
             ORDER BY m.created_at",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
