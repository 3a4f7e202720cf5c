/// User model and database operations
///
/// Users own the credential state the session layer operates on: the
/// password hash, the email-verification and password-reset token digests
/// with their expiries, and the single refresh-token slot.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     username VARCHAR(64) NOT NULL UNIQUE,
///     full_name VARCHAR(255),
///     password_hash VARCHAR(255) NOT NULL,
///     email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     email_verification_token VARCHAR(64),
///     email_verification_expiry TIMESTAMPTZ,
///     forgot_password_token VARCHAR(64),
///     forgot_password_expiry TIMESTAMPTZ,
///     refresh_token TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Token columns always hold SHA-256 digests, never raw token values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User account row.
///
/// Never serialize this directly into a response; use [`UserProfile`] which
/// excludes the password hash and token fields.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Username, unique across all users
    pub username: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Argon2id password hash
    pub password_hash: String,

    /// Set once the email verification flow completes
    pub email_verified: bool,

    /// SHA-256 digest of the pending verification token, if any
    pub email_verification_token: Option<String>,

    /// Expiry of the pending verification token
    pub email_verification_expiry: Option<DateTime<Utc>>,

    /// SHA-256 digest of the pending password-reset token, if any
    pub forgot_password_token: Option<String>,

    /// Expiry of the pending password-reset token
    pub forgot_password_expiry: Option<DateTime<Utc>>,

    /// Most recently issued refresh token; None when logged out
    pub refresh_token: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Argon2id hash, never a plaintext password
    pub password_hash: String,
    pub full_name: Option<String>,
}

/// Caller-facing view of a user.
///
/// The password hash and all token fields are stripped; this is the only
/// user shape that crosses the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, username, full_name, password_hash, email_verified, \
     email_verification_token, email_verification_expiry, \
     forgot_password_token, forgot_password_expiry, refresh_token, \
     created_at, updated_at";

impl User {
    /// Inserts a new (unverified) user.
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the email or username is
    /// already taken.
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, username, password_hash, full_name)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.username)
            .bind(data.password_hash)
            .bind(data.full_name)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user holding either the given email or the given username.
    ///
    /// Used by registration to detect duplicate identities in one lookup.
    pub async fn find_by_email_or_username(
        pool: &PgPool,
        email: &str,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $2");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by the digest of a pending email-verification token.
    pub async fn find_by_verification_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email_verification_token = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by the digest of a pending password-reset token.
    pub async fn find_by_reset_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE forgot_password_token = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Stores a fresh email-verification token digest and expiry.
    pub async fn set_verification_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users
             SET email_verification_token = $2,
                 email_verification_expiry = $3,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Marks the email verified and clears the verification token fields.
    ///
    /// Clearing together with the flag flip is what makes the token single
    /// use.
    pub async fn mark_email_verified(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users
             SET email_verified = TRUE,
                 email_verification_token = NULL,
                 email_verification_expiry = NULL,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Stores a fresh password-reset token digest and expiry.
    pub async fn set_reset_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users
             SET forgot_password_token = $2,
                 forgot_password_expiry = $3,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Clears the password-reset token fields.
    pub async fn clear_reset_token(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users
             SET forgot_password_token = NULL,
                 forgot_password_expiry = NULL,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Replaces the stored password hash.
    pub async fn replace_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Reads the current refresh-token slot.
    pub async fn current_refresh_token(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<String>, sqlx::Error> {
        let token: Option<(Option<String>,)> =
            sqlx::query_as("SELECT refresh_token FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(token.and_then(|(t,)| t))
    }

    /// Overwrites the refresh-token slot, revoking whatever was there.
    pub async fn store_refresh_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Clears the refresh-token slot. Safe to call when already empty.
    pub async fn clear_refresh_token(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_excludes_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            username: "a".to_string(),
            full_name: None,
            password_hash: "$argon2id$secret".to_string(),
            email_verified: true,
            email_verification_token: Some("digest".to_string()),
            email_verification_expiry: None,
            forgot_password_token: None,
            forgot_password_expiry: None,
            refresh_token: Some("token".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let profile = UserProfile::from(&user);
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["email"], "a@example.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
        assert!(json.get("email_verification_token").is_none());
    }
}
