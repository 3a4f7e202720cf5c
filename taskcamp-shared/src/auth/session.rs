/// Session management: registration, email verification, login, token
/// rotation, logout, and the password flows.
///
/// Every operation returns a typed [`SessionError`]; the HTTP layer maps
/// those to status codes. The account lifecycle is:
///
/// ```text
/// registered (unverified) → verified → logged in ⇄ logged out
/// ```
///
/// Session tokens come in pairs. The access token is stateless; the refresh
/// token is additionally mirrored into the user's single refresh slot, so
/// issuing a new pair revokes the previous session and a rotated-out
/// refresh token can never be replayed.
///
/// Verification and reset emails are dispatched fire-and-forget: delivery
/// failure is logged and the triggering operation still succeeds.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::mail::{self, Mailer};
use crate::models::user::{NewUser, UserProfile};
use crate::store::{CredentialStore, SessionStore, StoreError};

use super::jwt::{self, Claims, TokenKind};
use super::one_time;
use super::password::{self, PasswordError};

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Email or username already registered
    #[error("email or username already registered")]
    DuplicateIdentity,

    /// No user matches the given identity
    #[error("no such user")]
    NotFound,

    /// Operation requires a verified email address
    #[error("email address is not verified")]
    EmailNotVerified,

    /// Verification requested for an already-verified address
    #[error("email address is already verified")]
    AlreadyVerified,

    /// Password check failed
    #[error("invalid credentials")]
    InvalidCredential,

    /// New password and confirmation differ
    #[error("new password and confirmation do not match")]
    PasswordMismatch,

    /// One-time token unknown, consumed, or past its expiry
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    /// Refresh token is valid but no longer the active one
    #[error("refresh token has been revoked")]
    Revoked,

    /// Caller presented no usable session credential
    #[error("not authenticated: {0}")]
    Unauthorized(String),

    /// Unexpected store or signing failure; cause preserved for the log
    #[error("internal session error: {0}")]
    Internal(String),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Internal(err.to_string())
    }
}

impl From<PasswordError> for SessionError {
    fn from(err: PasswordError) -> Self {
        SessionError::Internal(err.to_string())
    }
}

/// Secrets and lifetimes for session tokens.
///
/// Access and refresh tokens are signed with different secrets; the public
/// base URL anchors the links embedded in verification and reset emails.
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub public_base_url: String,
}

impl TokenSettings {
    /// Settings with the default lifetimes: access 1 day, refresh 10 days.
    pub fn new(access_secret: String, refresh_secret: String, public_base_url: String) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl: Duration::days(1),
            refresh_ttl: Duration::days(10),
            public_base_url,
        }
    }
}

/// A freshly minted access/refresh pair with embedded-expiry metadata
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Successful login: the sanitized user plus a token pair
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

/// Input for registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Orchestrates credential verification and token issuance over the
/// credential and session stores.
#[derive(Clone)]
pub struct SessionManager {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenSettings,
}

impl SessionManager {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenSettings,
    ) -> Self {
        Self {
            credentials,
            sessions,
            mailer,
            tokens,
        }
    }

    /// Registers a new, unverified user and dispatches the verification
    /// email.
    ///
    /// # Errors
    ///
    /// `SessionError::DuplicateIdentity` when the email or username is
    /// already taken.
    pub async fn register(&self, reg: Registration) -> Result<UserProfile, SessionError> {
        if self
            .credentials
            .by_email_or_username(&reg.email, &reg.username)
            .await?
            .is_some()
        {
            return Err(SessionError::DuplicateIdentity);
        }

        let password_hash = password::hash_password(&reg.password)?;

        let user = match self
            .credentials
            .insert(NewUser {
                email: reg.email,
                username: reg.username,
                password_hash,
                full_name: reg.full_name,
            })
            .await
        {
            Ok(user) => user,
            // Lost the race between the duplicate check and the insert
            Err(StoreError::Duplicate(_)) => return Err(SessionError::DuplicateIdentity),
            Err(err) => return Err(err.into()),
        };

        let token = one_time::issue();
        self.credentials
            .set_verification_token(user.id, &token.hashed, token.expires_at)
            .await?;

        let url = self.verification_url(&token.raw);
        self.dispatch(mail::verification_message(&user.email, &user.username, &url));

        tracing::info!(user_id = %user.id, "user registered, verification pending");
        Ok(UserProfile::from(&user))
    }

    /// Consumes an email-verification token.
    ///
    /// The token is single use: on success the stored digest and expiry are
    /// cleared along with flipping the verified flag.
    pub async fn verify_email(&self, raw_token: &str) -> Result<UserProfile, SessionError> {
        let hashed = one_time::hash_token(raw_token);

        let mut user = self
            .credentials
            .by_verification_hash(&hashed)
            .await?
            .ok_or(SessionError::InvalidOrExpiredToken)?;

        let (stored_hash, expiry) = match (&user.email_verification_token, user.email_verification_expiry)
        {
            (Some(hash), Some(expiry)) => (hash.clone(), expiry),
            _ => return Err(SessionError::InvalidOrExpiredToken),
        };

        if !one_time::matches(raw_token, &stored_hash, expiry) {
            return Err(SessionError::InvalidOrExpiredToken);
        }

        self.credentials.mark_email_verified(user.id).await?;
        user.email_verified = true;

        tracing::info!(user_id = %user.id, "email verified");
        Ok(UserProfile::from(&user))
    }

    /// Issues a fresh verification token for a not-yet-verified address.
    pub async fn resend_verification(&self, email: &str) -> Result<(), SessionError> {
        let user = self
            .credentials
            .by_email(email)
            .await?
            .ok_or(SessionError::NotFound)?;

        if user.email_verified {
            return Err(SessionError::AlreadyVerified);
        }

        let token = one_time::issue();
        self.credentials
            .set_verification_token(user.id, &token.hashed, token.expires_at)
            .await?;

        let url = self.verification_url(&token.raw);
        self.dispatch(mail::verification_message(&user.email, &user.username, &url));

        Ok(())
    }

    /// Verifies credentials and opens a session.
    ///
    /// The refresh token is persisted into the user's single slot,
    /// overwriting (and thereby revoking) any previous session.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotFound` for an unknown email
    /// - `SessionError::EmailNotVerified` before verification
    /// - `SessionError::InvalidCredential` on password mismatch
    pub async fn login(&self, email: &str, password_input: &str) -> Result<LoginOutcome, SessionError> {
        let user = self
            .credentials
            .by_email(email)
            .await?
            .ok_or(SessionError::NotFound)?;

        if !user.email_verified {
            return Err(SessionError::EmailNotVerified);
        }

        if !password::verify_password(password_input, &user.password_hash)? {
            return Err(SessionError::InvalidCredential);
        }

        let tokens = self.mint_pair(user.id)?;
        self.sessions
            .store_refresh_token(user.id, &tokens.refresh_token)
            .await?;

        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(LoginOutcome {
            user: UserProfile::from(&user),
            tokens,
        })
    }

    /// Rotates a refresh token into a fresh access/refresh pair.
    ///
    /// # Errors
    ///
    /// - `SessionError::Unauthorized` when the token fails signature or
    ///   expiry checks
    /// - `SessionError::Revoked` when the token is no longer the stored
    ///   one — the user logged out, or the token was already rotated out
    pub async fn refresh(&self, incoming: &str) -> Result<TokenPair, SessionError> {
        let claims = jwt::validate_refresh_token(incoming, &self.tokens.refresh_secret)
            .map_err(|e| SessionError::Unauthorized(e.to_string()))?;

        let stored = self
            .sessions
            .current_refresh_token(claims.sub)
            .await?
            .ok_or(SessionError::Revoked)?;

        if !one_time::constant_time_compare(&stored, incoming) {
            return Err(SessionError::Revoked);
        }

        let tokens = self.mint_pair(claims.sub)?;
        self.sessions
            .store_refresh_token(claims.sub, &tokens.refresh_token)
            .await?;

        Ok(tokens)
    }

    /// Closes the user's session by clearing the refresh slot.
    ///
    /// Idempotent: logging out twice is not an error.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), SessionError> {
        self.sessions.clear_refresh_token(user_id).await?;
        Ok(())
    }

    /// Replaces the password after re-verifying the old one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), SessionError> {
        if new_password != confirm_password {
            return Err(SessionError::PasswordMismatch);
        }

        let user = self
            .credentials
            .by_id(user_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        if !password::verify_password(old_password, &user.password_hash)? {
            return Err(SessionError::InvalidCredential);
        }

        let new_hash = password::hash_password(new_password)?;
        self.credentials
            .replace_password_hash(user.id, &new_hash)
            .await?;

        Ok(())
    }

    /// Mints a reset token and dispatches the reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), SessionError> {
        let user = self
            .credentials
            .by_email(email)
            .await?
            .ok_or(SessionError::NotFound)?;

        let token = one_time::issue();
        self.credentials
            .set_reset_token(user.id, &token.hashed, token.expires_at)
            .await?;

        let url = self.reset_url(&token.raw);
        self.dispatch(mail::password_reset_message(&user.email, &user.username, &url));

        Ok(())
    }

    /// Consumes a reset token and installs the new password.
    ///
    /// Single use: the stored digest and expiry are cleared on success, so
    /// presenting the same raw token again fails.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        let hashed = one_time::hash_token(raw_token);

        let user = self
            .credentials
            .by_reset_hash(&hashed)
            .await?
            .ok_or(SessionError::InvalidOrExpiredToken)?;

        let (stored_hash, expiry) = match (&user.forgot_password_token, user.forgot_password_expiry) {
            (Some(hash), Some(expiry)) => (hash.clone(), expiry),
            _ => return Err(SessionError::InvalidOrExpiredToken),
        };

        if !one_time::matches(raw_token, &stored_hash, expiry) {
            return Err(SessionError::InvalidOrExpiredToken);
        }

        let new_hash = password::hash_password(new_password)?;
        self.credentials
            .replace_password_hash(user.id, &new_hash)
            .await?;
        self.credentials.clear_reset_token(user.id).await?;

        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(())
    }

    /// Resolves an access token into the sanitized profile of its subject.
    ///
    /// This is the identity step of the request pipeline; project-scoped
    /// role checks come after.
    pub async fn authenticate(&self, access_token: &str) -> Result<UserProfile, SessionError> {
        let claims = jwt::validate_access_token(access_token, &self.tokens.access_secret)
            .map_err(|e| SessionError::Unauthorized(e.to_string()))?;

        let user = self
            .credentials
            .by_id(claims.sub)
            .await?
            .ok_or_else(|| SessionError::Unauthorized("unknown user".to_string()))?;

        Ok(UserProfile::from(&user))
    }

    fn mint_pair(&self, user_id: Uuid) -> Result<TokenPair, SessionError> {
        let access_claims = Claims::new(user_id, TokenKind::Access, self.tokens.access_ttl);
        let refresh_claims = Claims::new(user_id, TokenKind::Refresh, self.tokens.refresh_ttl);

        let access_token = jwt::create_token(&access_claims, &self.tokens.access_secret)
            .map_err(|e| SessionError::Internal(e.to_string()))?;
        let refresh_token = jwt::create_token(&refresh_claims, &self.tokens.refresh_secret)
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: timestamp(access_claims.exp)?,
            refresh_expires_at: timestamp(refresh_claims.exp)?,
        })
    }

    fn verification_url(&self, raw_token: &str) -> String {
        format!(
            "{}/api/v1/auth/verify-email/{}",
            self.tokens.public_base_url, raw_token
        )
    }

    fn reset_url(&self, raw_token: &str) -> String {
        format!(
            "{}/api/v1/auth/reset-password/{}",
            self.tokens.public_base_url, raw_token
        )
    }

    /// Sends a mail without tying its outcome to the calling operation.
    fn dispatch(&self, message: mail::MailMessage) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            if let Err(err) = mailer.send(message).await {
                tracing::warn!(error = %err, "email delivery failed");
            }
        });
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, SessionError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| SessionError::Internal("token expiry out of range".to_string()))
}
