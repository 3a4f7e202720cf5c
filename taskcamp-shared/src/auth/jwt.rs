/// Signed session tokens (access and refresh).
///
/// Tokens are HS256-signed JWTs carrying the subject user id, an embedded
/// expiry, and a `kind` claim distinguishing access from refresh tokens.
/// Access and refresh tokens are signed with *different* secrets; the caller
/// supplies the secret matching the kind it mints or verifies.
///
/// # Example
///
/// ```
/// use taskcamp_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenKind};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(user_id, TokenKind::Access, Duration::hours(24));
/// let token = create_token(&claims, "access-secret-at-least-32-bytes!!")?;
///
/// let verified = validate_access_token(&token, "access-secret-at-least-32-bytes!!")?;
/// assert_eq!(verified.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped into every session token
const ISSUER: &str = "taskcamp";

/// Error type for session-token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign the token
    #[error("failed to create token: {0}")]
    Create(String),

    /// Signature did not verify against the supplied secret
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token's embedded expiry has passed
    #[error("token has expired")]
    Expired,

    /// Token parsed but failed a claim check
    #[error("token validation failed: {0}")]
    Validation(String),
}

/// Distinguishes the two session-token kinds.
///
/// The kind is embedded as a claim so a refresh token can never be replayed
/// as an access token even if the secrets were ever unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential presented on every privileged request
    Access,

    /// Longer-lived credential presented only to the refresh operation
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user this token authenticates
    pub sub: Uuid,

    /// Issuer, always "taskcamp"
    pub iss: String,

    /// Issued-at (Unix timestamp)
    pub iat: i64,

    /// Expiry (Unix timestamp)
    pub exp: i64,

    /// Not-before (Unix timestamp)
    pub nbf: i64,

    /// Unique token id.
    ///
    /// Distinguishes tokens minted within the same second; refresh-token
    /// rotation relies on the stored and presented values comparing exactly.
    pub jti: Uuid,

    /// Access or refresh
    pub kind: TokenKind,
}

impl Claims {
    /// Creates claims for `user_id` expiring `ttl` from now.
    pub fn new(user_id: Uuid, kind: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        let expiry = now + ttl;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
            kind,
        }
    }

    /// Checks whether the embedded expiry has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs `claims` with HS256 under `secret`.
///
/// # Errors
///
/// Returns `JwtError::Create` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::Create(e.to_string()))
}

/// Verifies signature, expiry, not-before, and issuer, returning the claims.
///
/// # Errors
///
/// - `JwtError::Expired` when the embedded expiry has passed
/// - `JwtError::InvalidSignature` when the secret does not match
/// - `JwtError::Validation` for malformed tokens or other claim failures
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::Validation(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Validates a token and requires it to be an access token.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.kind != TokenKind::Access {
        return Err(JwtError::Validation(
            "expected access token, got refresh token".to_string(),
        ));
    }

    Ok(claims)
}

/// Validates a token and requires it to be a refresh token.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.kind != TokenKind::Refresh {
        return Err(JwtError::Validation(
            "expected refresh token, got access token".to_string(),
        ));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn roundtrip_preserves_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenKind::Access, Duration::hours(1));

        let token = create_token(&claims, SECRET).unwrap();
        let verified = validate_token(&token, SECRET).unwrap();

        assert_eq!(verified.sub, user_id);
        assert_eq!(verified.iss, "taskcamp");
        assert_eq!(verified.kind, TokenKind::Access);
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let claims = Claims::new(Uuid::new_v4(), TokenKind::Access, Duration::hours(1));
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, "a-completely-different-secret-value");
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), TokenKind::Access, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn kind_checks_enforce_token_type() {
        let access = create_token(
            &Claims::new(Uuid::new_v4(), TokenKind::Access, Duration::hours(1)),
            SECRET,
        )
        .unwrap();
        let refresh = create_token(
            &Claims::new(Uuid::new_v4(), TokenKind::Refresh, Duration::hours(1)),
            SECRET,
        )
        .unwrap();

        assert!(validate_access_token(&access, SECRET).is_ok());
        assert!(validate_access_token(&refresh, SECRET).is_err());
        assert!(validate_refresh_token(&refresh, SECRET).is_ok());
        assert!(validate_refresh_token(&access, SECRET).is_err());
    }

    #[test]
    fn tokens_minted_in_the_same_instant_differ() {
        let user_id = Uuid::new_v4();
        let first = create_token(
            &Claims::new(user_id, TokenKind::Refresh, Duration::days(10)),
            SECRET,
        )
        .unwrap();
        let second = create_token(
            &Claims::new(user_id, TokenKind::Refresh, Duration::days(10)),
            SECRET,
        )
        .unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn access_token_does_not_verify_under_refresh_secret() {
        // Separate secrets per kind: a token minted under one never
        // validates under the other.
        let claims = Claims::new(Uuid::new_v4(), TokenKind::Access, Duration::hours(1));
        let token = create_token(&claims, "access-secret-0123456789abcdef!!").unwrap();

        let result = validate_token(&token, "refresh-secret-0123456789abcdef!");
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }
}
