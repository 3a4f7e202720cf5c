/// One-time tokens for email verification and password reset.
///
/// A token is a high-entropy random value handed to the user exactly once
/// (over email); only its SHA-256 digest and an absolute expiry are ever
/// persisted. Because the raw value is 32 bytes of OS randomness and single
/// use, the digest needs no salt.
///
/// # Example
///
/// ```
/// use taskcamp_shared::auth::one_time::{issue, matches};
///
/// let token = issue();
/// assert_eq!(token.raw.len(), 64); // 32 random bytes, hex-encoded
/// assert!(matches(&token.raw, &token.hashed, token.expires_at));
/// assert!(!matches("something else", &token.hashed, token.expires_at));
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Validity window for a freshly issued token
pub const TOKEN_TTL_MINUTES: i64 = 20;

/// Bytes of entropy behind each raw token
const TOKEN_ENTROPY_BYTES: usize = 32;

/// A freshly minted one-time token.
///
/// `raw` goes to the user and is never stored; `hashed` and `expires_at`
/// are what the credential store persists.
#[derive(Debug, Clone)]
pub struct OneTimeToken {
    /// Opaque random value, hex-encoded; shown to the user exactly once
    pub raw: String,

    /// SHA-256 hex digest of `raw`; the only form that is persisted
    pub hashed: String,

    /// Absolute expiry of the token
    pub expires_at: DateTime<Utc>,
}

/// Mints a new one-time token with the fixed validity window.
pub fn issue() -> OneTimeToken {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let raw = hex::encode(bytes);
    let hashed = hash_token(&raw);

    OneTimeToken {
        raw,
        hashed,
        expires_at: Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES),
    }
}

/// Computes the SHA-256 hex digest of a raw token.
///
/// Deterministic: the same raw value always hashes to the same digest, which
/// is what allows lookup-by-hash in the credential store.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks a presented raw token against the persisted digest and expiry.
///
/// Recomputes the digest, compares in constant time, then checks the expiry.
/// Returns `false` on any mismatch or expiry; the caller maps that to its
/// own error.
pub fn matches(raw: &str, stored_hash: &str, stored_expiry: DateTime<Utc>) -> bool {
    let computed = hash_token(raw);

    if !constant_time_compare(&computed, stored_hash) {
        return false;
    }

    Utc::now() < stored_expiry
}

/// Constant-time string comparison.
///
/// Compares every byte regardless of where the strings first differ, so the
/// comparison time does not leak digest prefixes.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }

    diff == 0
}
