//! # taskcamp shared library
//!
//! Domain models, storage seams, and the identity/authorization core shared
//! by the taskcamp API server.
//!
//! ## Module Organization
//!
//! - `models`: database models and their query operations
//! - `store`: storage traits + Postgres implementations
//! - `auth`: password hashing, session/one-time tokens, session manager,
//!   role-based authorization
//! - `lifecycle`: cascading create/delete coordination
//! - `mail`: outbound email collaborator
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod lifecycle;
pub mod mail;
pub mod models;
pub mod store;

/// Current version of the taskcamp shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
