//! # taskcamp API server library
//!
//! Axum HTTP layer over the shared identity/authorization core:
//! configuration, unified error mapping, the router with its access-token
//! middleware, and the route handlers.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
