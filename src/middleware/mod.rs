//! HTTP middleware components.
//!
//! Middleware run before route handlers. They can:
//! - Authenticate requests
//! - Enforce administrator access
//! - Short-circuit requests (reject unauthorized)

/// Session token and administrator middleware
pub mod auth;
