//! Session and authentication layer.
//!
//! # Responsibility
//! - Hold the access/refresh token pair for the active session.
//! - Serialize token renewal across concurrent authenticated calls.
//!
//! # Invariants
//! - At most one refresh call is in flight at any time (single-flight).
//! - A rejected request is replayed at most once per rejection.

pub mod auth;
pub mod guard;
pub mod token;
