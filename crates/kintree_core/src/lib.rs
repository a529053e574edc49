//! Core domain logic for Kintree.
//! This crate is the single source of truth for traversal, layout, and
//! session invariants.

pub mod client;
pub mod db;
pub mod graph;
pub mod layout;
pub mod logging;
pub mod model;
pub mod repo;
pub mod session;
pub mod store;

pub use client::state_store::{ClientStateStore, DiagramListener, FetchOutcome, StateError};
pub use graph::builder::{BuildError, BuildOutcome, GraphBuilder, TreeSource};
pub use graph::view::{TreeMember, TreeView};
pub use graph::CancelToken;
pub use layout::engine::{Diagram, Edge, LayoutEngine, Node};
pub use logging::{default_log_level, init_logging, logging_status, LogInitError};
pub use model::person::{Gender, Person, PersonId};
pub use model::relationship::{Relationship, RelationshipId, RelationshipKind};
pub use session::auth::{AuthClient, AuthError, MemoryAuthService, TokenValidator};
pub use session::guard::{SessionGuard, SessionListener};
pub use session::token::{AccessToken, Credentials, RefreshToken, TokenPair};
pub use store::{PersonRelationshipStore, SqliteStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
