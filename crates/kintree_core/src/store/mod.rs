//! Person/relationship store collaborator interface.
//!
//! # Responsibility
//! - Define the token-authenticated call contract the core consumes.
//! - Carry the shared error taxonomy for store-boundary calls.
//!
//! # Invariants
//! - `list_relationships` ordering is deterministic for unchanged data;
//!   tree construction determinism depends on it.
//! - Implementations reject stale tokens with `TokenRejected` and never
//!   partially apply a mutation.

use crate::model::person::{Person, PersonId};
use crate::model::relationship::{Relationship, RelationshipId};
use crate::session::token::AccessToken;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod sqlite;

pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error taxonomy for store-boundary calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced entity does not exist.
    NotFound(Uuid),
    /// Access token was not accepted; the session guard may refresh
    /// and replay exactly once.
    TokenRejected,
    /// No usable session: refresh failed or the caller never logged in.
    /// Emitted by session-guarded call paths, not by stores themselves.
    SessionExpired,
    /// Mutation input rejected by the collaborator.
    Validation(String),
    /// Stale or conflicting write detected by the collaborator.
    Conflict(String),
    /// Transport or persistence failure.
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::TokenRejected => write!(f, "access token rejected"),
            Self::SessionExpired => write!(f, "session expired"),
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::Conflict(message) => write!(f, "conflicting write: {message}"),
            Self::Backend(message) => write!(f, "store backend failure: {message}"),
        }
    }
}

impl Error for StoreError {}

/// Token-authenticated persistence collaborator for persons and
/// relationships.
///
/// Every call is an atomic unit from the core's perspective; no
/// long-lived transactions or locks are held across calls.
pub trait PersonRelationshipStore: Send + Sync {
    fn get_person(&self, token: &AccessToken, id: PersonId) -> StoreResult<Person>;
    /// Lists every relationship with `person_id` as either endpoint,
    /// in deterministic insertion order.
    fn list_relationships(
        &self,
        token: &AccessToken,
        person_id: PersonId,
    ) -> StoreResult<Vec<Relationship>>;

    fn create_person(&self, token: &AccessToken, person: &Person) -> StoreResult<Person>;
    fn update_person(&self, token: &AccessToken, person: &Person) -> StoreResult<Person>;
    fn delete_person(&self, token: &AccessToken, id: PersonId) -> StoreResult<()>;

    fn create_relationship(
        &self,
        token: &AccessToken,
        relationship: &Relationship,
    ) -> StoreResult<Relationship>;
    fn update_relationship(
        &self,
        token: &AccessToken,
        relationship: &Relationship,
    ) -> StoreResult<Relationship>;
    fn delete_relationship(&self, token: &AccessToken, id: RelationshipId) -> StoreResult<()>;
}
