//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for persons and relationships.
//! - Isolate SQLite query details from the store facade.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Relationship listing order is deterministic: insertion order.

use crate::db::DbError;
use crate::model::person::PersonId;
use crate::model::relationship::{RelationshipId, RelationshipKind};
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod person_repo;
pub mod relationship_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for person/relationship persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    PersonNotFound(PersonId),
    RelationshipNotFound(RelationshipId),
    /// A record for the same canonical endpoint pair already exists.
    DuplicateRelationship {
        kind: RelationshipKind,
        source_id: PersonId,
        target_id: PersonId,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::RelationshipNotFound(id) => write!(f, "relationship not found: {id}"),
            Self::DuplicateRelationship {
                kind,
                source_id,
                target_id,
            } => write!(
                f,
                "relationship {kind:?} between {source_id} and {target_id} already exists"
            ),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted relationship data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
