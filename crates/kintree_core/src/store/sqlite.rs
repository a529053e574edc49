//! SQLite-backed person/relationship store.
//!
//! # Responsibility
//! - Implement the store contract over the repository layer.
//! - Enforce token acceptance before touching any data.
//!
//! # Invariants
//! - Every call validates the access token first; stale tokens fail
//!   with `TokenRejected` without side effects.
//! - Mutations return the stored (canonicalized) record.

use crate::model::person::{Person, PersonId};
use crate::model::relationship::{Relationship, RelationshipId};
use crate::repo::person_repo::{PersonRepository, SqlitePersonRepository};
use crate::repo::relationship_repo::{RelationshipRepository, SqliteRelationshipRepository};
use crate::repo::RepoError;
use crate::session::auth::TokenValidator;
use crate::session::token::AccessToken;
use crate::store::{PersonRelationshipStore, StoreError, StoreResult};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

/// Store facade over a migrated SQLite connection.
///
/// The connection is serialized behind a mutex; callers treat every
/// method as one atomic unit.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    validator: Arc<dyn TokenValidator>,
}

impl SqliteStore {
    /// Wraps a migrated connection (see `db::open_db`).
    pub fn new(conn: Connection, validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            conn: Mutex::new(conn),
            validator,
        }
    }

    fn authorize(&self, token: &AccessToken) -> StoreResult<MutexGuard<'_, Connection>> {
        if !self.validator.is_valid(token) {
            return Err(StoreError::TokenRejected);
        }
        Ok(self.conn.lock().unwrap_or_else(|err| err.into_inner()))
    }
}

impl PersonRelationshipStore for SqliteStore {
    fn get_person(&self, token: &AccessToken, id: PersonId) -> StoreResult<Person> {
        let conn = self.authorize(token)?;
        let repo = SqlitePersonRepository::new(&conn);
        repo.get_person(id)
            .map_err(map_repo_error)?
            .ok_or(StoreError::NotFound(id))
    }

    fn list_relationships(
        &self,
        token: &AccessToken,
        person_id: PersonId,
    ) -> StoreResult<Vec<Relationship>> {
        let conn = self.authorize(token)?;
        let repo = SqliteRelationshipRepository::new(&conn);
        repo.list_for_person(person_id).map_err(map_repo_error)
    }

    fn create_person(&self, token: &AccessToken, person: &Person) -> StoreResult<Person> {
        let conn = self.authorize(token)?;
        let repo = SqlitePersonRepository::new(&conn);
        repo.create_person(person).map_err(map_repo_error)?;
        Ok(person.clone())
    }

    fn update_person(&self, token: &AccessToken, person: &Person) -> StoreResult<Person> {
        let conn = self.authorize(token)?;
        let repo = SqlitePersonRepository::new(&conn);
        repo.update_person(person).map_err(map_repo_error)?;
        Ok(person.clone())
    }

    fn delete_person(&self, token: &AccessToken, id: PersonId) -> StoreResult<()> {
        let conn = self.authorize(token)?;
        let repo = SqlitePersonRepository::new(&conn);
        repo.delete_person(id).map_err(map_repo_error)
    }

    fn create_relationship(
        &self,
        token: &AccessToken,
        relationship: &Relationship,
    ) -> StoreResult<Relationship> {
        let conn = self.authorize(token)?;
        let repo = SqliteRelationshipRepository::new(&conn);
        repo.create_relationship(relationship).map_err(map_repo_error)?;
        Ok(relationship.clone().canonicalized())
    }

    fn update_relationship(
        &self,
        token: &AccessToken,
        relationship: &Relationship,
    ) -> StoreResult<Relationship> {
        let conn = self.authorize(token)?;
        let repo = SqliteRelationshipRepository::new(&conn);
        repo.update_relationship(relationship).map_err(map_repo_error)?;
        Ok(relationship.clone().canonicalized())
    }

    fn delete_relationship(&self, token: &AccessToken, id: RelationshipId) -> StoreResult<()> {
        let conn = self.authorize(token)?;
        let repo = SqliteRelationshipRepository::new(&conn);
        repo.delete_relationship(id).map_err(map_repo_error)
    }
}

fn map_repo_error(err: RepoError) -> StoreError {
    match err {
        RepoError::PersonNotFound(id) => StoreError::NotFound(id),
        RepoError::RelationshipNotFound(id) => StoreError::NotFound(id),
        RepoError::Validation(inner) => StoreError::Validation(inner.to_string()),
        RepoError::DuplicateRelationship { .. } => StoreError::Conflict(err.to_string()),
        RepoError::Db(inner) => StoreError::Backend(inner.to_string()),
        RepoError::InvalidData(message) => StoreError::Backend(message),
    }
}
