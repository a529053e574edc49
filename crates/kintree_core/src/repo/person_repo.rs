//! Person repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `persons` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Person::validate()` before SQL mutations.
//! - Deleting a person removes its incident relationships in the same
//!   transaction, so no relationship ever dangles.

use crate::model::person::{Gender, Person, PersonId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const PERSON_SELECT_SQL: &str = "SELECT
    uuid,
    first_name,
    last_name,
    birth_name,
    gender,
    birth_date,
    birth_place,
    death_date,
    death_place,
    is_deceased,
    is_private,
    media_count,
    source_count
FROM persons";

/// Repository interface for person CRUD operations.
pub trait PersonRepository {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId>;
    fn update_person(&self, person: &Person) -> RepoResult<()>;
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn person_exists(&self, id: PersonId) -> RepoResult<bool>;
    fn delete_person(&self, id: PersonId) -> RepoResult<()>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId> {
        person.validate()?;

        self.conn.execute(
            "INSERT INTO persons (
                uuid,
                first_name,
                last_name,
                birth_name,
                gender,
                birth_date,
                birth_place,
                death_date,
                death_place,
                is_deceased,
                is_private,
                media_count,
                source_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                person.id.to_string(),
                person.first_name.as_str(),
                person.last_name.as_str(),
                person.birth_name.as_deref(),
                gender_to_db(person.gender),
                person.birth_date.as_deref(),
                person.birth_place.as_deref(),
                person.death_date.as_deref(),
                person.death_place.as_deref(),
                bool_to_int(person.is_deceased),
                bool_to_int(person.is_private),
                person.media_count,
                person.source_count,
            ],
        )?;

        Ok(person.id)
    }

    fn update_person(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;

        let changed = self.conn.execute(
            "UPDATE persons
             SET
                first_name = ?1,
                last_name = ?2,
                birth_name = ?3,
                gender = ?4,
                birth_date = ?5,
                birth_place = ?6,
                death_date = ?7,
                death_place = ?8,
                is_deceased = ?9,
                is_private = ?10,
                media_count = ?11,
                source_count = ?12,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?13;",
            params![
                person.first_name.as_str(),
                person.last_name.as_str(),
                person.birth_name.as_deref(),
                gender_to_db(person.gender),
                person.birth_date.as_deref(),
                person.birth_place.as_deref(),
                person.death_date.as_deref(),
                person.death_place.as_deref(),
                bool_to_int(person.is_deceased),
                bool_to_int(person.is_private),
                person.media_count,
                person.source_count,
                person.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::PersonNotFound(person.id));
        }

        Ok(())
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }

        Ok(None)
    }

    fn person_exists(&self, id: PersonId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM persons WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_person(&self, id: PersonId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "DELETE FROM relationships WHERE source_uuid = ?1 OR target_uuid = ?1;",
            [id.to_string()],
        )?;
        let changed = tx.execute("DELETE FROM persons WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::PersonNotFound(id));
        }

        tx.commit()?;
        Ok(())
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "persons.uuid")?;

    let gender_text: String = row.get("gender")?;
    let gender = parse_gender(&gender_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid gender `{gender_text}` in persons.gender"))
    })?;

    Ok(Person {
        id,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        birth_name: row.get("birth_name")?,
        gender,
        birth_date: row.get("birth_date")?,
        birth_place: row.get("birth_place")?,
        death_date: row.get("death_date")?,
        death_place: row.get("death_place")?,
        is_deceased: int_to_bool(row.get("is_deceased")?, "persons.is_deceased")?,
        is_private: int_to_bool(row.get("is_private")?, "persons.is_private")?,
        media_count: row.get("media_count")?,
        source_count: row.get("source_count")?,
    })
}

fn gender_to_db(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Other => "other",
    }
}

fn parse_gender(value: &str) -> Option<Gender> {
    match value {
        "male" => Some(Gender::Male),
        "female" => Some(Gender::Female),
        "other" => Some(Gender::Other),
        _ => None,
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
