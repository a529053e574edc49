//! Relationship repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `relationships` table.
//! - Enforce endpoint existence and canonical spouse ordering on write.
//!
//! # Invariants
//! - Spouse records are persisted with the lower UUID as `source_uuid`.
//! - One record per canonical (kind, source, target) pair.
//! - `list_for_person` returns insertion order: `created_at ASC, rowid ASC`.

use crate::model::person::PersonId;
use crate::model::relationship::{Relationship, RelationshipId, RelationshipKind};
use crate::repo::person_repo::parse_uuid;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const RELATIONSHIP_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    source_uuid,
    target_uuid,
    marriage_date
FROM relationships";

/// Repository interface for relationship CRUD operations.
pub trait RelationshipRepository {
    fn create_relationship(&self, relationship: &Relationship) -> RepoResult<RelationshipId>;
    fn update_relationship(&self, relationship: &Relationship) -> RepoResult<()>;
    fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<Relationship>>;
    /// Lists every relationship with `person_id` as either endpoint,
    /// in deterministic insertion order.
    fn list_for_person(&self, person_id: PersonId) -> RepoResult<Vec<Relationship>>;
    fn delete_relationship(&self, id: RelationshipId) -> RepoResult<()>;
}

/// SQLite-backed relationship repository.
pub struct SqliteRelationshipRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationshipRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn ensure_endpoints_exist(&self, relationship: &Relationship) -> RepoResult<()> {
        for endpoint in [relationship.source_id, relationship.target_id] {
            let exists: i64 = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM persons WHERE uuid = ?1);",
                [endpoint.to_string()],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(RepoError::PersonNotFound(endpoint));
            }
        }
        Ok(())
    }

    fn ensure_pair_is_free(
        &self,
        relationship: &Relationship,
        exclude: Option<RelationshipId>,
    ) -> RepoResult<()> {
        let duplicate: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM relationships
                WHERE kind = ?1
                  AND source_uuid = ?2
                  AND target_uuid = ?3
                  AND uuid <> ?4
            );",
            params![
                kind_to_db(relationship.kind),
                relationship.source_id.to_string(),
                relationship.target_id.to_string(),
                exclude.map(|id| id.to_string()).unwrap_or_default(),
            ],
            |row| row.get(0),
        )?;
        if duplicate == 1 {
            return Err(RepoError::DuplicateRelationship {
                kind: relationship.kind,
                source_id: relationship.source_id,
                target_id: relationship.target_id,
            });
        }
        Ok(())
    }
}

impl RelationshipRepository for SqliteRelationshipRepository<'_> {
    fn create_relationship(&self, relationship: &Relationship) -> RepoResult<RelationshipId> {
        let record = relationship.clone().canonicalized();
        record.validate()?;
        self.ensure_endpoints_exist(&record)?;
        self.ensure_pair_is_free(&record, None)?;

        self.conn.execute(
            "INSERT INTO relationships (
                uuid,
                kind,
                source_uuid,
                target_uuid,
                marriage_date
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.id.to_string(),
                kind_to_db(record.kind),
                record.source_id.to_string(),
                record.target_id.to_string(),
                record.marriage_date.as_deref(),
            ],
        )?;

        Ok(record.id)
    }

    fn update_relationship(&self, relationship: &Relationship) -> RepoResult<()> {
        let record = relationship.clone().canonicalized();
        record.validate()?;
        self.ensure_endpoints_exist(&record)?;
        self.ensure_pair_is_free(&record, Some(record.id))?;

        let changed = self.conn.execute(
            "UPDATE relationships
             SET
                kind = ?1,
                source_uuid = ?2,
                target_uuid = ?3,
                marriage_date = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?5;",
            params![
                kind_to_db(record.kind),
                record.source_id.to_string(),
                record.target_id.to_string(),
                record.marriage_date.as_deref(),
                record.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::RelationshipNotFound(record.id));
        }

        Ok(())
    }

    fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<Relationship>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RELATIONSHIP_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_relationship_row(row)?));
        }

        Ok(None)
    }

    fn list_for_person(&self, person_id: PersonId) -> RepoResult<Vec<Relationship>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RELATIONSHIP_SELECT_SQL}
             WHERE source_uuid = ?1 OR target_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;

        let mut rows = stmt.query([person_id.to_string()])?;
        let mut relationships = Vec::new();
        while let Some(row) = rows.next()? {
            relationships.push(parse_relationship_row(row)?);
        }

        Ok(relationships)
    }

    fn delete_relationship(&self, id: RelationshipId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM relationships WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::RelationshipNotFound(id));
        }

        Ok(())
    }
}

fn parse_relationship_row(row: &Row<'_>) -> RepoResult<Relationship> {
    let uuid_text: String = row.get("uuid")?;
    let source_text: String = row.get("source_uuid")?;
    let target_text: String = row.get("target_uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = parse_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid relationship kind `{kind_text}` in relationships.kind"
        ))
    })?;

    Ok(Relationship {
        id: parse_uuid(&uuid_text, "relationships.uuid")?,
        kind,
        source_id: parse_uuid(&source_text, "relationships.source_uuid")?,
        target_id: parse_uuid(&target_text, "relationships.target_uuid")?,
        marriage_date: row.get("marriage_date")?,
    })
}

fn kind_to_db(kind: RelationshipKind) -> &'static str {
    match kind {
        RelationshipKind::ParentChild => "parent_child",
        RelationshipKind::Spouse => "spouse",
    }
}

fn parse_kind(value: &str) -> Option<RelationshipKind> {
    match value {
        "parent_child" => Some(RelationshipKind::ParentChild),
        "spouse" => Some(RelationshipKind::Spouse),
        _ => None,
    }
}
