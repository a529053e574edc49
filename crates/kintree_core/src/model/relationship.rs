//! Relationship domain model.
//!
//! # Responsibility
//! - Define the directed relationship record linking two persons.
//! - Normalize spouse records into canonical endpoint order.
//!
//! # Invariants
//! - `parent_child` is directional: `source_id` is the parent,
//!   `target_id` the child.
//! - `spouse` is symmetric but stored as one record with the lower
//!   UUID first, so a couple is never represented twice.

use crate::model::person::PersonId;
use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Stable identifier for a relationship record.
pub type RelationshipId = Uuid;

/// Relationship classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    /// Directed parent -> child edge.
    ParentChild,
    /// Symmetric marriage edge, canonically ordered.
    Spouse,
}

/// One directed relationship record between two existing persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    pub kind: RelationshipKind,
    pub source_id: PersonId,
    pub target_id: PersonId,
    /// ISO `YYYY-MM-DD`; only meaningful for `Spouse` records.
    pub marriage_date: Option<String>,
}

impl Relationship {
    /// Creates a parent -> child record with a generated ID.
    pub fn parent_child(parent: PersonId, child: PersonId) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: RelationshipKind::ParentChild,
            source_id: parent,
            target_id: child,
            marriage_date: None,
        }
    }

    /// Creates a spouse record with a generated ID, in canonical order.
    pub fn spouse(a: PersonId, b: PersonId, marriage_date: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: RelationshipKind::Spouse,
            source_id: a,
            target_id: b,
            marriage_date,
        }
        .canonicalized()
    }

    /// Returns the record with spouse endpoints in canonical order
    /// (lower UUID first). Parent-child records are returned unchanged.
    pub fn canonicalized(mut self) -> Self {
        if self.kind == RelationshipKind::Spouse && self.target_id < self.source_id {
            std::mem::swap(&mut self.source_id, &mut self.target_id);
        }
        self
    }

    /// Returns the endpoint opposite to `person`, if `person` is an endpoint.
    pub fn other_endpoint(&self, person: PersonId) -> Option<PersonId> {
        if self.source_id == person {
            Some(self.target_id)
        } else if self.target_id == person {
            Some(self.source_id)
        } else {
            None
        }
    }

    /// Validates record invariants before persistence.
    ///
    /// # Errors
    /// - `SelfRelationship` when both endpoints are the same person.
    /// - `MarriageDateOnNonSpouse` for a dated parent-child record.
    /// - `InvalidDate` when the marriage date is not `YYYY-MM-DD`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_id == self.target_id {
            return Err(ValidationError::SelfRelationship);
        }
        if let Some(date) = &self.marriage_date {
            if self.kind != RelationshipKind::Spouse {
                return Err(ValidationError::MarriageDateOnNonSpouse);
            }
            if !ISO_DATE_RE.is_match(date) {
                return Err(ValidationError::InvalidDate {
                    field: "marriage_date",
                    value: date.clone(),
                });
            }
        }
        Ok(())
    }
}
