//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical person record consumed by traversal and layout.
//! - Validate person input before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another person.
//! - Vital dates, when present, are ISO `YYYY-MM-DD` strings.
//! - `death_date` must not precede `birth_date` when both are set.

use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Stable identifier for a person.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type PersonId = Uuid;

/// Gender classification carried on every person record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Canonical person record.
///
/// Traversal and layout treat this as a read-only payload; only the
/// relationship store creates, updates, or deletes persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Stable global ID used for linking and de-duplication.
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    /// Name at birth when it differs from the current last name.
    pub birth_name: Option<String>,
    pub gender: Gender,
    /// ISO `YYYY-MM-DD`.
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    /// ISO `YYYY-MM-DD`. Should not precede `birth_date` when both set.
    pub death_date: Option<String>,
    pub death_place: Option<String>,
    pub is_deceased: bool,
    /// Private persons are still traversed; visibility is a rendering concern.
    pub is_private: bool,
    /// Derived count of attached media items.
    pub media_count: u32,
    /// Derived count of attached source citations.
    pub source_count: u32,
}

impl Person {
    /// Creates a new person with a generated stable ID.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, gender: Gender) -> Self {
        Self::with_id(Uuid::new_v4(), first_name, last_name, gender)
    }

    /// Creates a person with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: PersonId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        gender: Gender,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_name: None,
            gender,
            birth_date: None,
            birth_place: None,
            death_date: None,
            death_place: None,
            is_deceased: false,
            is_private: false,
            media_count: 0,
            source_count: 0,
        }
    }

    /// Validates record invariants before persistence.
    ///
    /// # Errors
    /// - `BlankFirstName` when the first name trims to empty.
    /// - `InvalidDate` when a vital date is not `YYYY-MM-DD`.
    /// - `DeathBeforeBirth` when both dates are set out of order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::BlankFirstName);
        }
        validate_date_field("birth_date", self.birth_date.as_deref())?;
        validate_date_field("death_date", self.death_date.as_deref())?;
        if let (Some(birth), Some(death)) = (&self.birth_date, &self.death_date) {
            // Lexicographic order matches chronological order for ISO dates.
            if death < birth {
                return Err(ValidationError::DeathBeforeBirth);
            }
        }
        Ok(())
    }
}

fn validate_date_field(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(date) if !ISO_DATE_RE.is_match(date) => Err(ValidationError::InvalidDate {
            field,
            value: date.to_string(),
        }),
        _ => Ok(()),
    }
}
