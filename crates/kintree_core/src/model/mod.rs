//! Domain model for persons and their relationships.
//!
//! # Responsibility
//! - Define the canonical Person and Relationship records shared by all
//!   core layers.
//! - Validate records before they cross the persistence boundary.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Spouse relationships are stored once, in canonical endpoint order.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod person;
pub mod relationship;

/// Validation failure for person or relationship input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Person first name is blank after trim.
    BlankFirstName,
    /// A date field does not match `YYYY-MM-DD`.
    InvalidDate {
        field: &'static str,
        value: String,
    },
    /// Death date precedes birth date.
    DeathBeforeBirth,
    /// Relationship endpoints reference the same person.
    SelfRelationship,
    /// Marriage date is only meaningful on spouse relationships.
    MarriageDateOnNonSpouse,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFirstName => write!(f, "person first name must not be blank"),
            Self::InvalidDate { field, value } => {
                write!(f, "invalid date `{value}` in field `{field}`, expected YYYY-MM-DD")
            }
            Self::DeathBeforeBirth => write!(f, "death date must not precede birth date"),
            Self::SelfRelationship => {
                write!(f, "relationship endpoints must reference two distinct persons")
            }
            Self::MarriageDateOnNonSpouse => {
                write!(f, "marriage date is only valid on spouse relationships")
            }
        }
    }
}

impl Error for ValidationError {}
