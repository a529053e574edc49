//! Per-request tree view and kinship label derivation.
//!
//! # Responsibility
//! - Define the transient view handed from traversal to layout.
//! - Derive human-readable kinship labels from gender and generation.
//!
//! # Invariants
//! - A `TreeView` is rebuilt on every fetch; it is never persisted.
//! - Each member carries the relationship record that linked it, so
//!   layout can emit exactly one edge per consumed record.

use crate::model::person::{Gender, Person};
use crate::model::relationship::Relationship;
use serde::Serialize;

/// One person placed in the view, with the relationship record that
/// linked it and the generation offset relative to the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMember {
    pub person: Person,
    pub relationship: Relationship,
    /// Kinship label relative to the root, e.g. "father" or "grandson".
    pub label: String,
    /// Negative for ancestors, positive for descendants, 0 for spouses.
    pub generation: i32,
}

/// Transient bounded view rooted at one person.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub root: Person,
    /// Ancestors in discovery order, nearest generation first.
    pub ancestors: Vec<TreeMember>,
    /// Descendants in discovery order, nearest generation first.
    pub descendants: Vec<TreeMember>,
    /// Spouses of the root only; never expanded transitively.
    pub spouses: Vec<TreeMember>,
    /// Generation bound the view was built with.
    pub depth: u32,
}

impl TreeView {
    /// Total number of persons in the view, root included.
    pub fn person_count(&self) -> usize {
        1 + self.ancestors.len() + self.descendants.len() + self.spouses.len()
    }

    /// Number of relationship records the view consumed.
    pub fn relationship_count(&self) -> usize {
        self.ancestors.len() + self.descendants.len() + self.spouses.len()
    }
}

/// Derives the kinship label for a person at `generation` relative to
/// the root. Generation 0 labels the spouse hop.
pub fn kin_label(gender: Gender, generation: i32) -> String {
    if generation == 0 {
        return match gender {
            Gender::Male => "husband".to_string(),
            Gender::Female => "wife".to_string(),
            Gender::Other => "spouse".to_string(),
        };
    }

    let distance = generation.unsigned_abs();
    let base = if generation < 0 {
        match (gender, distance) {
            (Gender::Male, 1) => "father",
            (Gender::Female, 1) => "mother",
            (Gender::Other, 1) => "parent",
            (Gender::Male, _) => "grandfather",
            (Gender::Female, _) => "grandmother",
            (Gender::Other, _) => "grandparent",
        }
    } else {
        match (gender, distance) {
            (Gender::Male, 1) => "son",
            (Gender::Female, 1) => "daughter",
            (Gender::Other, 1) => "child",
            (Gender::Male, _) => "grandson",
            (Gender::Female, _) => "granddaughter",
            (Gender::Other, _) => "grandchild",
        }
    };

    if distance <= 2 {
        return base.to_string();
    }

    // Three generations away is "great-", four "great-great-", and so on.
    let mut label = String::new();
    for _ in 0..distance - 2 {
        label.push_str("great-");
    }
    label.push_str(base);
    label
}

#[cfg(test)]
mod tests {
    use super::kin_label;
    use crate::model::person::Gender;

    #[test]
    fn first_generation_labels() {
        assert_eq!(kin_label(Gender::Male, -1), "father");
        assert_eq!(kin_label(Gender::Female, -1), "mother");
        assert_eq!(kin_label(Gender::Other, -1), "parent");
        assert_eq!(kin_label(Gender::Male, 1), "son");
        assert_eq!(kin_label(Gender::Female, 1), "daughter");
    }

    #[test]
    fn spouse_labels_at_generation_zero() {
        assert_eq!(kin_label(Gender::Male, 0), "husband");
        assert_eq!(kin_label(Gender::Female, 0), "wife");
        assert_eq!(kin_label(Gender::Other, 0), "spouse");
    }

    #[test]
    fn distant_generations_gain_great_prefixes() {
        assert_eq!(kin_label(Gender::Female, -2), "grandmother");
        assert_eq!(kin_label(Gender::Male, -3), "great-grandfather");
        assert_eq!(kin_label(Gender::Other, 4), "great-great-grandchild");
    }
}
