//! Positioned node/edge diagram derivation.
//!
//! # Responsibility
//! - Map generations to vertical bands and discovery order to
//!   horizontal slots.
//! - Emit one edge per relationship record consumed by the view.
//!
//! # Invariants
//! - Root sits at the origin; generation g maps to the band
//!   `origin_y + g * vertical_step`.
//! - Node count is `1 + |ancestors| + |descendants| + |spouses|`;
//!   node and edge ids are unique within one diagram.

use crate::graph::view::{TreeMember, TreeView};
use crate::model::person::{Person, PersonId};
use crate::model::relationship::{RelationshipId, RelationshipKind};
use serde::Serialize;
use std::collections::HashMap;

const ORIGIN_X: f64 = 400.0;
const ORIGIN_Y: f64 = 300.0;
const BAND_START_X: f64 = 200.0;
const SPOUSE_START_X: f64 = 600.0;
const HORIZONTAL_STEP: f64 = 150.0;
const VERTICAL_STEP: f64 = 200.0;

const ANCESTOR_STROKE: &str = "#3b82f6";
const DESCENDANT_STROKE: &str = "#10b981";
const SPOUSE_STROKE: &str = "#ec4899";

/// 2D diagram coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Positioned person node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node id equals the person id.
    pub id: PersonId,
    pub position: Point,
    pub generation: i32,
    pub person: Person,
}

/// Stroke styling attached to each edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: String,
    pub width: f32,
    /// Directed edges render an arrow head at the target.
    pub arrow: bool,
}

/// One rendered relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Edge id equals the backing relationship id.
    pub id: RelationshipId,
    /// For parent-child edges this is the parent, regardless of the
    /// direction the traversal discovered the record in.
    pub source: PersonId,
    pub target: PersonId,
    pub kind: RelationshipKind,
    /// Kinship label for parent-child edges; marriage date for spouse
    /// edges when present.
    pub label: Option<String>,
    pub style: EdgeStyle,
}

/// Layout output handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Pure, deterministic layout over a tree view.
pub struct LayoutEngine;

impl LayoutEngine {
    /// Positions every view member and derives one edge per consumed
    /// relationship record. Calling this twice on the same view yields
    /// identical diagrams.
    pub fn layout(view: &TreeView) -> Diagram {
        let mut nodes = Vec::with_capacity(view.person_count());
        let mut edges = Vec::with_capacity(view.relationship_count());

        nodes.push(Node {
            id: view.root.id,
            position: Point {
                x: ORIGIN_X,
                y: ORIGIN_Y,
            },
            generation: 0,
            person: view.root.clone(),
        });

        // Horizontal slot counters per generation band, in discovery order.
        let mut band_slots: HashMap<i32, usize> = HashMap::new();

        for member in &view.ancestors {
            let node = place_in_band(member, &mut band_slots);
            edges.push(parent_child_edge(member, ANCESTOR_STROKE));
            nodes.push(node);
        }
        for member in &view.descendants {
            let node = place_in_band(member, &mut band_slots);
            edges.push(parent_child_edge(member, DESCENDANT_STROKE));
            nodes.push(node);
        }
        for (index, member) in view.spouses.iter().enumerate() {
            nodes.push(Node {
                id: member.person.id,
                position: Point {
                    x: SPOUSE_START_X + index as f64 * HORIZONTAL_STEP,
                    y: ORIGIN_Y,
                },
                generation: 0,
                person: member.person.clone(),
            });
            edges.push(Edge {
                id: member.relationship.id,
                source: member.relationship.source_id,
                target: member.relationship.target_id,
                kind: RelationshipKind::Spouse,
                label: member.relationship.marriage_date.clone(),
                style: EdgeStyle {
                    stroke: SPOUSE_STROKE.to_string(),
                    width: 3.0,
                    arrow: false,
                },
            });
        }

        Diagram { nodes, edges }
    }
}

fn place_in_band(member: &TreeMember, band_slots: &mut HashMap<i32, usize>) -> Node {
    let slot = band_slots.entry(member.generation).or_insert(0);
    let position = Point {
        x: BAND_START_X + *slot as f64 * HORIZONTAL_STEP,
        y: ORIGIN_Y + member.generation as f64 * VERTICAL_STEP,
    };
    *slot += 1;

    Node {
        id: member.person.id,
        position,
        generation: member.generation,
        person: member.person.clone(),
    }
}

fn parent_child_edge(member: &TreeMember, stroke: &str) -> Edge {
    Edge {
        id: member.relationship.id,
        // The stored record already runs parent -> child.
        source: member.relationship.source_id,
        target: member.relationship.target_id,
        kind: RelationshipKind::ParentChild,
        label: Some(member.label.clone()),
        style: EdgeStyle {
            stroke: stroke.to_string(),
            width: 2.0,
            arrow: true,
        },
    }
}
