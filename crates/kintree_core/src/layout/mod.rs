//! Deterministic diagram layout.
//!
//! # Responsibility
//! - Assign coordinates and edge semantics to a tree view.
//!
//! # Invariants
//! - Layout is a pure function: identical views yield identical
//!   diagrams, byte for byte.
//! - Every edge is backed by a relationship record in the view.

pub mod engine;
