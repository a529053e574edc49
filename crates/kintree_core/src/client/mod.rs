//! Client-side orchestration over store, session, traversal, and layout.
//!
//! # Responsibility
//! - Route fetches and mutations through session-guarded store calls.
//! - Mirror fetched state and publish diagrams to the rendering layer.
//!
//! # Invariants
//! - The mirror is updated only after the store confirms a mutation.
//! - Any successful mutation invalidates the cached tree view.

pub mod state_store;
