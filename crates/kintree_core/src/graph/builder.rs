//! Layered BFS construction of the bounded tree view.
//!
//! # Responsibility
//! - Expand ancestors, descendants, and the root's spouses from a flat
//!   relationship source, one generation layer at a time.
//! - Detect relationship cycles instead of looping on malformed data.
//!
//! # Invariants
//! - A person appears at most once per view; the first classification
//!   wins (ancestor, then descendant, then spouse, in traversal order).
//! - Within a layer the first relationship edge encountered wins ties.
//! - No partial view escapes: errors abort the build, cancellation
//!   returns a `Cancelled` outcome.

use crate::graph::view::{kin_label, TreeMember, TreeView};
use crate::graph::CancelToken;
use crate::model::person::{Person, PersonId};
use crate::model::relationship::{Relationship, RelationshipKind};
use crate::store::StoreError;
use log::{debug, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Read access the traversal needs; implemented over session-guarded
/// store calls in the client layer and by plain fixtures in tests.
///
/// `relationships` must return a deterministic order for unchanged
/// data; traversal determinism depends on it.
pub trait TreeSource {
    fn person(&self, id: PersonId) -> Result<Option<Person>, StoreError>;
    fn relationships(&self, id: PersonId) -> Result<Vec<Relationship>, StoreError>;
}

/// Build failure; no partial view is ever returned alongside one.
#[derive(Debug)]
pub enum BuildError {
    /// Root id did not resolve to a person.
    RootNotFound(PersonId),
    /// The relationship data revisits a person already on the active
    /// traversal path.
    CycleDetected(PersonId),
    /// Store-boundary failure while expanding the view.
    Store(StoreError),
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootNotFound(id) => write!(f, "root person not found: {id}"),
            Self::CycleDetected(id) => {
                write!(f, "relationship cycle detected through person: {id}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for BuildError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Build result: a complete view, or a cooperative cancellation.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Complete(TreeView),
    Cancelled,
}

/// One BFS frontier entry, carrying the ids on its own root-to-here
/// path for cycle detection.
struct PathEntry {
    id: PersonId,
    path: HashSet<PersonId>,
}

enum Direction {
    Ancestors,
    Descendants,
}

/// Deterministic layered-BFS tree builder over a `TreeSource`.
pub struct GraphBuilder<'a, S: TreeSource> {
    source: &'a S,
}

impl<'a, S: TreeSource> GraphBuilder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Builds the bounded view rooted at `root_id`, expanding up to
    /// `depth` generations in each direction plus one spouse hop.
    ///
    /// The cancellation flag is checked between generation layers; a
    /// cancelled build returns `BuildOutcome::Cancelled`, never a
    /// partial view.
    pub fn build(
        &self,
        root_id: PersonId,
        depth: u32,
        cancel: &CancelToken,
    ) -> Result<BuildOutcome, BuildError> {
        let root = self
            .source
            .person(root_id)?
            .ok_or(BuildError::RootNotFound(root_id))?;

        let mut placed: HashSet<PersonId> = HashSet::new();
        placed.insert(root_id);

        let mut ancestors = Vec::new();
        if !self.expand(
            Direction::Ancestors,
            root_id,
            depth,
            cancel,
            &mut placed,
            &mut ancestors,
        )? {
            return Ok(BuildOutcome::Cancelled);
        }

        let mut descendants = Vec::new();
        if !self.expand(
            Direction::Descendants,
            root_id,
            depth,
            cancel,
            &mut placed,
            &mut descendants,
        )? {
            return Ok(BuildOutcome::Cancelled);
        }

        if cancel.is_cancelled() {
            debug!("event=tree_build module=graph status=cancelled root={root_id}");
            return Ok(BuildOutcome::Cancelled);
        }
        let spouses = self.spouse_hop(root_id, &mut placed)?;

        let view = TreeView {
            root,
            ancestors,
            descendants,
            spouses,
            depth,
        };
        info!(
            "event=tree_build module=graph status=ok root={root_id} depth={depth} ancestors={} descendants={} spouses={}",
            view.ancestors.len(),
            view.descendants.len(),
            view.spouses.len()
        );
        Ok(BuildOutcome::Complete(view))
    }

    /// Expands one direction layer by layer. Returns `false` when the
    /// build was cancelled between layers.
    fn expand(
        &self,
        direction: Direction,
        root_id: PersonId,
        depth: u32,
        cancel: &CancelToken,
        placed: &mut HashSet<PersonId>,
        members: &mut Vec<TreeMember>,
    ) -> Result<bool, BuildError> {
        let mut frontier = vec![PathEntry {
            id: root_id,
            path: HashSet::from([root_id]),
        }];

        for layer in 1..=depth {
            if cancel.is_cancelled() {
                debug!("event=tree_build module=graph status=cancelled root={root_id} layer={layer}");
                return Ok(false);
            }

            let generation = match direction {
                Direction::Ancestors => -(layer as i32),
                Direction::Descendants => layer as i32,
            };

            let mut next_frontier = Vec::new();
            for entry in &frontier {
                for relationship in self.source.relationships(entry.id)? {
                    if relationship.kind != RelationshipKind::ParentChild {
                        continue;
                    }
                    let next_id = match direction {
                        // Walk child -> parent against the edge direction.
                        Direction::Ancestors if relationship.target_id == entry.id => {
                            relationship.source_id
                        }
                        Direction::Descendants if relationship.source_id == entry.id => {
                            relationship.target_id
                        }
                        _ => continue,
                    };

                    if entry.path.contains(&next_id) {
                        return Err(BuildError::CycleDetected(next_id));
                    }
                    if !placed.insert(next_id) {
                        // Already reachable via an earlier path; first
                        // classification wins.
                        continue;
                    }

                    let person = self
                        .source
                        .person(next_id)?
                        .ok_or(BuildError::Store(StoreError::NotFound(next_id)))?;
                    let label = kin_label(person.gender, generation);
                    members.push(TreeMember {
                        person,
                        relationship,
                        label,
                        generation,
                    });

                    let mut path = entry.path.clone();
                    path.insert(next_id);
                    next_frontier.push(PathEntry { id: next_id, path });
                }
            }

            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        Ok(true)
    }

    /// Collects the root's spouses: a single hop, never expanded.
    fn spouse_hop(
        &self,
        root_id: PersonId,
        placed: &mut HashSet<PersonId>,
    ) -> Result<Vec<TreeMember>, BuildError> {
        let mut spouses = Vec::new();
        for relationship in self.source.relationships(root_id)? {
            if relationship.kind != RelationshipKind::Spouse {
                continue;
            }
            let Some(other) = relationship.other_endpoint(root_id) else {
                continue;
            };
            if !placed.insert(other) {
                continue;
            }

            let person = self
                .source
                .person(other)?
                .ok_or(BuildError::Store(StoreError::NotFound(other)))?;
            let label = kin_label(person.gender, 0);
            spouses.push(TreeMember {
                person,
                relationship,
                label,
                generation: 0,
            });
        }
        Ok(spouses)
    }
}
