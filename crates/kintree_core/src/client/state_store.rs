//! Client state facade with an optimistic local mirror.
//!
//! # Responsibility
//! - Orchestrate tree fetches: guarded store reads -> builder -> layout.
//! - Apply CRUD mutations through the store, mirroring results locally
//!   only after success.
//!
//! # Invariants
//! - Readers never observe a partially-applied mutation: the mirror is
//!   replaced atomically under one lock scope.
//! - Mutation failure leaves the mirror byte-identical to before.
//! - A successful mutation invalidates the cached view and diagram.

use crate::graph::builder::{BuildError, BuildOutcome, GraphBuilder, TreeSource};
use crate::graph::view::TreeView;
use crate::graph::CancelToken;
use crate::layout::engine::{Diagram, LayoutEngine};
use crate::model::person::{Person, PersonId};
use crate::model::relationship::{Relationship, RelationshipId};
use crate::session::guard::SessionGuard;
use crate::store::{PersonRelationshipStore, StoreError};
use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

/// Subscriber notified whenever a new diagram is available.
pub trait DiagramListener: Send + Sync {
    fn on_diagram(&self, diagram: &Diagram);
}

/// Client-layer failure surfaced to the rendering layer.
#[derive(Debug)]
pub enum StateError {
    /// Store-boundary failure during a mutation or mirror read-through.
    Store(StoreError),
    /// Tree construction failure during a fetch.
    Build(BuildError),
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Build(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Build(err) => Some(err),
        }
    }
}

impl From<StoreError> for StateError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<BuildError> for StateError {
    fn from(value: BuildError) -> Self {
        Self::Build(value)
    }
}

/// Fetch result: a ready diagram, or a cooperative cancellation.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Ready(Diagram),
    Cancelled,
}

/// `TreeSource` adapter routing builder reads through the session guard.
struct GuardedTreeSource {
    store: Arc<dyn PersonRelationshipStore>,
    guard: Arc<SessionGuard>,
}

impl TreeSource for GuardedTreeSource {
    fn person(&self, id: PersonId) -> Result<Option<Person>, StoreError> {
        match self.guard.call(|token| self.store.get_person(token, id)) {
            Ok(person) => Ok(Some(person)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn relationships(&self, id: PersonId) -> Result<Vec<Relationship>, StoreError> {
        self.guard
            .call(|token| self.store.list_relationships(token, id))
    }
}

#[derive(Default)]
struct StateMirror {
    persons: BTreeMap<PersonId, Person>,
    relationships: BTreeMap<RelationshipId, Relationship>,
    last_view: Option<TreeView>,
    last_diagram: Option<Diagram>,
}

/// Facade combining guarded store access with an in-memory mirror and
/// the last fetched view/diagram.
pub struct ClientStateStore {
    store: Arc<dyn PersonRelationshipStore>,
    guard: Arc<SessionGuard>,
    mirror: Mutex<StateMirror>,
    listeners: Mutex<Vec<Arc<dyn DiagramListener>>>,
}

impl ClientStateStore {
    pub fn new(store: Arc<dyn PersonRelationshipStore>, guard: Arc<SessionGuard>) -> Self {
        Self {
            store,
            guard,
            mirror: Mutex::new(StateMirror::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Registers a rendering-layer subscriber for diagram updates.
    pub fn subscribe(&self, listener: Arc<dyn DiagramListener>) {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        listeners.push(listener);
    }

    /// Fetches the bounded tree rooted at `root`, lays it out, caches
    /// view and diagram atomically, and notifies subscribers.
    pub fn fetch_tree(
        &self,
        root: PersonId,
        depth: u32,
        cancel: &CancelToken,
    ) -> Result<FetchOutcome, StateError> {
        let source = GuardedTreeSource {
            store: Arc::clone(&self.store),
            guard: Arc::clone(&self.guard),
        };
        let builder = GraphBuilder::new(&source);

        let view = match builder.build(root, depth, cancel)? {
            BuildOutcome::Cancelled => return Ok(FetchOutcome::Cancelled),
            BuildOutcome::Complete(view) => view,
        };
        let diagram = LayoutEngine::layout(&view);

        {
            let mut mirror = self.lock_mirror();
            mirror.persons.insert(view.root.id, view.root.clone());
            for member in view
                .ancestors
                .iter()
                .chain(view.descendants.iter())
                .chain(view.spouses.iter())
            {
                mirror.persons.insert(member.person.id, member.person.clone());
                mirror
                    .relationships
                    .insert(member.relationship.id, member.relationship.clone());
            }
            mirror.last_view = Some(view);
            mirror.last_diagram = Some(diagram.clone());
        }

        info!(
            "event=tree_fetch module=client status=ok root={root} depth={depth} nodes={} edges={}",
            diagram.nodes.len(),
            diagram.edges.len()
        );
        self.notify_diagram(&diagram);
        Ok(FetchOutcome::Ready(diagram))
    }

    /// Returns the last fetched diagram, if still valid.
    pub fn cached_diagram(&self) -> Option<Diagram> {
        self.lock_mirror().last_diagram.clone()
    }

    /// Returns the last fetched view, if still valid.
    pub fn cached_view(&self) -> Option<TreeView> {
        self.lock_mirror().last_view.clone()
    }

    /// Reads one person from the local mirror.
    pub fn person(&self, id: PersonId) -> Option<Person> {
        self.lock_mirror().persons.get(&id).cloned()
    }

    /// Reads one relationship from the local mirror.
    pub fn relationship(&self, id: RelationshipId) -> Option<Relationship> {
        self.lock_mirror().relationships.get(&id).cloned()
    }

    pub fn add_person(&self, person: Person) -> Result<Person, StateError> {
        let stored = self
            .guard
            .call(|token| self.store.create_person(token, &person))?;
        let mut mirror = self.lock_mirror();
        mirror.persons.insert(stored.id, stored.clone());
        invalidate(&mut mirror);
        Ok(stored)
    }

    pub fn update_person(&self, person: Person) -> Result<Person, StateError> {
        let stored = self
            .guard
            .call(|token| self.store.update_person(token, &person))?;
        let mut mirror = self.lock_mirror();
        mirror.persons.insert(stored.id, stored.clone());
        invalidate(&mut mirror);
        Ok(stored)
    }

    pub fn delete_person(&self, id: PersonId) -> Result<(), StateError> {
        self.guard
            .call(|token| self.store.delete_person(token, id))?;
        let mut mirror = self.lock_mirror();
        mirror.persons.remove(&id);
        // The store drops incident relationships with the person.
        mirror
            .relationships
            .retain(|_, rel| rel.source_id != id && rel.target_id != id);
        invalidate(&mut mirror);
        Ok(())
    }

    pub fn add_relationship(&self, relationship: Relationship) -> Result<Relationship, StateError> {
        let stored = self
            .guard
            .call(|token| self.store.create_relationship(token, &relationship))?;
        let mut mirror = self.lock_mirror();
        mirror.relationships.insert(stored.id, stored.clone());
        invalidate(&mut mirror);
        Ok(stored)
    }

    pub fn update_relationship(
        &self,
        relationship: Relationship,
    ) -> Result<Relationship, StateError> {
        let stored = self
            .guard
            .call(|token| self.store.update_relationship(token, &relationship))?;
        let mut mirror = self.lock_mirror();
        mirror.relationships.insert(stored.id, stored.clone());
        invalidate(&mut mirror);
        Ok(stored)
    }

    pub fn delete_relationship(&self, id: RelationshipId) -> Result<(), StateError> {
        self.guard
            .call(|token| self.store.delete_relationship(token, id))?;
        let mut mirror = self.lock_mirror();
        mirror.relationships.remove(&id);
        invalidate(&mut mirror);
        Ok(())
    }

    fn notify_diagram(&self, diagram: &Diagram) {
        let listeners = {
            let listeners = self
                .listeners
                .lock()
                .unwrap_or_else(|err| err.into_inner());
            listeners.clone()
        };
        for listener in listeners {
            listener.on_diagram(diagram);
        }
    }

    fn lock_mirror(&self) -> MutexGuard<'_, StateMirror> {
        self.mirror.lock().unwrap_or_else(|err| err.into_inner())
    }
}

fn invalidate(mirror: &mut StateMirror) {
    mirror.last_view = None;
    mirror.last_diagram = None;
}
