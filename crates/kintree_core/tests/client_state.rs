use kintree_core::db::open_db_in_memory;
use kintree_core::{
    CancelToken, ClientStateStore, Credentials, Diagram, DiagramListener, FetchOutcome, Gender,
    MemoryAuthService, Person, Relationship, SessionGuard, SqliteStore, StateError, StoreError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct DiagramProbe {
    notified: AtomicUsize,
    last: Mutex<Option<Diagram>>,
}

impl DiagramProbe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            notified: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }
}

impl DiagramListener for DiagramProbe {
    fn on_diagram(&self, diagram: &Diagram) {
        self.notified.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(diagram.clone());
    }
}

fn setup() -> (Arc<MemoryAuthService>, ClientStateStore) {
    let auth = Arc::new(MemoryAuthService::with_account("ada@example.com", "pw"));
    let conn = open_db_in_memory().unwrap();
    let store = Arc::new(SqliteStore::new(conn, auth.clone()));
    let guard = Arc::new(SessionGuard::new(auth.clone()));
    guard
        .login(&Credentials::new("ada@example.com", "pw"))
        .unwrap();
    (auth, ClientStateStore::new(store, guard))
}

fn seed_family(state: &ClientStateStore) -> Person {
    let root = state
        .add_person(Person::new("Iris", "Hale", Gender::Female))
        .unwrap();
    let father = state
        .add_person(Person::new("Martin", "Hale", Gender::Male))
        .unwrap();
    let son = state
        .add_person(Person::new("Theo", "Hale", Gender::Male))
        .unwrap();
    state
        .add_relationship(Relationship::parent_child(father.id, root.id))
        .unwrap();
    state
        .add_relationship(Relationship::parent_child(root.id, son.id))
        .unwrap();
    root
}

#[test]
fn fetch_tree_caches_and_notifies_subscribers() {
    let (_auth, state) = setup();
    let probe = DiagramProbe::new();
    state.subscribe(probe.clone());
    let root = seed_family(&state);

    assert!(state.cached_diagram().is_none());

    let outcome = state.fetch_tree(root.id, 2, &CancelToken::new()).unwrap();
    let diagram = match outcome {
        FetchOutcome::Ready(diagram) => diagram,
        FetchOutcome::Cancelled => panic!("fetch was cancelled unexpectedly"),
    };

    assert_eq!(diagram.nodes.len(), 3);
    assert_eq!(diagram.edges.len(), 2);
    assert_eq!(state.cached_diagram(), Some(diagram.clone()));
    assert_eq!(probe.notified.load(Ordering::SeqCst), 1);
    assert_eq!(*probe.last.lock().unwrap(), Some(diagram));
}

#[test]
fn fetch_tree_mirrors_every_fetched_entity() {
    let (_auth, state) = setup();
    let root = seed_family(&state);

    state.fetch_tree(root.id, 2, &CancelToken::new()).unwrap();

    let view = state.cached_view().unwrap();
    for member in view.ancestors.iter().chain(view.descendants.iter()) {
        assert!(state.person(member.person.id).is_some());
        assert!(state.relationship(member.relationship.id).is_some());
    }
}

#[test]
fn fetch_of_missing_root_is_an_error() {
    let (_auth, state) = setup();
    let ghost = Person::new("Ghost", "Nobody", Gender::Other);

    let err = state
        .fetch_tree(ghost.id, 1, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, StateError::Build(_)));
    assert!(state.cached_diagram().is_none());
}

#[test]
fn cancelled_fetch_leaves_the_cache_untouched() {
    let (_auth, state) = setup();
    let root = seed_family(&state);

    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = state.fetch_tree(root.id, 2, &cancel).unwrap();
    assert_eq!(outcome, FetchOutcome::Cancelled);
    assert!(state.cached_diagram().is_none());
    assert!(state.cached_view().is_none());
}

#[test]
fn failed_mutation_leaves_the_mirror_unchanged() {
    let (_auth, state) = setup();
    let root = seed_family(&state);
    state.fetch_tree(root.id, 1, &CancelToken::new()).unwrap();

    let invalid = Person::new("   ", "Nobody", Gender::Other);
    let err = state.add_person(invalid.clone()).unwrap_err();
    assert!(matches!(err, StateError::Store(StoreError::Validation(_))));

    assert!(state.person(invalid.id).is_none());
    // A failed write must not invalidate the cached diagram either.
    assert!(state.cached_diagram().is_some());
}

#[test]
fn successful_mutation_invalidates_the_cached_diagram() {
    let (_auth, state) = setup();
    let root = seed_family(&state);
    state.fetch_tree(root.id, 1, &CancelToken::new()).unwrap();
    assert!(state.cached_diagram().is_some());

    let added = state
        .add_person(Person::new("Mara", "Hale", Gender::Female))
        .unwrap();

    assert!(state.cached_diagram().is_none());
    assert!(state.cached_view().is_none());
    assert_eq!(state.person(added.id), Some(added));
}

#[test]
fn deleting_a_person_drops_mirrored_relationships_too() {
    let (_auth, state) = setup();
    let root = seed_family(&state);
    state.fetch_tree(root.id, 1, &CancelToken::new()).unwrap();

    let view = state.cached_view().unwrap();
    let father = view.ancestors[0].person.clone();
    let father_edge = view.ancestors[0].relationship.id;

    state.delete_person(father.id).unwrap();

    assert!(state.person(father.id).is_none());
    assert!(state.relationship(father_edge).is_none());
    // The root survives the cascade.
    assert!(state.person(root.id).is_some());
}

#[test]
fn failed_update_leaves_the_mirrored_person_unchanged() {
    let (_auth, state) = setup();
    let person = state
        .add_person(Person::new("Ada", "Lovelace", Gender::Female))
        .unwrap();

    let mut broken = person.clone();
    broken.first_name = "   ".to_string();
    let err = state.update_person(broken).unwrap_err();
    assert!(matches!(err, StateError::Store(StoreError::Validation(_))));

    assert_eq!(state.person(person.id), Some(person));
}

#[test]
fn update_person_refreshes_the_mirrored_record() {
    let (_auth, state) = setup();
    let mut person = state
        .add_person(Person::new("Ada", "Byron", Gender::Female))
        .unwrap();

    person.last_name = "Lovelace".to_string();
    state.update_person(person.clone()).unwrap();

    assert_eq!(
        state.person(person.id).unwrap().last_name,
        "Lovelace".to_string()
    );
}

#[test]
fn expired_token_is_refreshed_transparently_during_fetch() {
    let (auth, state) = setup();
    let root = seed_family(&state);

    let before = auth.refresh_call_count();
    // Expire every access token; refresh remains possible.
    auth.expire_all_access();

    let outcome = state.fetch_tree(root.id, 2, &CancelToken::new()).unwrap();
    assert!(matches!(outcome, FetchOutcome::Ready(_)));
    assert_eq!(auth.refresh_call_count(), before + 1);
}
