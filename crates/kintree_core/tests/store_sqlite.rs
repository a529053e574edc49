use kintree_core::db::{open_db, open_db_in_memory};
use kintree_core::{
    AccessToken, AuthClient, Credentials, Gender, MemoryAuthService, Person,
    PersonRelationshipStore, Relationship, SqliteStore, StoreError,
};
use std::sync::Arc;
use uuid::Uuid;

fn setup() -> (Arc<MemoryAuthService>, SqliteStore, AccessToken) {
    let auth = Arc::new(MemoryAuthService::with_account("ada@example.com", "pw"));
    let pair = auth
        .login(&Credentials::new("ada@example.com", "pw"))
        .unwrap();
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(conn, auth.clone());
    (auth, store, pair.access)
}

#[test]
fn create_and_get_person_roundtrip() {
    let (_auth, store, token) = setup();

    let mut person = Person::new("Ada", "Lovelace", Gender::Female);
    person.birth_date = Some("1815-12-10".to_string());
    person.birth_place = Some("London".to_string());
    person.is_deceased = true;
    store.create_person(&token, &person).unwrap();

    let loaded = store.get_person(&token, person.id).unwrap();
    assert_eq!(loaded, person);
}

#[test]
fn update_person_persists_changes() {
    let (_auth, store, token) = setup();

    let mut person = Person::new("Ada", "Byron", Gender::Female);
    store.create_person(&token, &person).unwrap();

    person.last_name = "Lovelace".to_string();
    person.birth_name = Some("Byron".to_string());
    store.update_person(&token, &person).unwrap();

    let loaded = store.get_person(&token, person.id).unwrap();
    assert_eq!(loaded.last_name, "Lovelace");
    assert_eq!(loaded.birth_name.as_deref(), Some("Byron"));
}

#[test]
fn get_missing_person_returns_not_found() {
    let (_auth, store, token) = setup();

    let missing = Uuid::new_v4();
    let err = store.get_person(&token, missing).unwrap_err();
    assert_eq!(err, StoreError::NotFound(missing));
}

#[test]
fn invalid_person_is_rejected_with_validation_error() {
    let (_auth, store, token) = setup();

    let person = Person::new("   ", "Nobody", Gender::Other);
    let err = store.create_person(&token, &person).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn expired_token_is_rejected_without_side_effects() {
    let (auth, store, token) = setup();

    let person = Person::new("Ada", "Lovelace", Gender::Female);
    auth.expire_access(&token);

    let err = store.create_person(&token, &person).unwrap_err();
    assert_eq!(err, StoreError::TokenRejected);
}

#[test]
fn spouse_record_is_stored_in_canonical_order() {
    let (_auth, store, token) = setup();

    let low = Person::with_id(Uuid::from_u128(1), "Ada", "Lovelace", Gender::Female);
    let high = Person::with_id(Uuid::from_u128(2), "William", "King", Gender::Male);
    store.create_person(&token, &low).unwrap();
    store.create_person(&token, &high).unwrap();

    // Endpoints deliberately reversed; the store must normalize them.
    let stored = store
        .create_relationship(
            &token,
            &Relationship::spouse(high.id, low.id, Some("1835-07-08".to_string())),
        )
        .unwrap();
    assert_eq!(stored.source_id, low.id);
    assert_eq!(stored.target_id, high.id);

    let listed = store.list_relationships(&token, high.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].source_id, low.id);
    assert_eq!(listed[0].marriage_date.as_deref(), Some("1835-07-08"));
}

#[test]
fn duplicate_spouse_pair_is_a_conflict_even_when_reversed() {
    let (_auth, store, token) = setup();

    let a = Person::new("Ada", "Lovelace", Gender::Female);
    let b = Person::new("William", "King", Gender::Male);
    store.create_person(&token, &a).unwrap();
    store.create_person(&token, &b).unwrap();

    store
        .create_relationship(&token, &Relationship::spouse(a.id, b.id, None))
        .unwrap();
    let err = store
        .create_relationship(&token, &Relationship::spouse(b.id, a.id, None))
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn duplicate_parent_child_pair_is_a_conflict() {
    let (_auth, store, token) = setup();

    let parent = Person::new("Anne", "Byron", Gender::Female);
    let child = Person::new("Ada", "Byron", Gender::Female);
    store.create_person(&token, &parent).unwrap();
    store.create_person(&token, &child).unwrap();

    store
        .create_relationship(&token, &Relationship::parent_child(parent.id, child.id))
        .unwrap();
    let err = store
        .create_relationship(&token, &Relationship::parent_child(parent.id, child.id))
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[test]
fn relationship_endpoints_must_exist() {
    let (_auth, store, token) = setup();

    let parent = Person::new("Anne", "Byron", Gender::Female);
    store.create_person(&token, &parent).unwrap();

    let ghost = Uuid::new_v4();
    let err = store
        .create_relationship(&token, &Relationship::parent_child(parent.id, ghost))
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound(ghost));
}

#[test]
fn marriage_date_on_parent_child_is_rejected() {
    let (_auth, store, token) = setup();

    let parent = Person::new("Anne", "Byron", Gender::Female);
    let child = Person::new("Ada", "Byron", Gender::Female);
    store.create_person(&token, &parent).unwrap();
    store.create_person(&token, &child).unwrap();

    let mut rel = Relationship::parent_child(parent.id, child.id);
    rel.marriage_date = Some("1835-07-08".to_string());
    let err = store.create_relationship(&token, &rel).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn update_relationship_sets_marriage_date() {
    let (_auth, store, token) = setup();

    let a = Person::new("Ada", "Lovelace", Gender::Female);
    let b = Person::new("William", "King", Gender::Male);
    store.create_person(&token, &a).unwrap();
    store.create_person(&token, &b).unwrap();

    let mut rel = store
        .create_relationship(&token, &Relationship::spouse(a.id, b.id, None))
        .unwrap();
    rel.marriage_date = Some("1835-07-08".to_string());
    store.update_relationship(&token, &rel).unwrap();

    let listed = store.list_relationships(&token, a.id).unwrap();
    assert_eq!(listed[0].marriage_date.as_deref(), Some("1835-07-08"));
}

#[test]
fn deleting_a_person_cascades_to_incident_relationships() {
    let (_auth, store, token) = setup();

    let parent = Person::new("Anne", "Byron", Gender::Female);
    let child = Person::new("Ada", "Byron", Gender::Female);
    let spouse = Person::new("William", "King", Gender::Male);
    store.create_person(&token, &parent).unwrap();
    store.create_person(&token, &child).unwrap();
    store.create_person(&token, &spouse).unwrap();

    store
        .create_relationship(&token, &Relationship::parent_child(parent.id, child.id))
        .unwrap();
    store
        .create_relationship(&token, &Relationship::spouse(child.id, spouse.id, None))
        .unwrap();

    store.delete_person(&token, child.id).unwrap();

    assert!(store.list_relationships(&token, parent.id).unwrap().is_empty());
    assert!(store.list_relationships(&token, spouse.id).unwrap().is_empty());
    let err = store.get_person(&token, child.id).unwrap_err();
    assert_eq!(err, StoreError::NotFound(child.id));
}

#[test]
fn delete_relationship_keeps_both_persons() {
    let (_auth, store, token) = setup();

    let a = Person::new("Ada", "Lovelace", Gender::Female);
    let b = Person::new("William", "King", Gender::Male);
    store.create_person(&token, &a).unwrap();
    store.create_person(&token, &b).unwrap();

    let rel = store
        .create_relationship(&token, &Relationship::spouse(a.id, b.id, None))
        .unwrap();
    store.delete_relationship(&token, rel.id).unwrap();

    assert!(store.list_relationships(&token, a.id).unwrap().is_empty());
    assert!(store.get_person(&token, a.id).is_ok());
    assert!(store.get_person(&token, b.id).is_ok());
}

#[test]
fn list_relationships_preserves_insertion_order() {
    let (_auth, store, token) = setup();

    let root = Person::new("Ada", "Lovelace", Gender::Female);
    store.create_person(&token, &root).unwrap();

    let mut expected = Vec::new();
    for index in 0..5 {
        let child = Person::new(format!("Child{index}"), "Lovelace", Gender::Other);
        store.create_person(&token, &child).unwrap();
        let rel = store
            .create_relationship(&token, &Relationship::parent_child(root.id, child.id))
            .unwrap();
        expected.push(rel.id);
    }

    let listed: Vec<_> = store
        .list_relationships(&token, root.id)
        .unwrap()
        .into_iter()
        .map(|rel| rel.id)
        .collect();
    assert_eq!(listed, expected);

    let again: Vec<_> = store
        .list_relationships(&token, root.id)
        .unwrap()
        .into_iter()
        .map(|rel| rel.id)
        .collect();
    assert_eq!(again, expected);
}

#[test]
fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kintree.db");

    let auth = Arc::new(MemoryAuthService::with_account("ada@example.com", "pw"));
    let pair = auth
        .login(&Credentials::new("ada@example.com", "pw"))
        .unwrap();
    let token = pair.access;

    let person = Person::new("Ada", "Lovelace", Gender::Female);
    {
        let store = SqliteStore::new(open_db(&path).unwrap(), auth.clone());
        store.create_person(&token, &person).unwrap();
    }

    let store = SqliteStore::new(open_db(&path).unwrap(), auth);
    let loaded = store.get_person(&token, person.id).unwrap();
    assert_eq!(loaded.first_name, "Ada");
    assert!(store.list_relationships(&token, person.id).unwrap().is_empty());
}
