//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `kintree_core` linkage.
//! - Run one seeded fetch end to end with deterministic output.

use kintree_core::db::open_db_in_memory;
use kintree_core::{
    CancelToken, ClientStateStore, Credentials, FetchOutcome, Gender, MemoryAuthService, Person,
    Relationship, SessionGuard, SqliteStore,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("kintree_core ping={}", kintree_core::ping());
    println!("kintree_core version={}", kintree_core::core_version());

    match run_demo() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("demo failed: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Seeds a three-generation family in memory and prints the diagram.
fn run_demo() -> Result<(), String> {
    let auth = Arc::new(MemoryAuthService::with_account("demo@kintree.local", "demo"));
    let conn = open_db_in_memory().map_err(|err| err.to_string())?;
    let store = Arc::new(SqliteStore::new(conn, auth.clone()));
    let guard = Arc::new(SessionGuard::new(auth));
    guard
        .login(&Credentials::new("demo@kintree.local", "demo"))
        .map_err(|err| err.to_string())?;

    let state = ClientStateStore::new(store, guard);

    let root = state
        .add_person(Person::new("Iris", "Hale", Gender::Female))
        .map_err(|err| err.to_string())?;
    let father = state
        .add_person(Person::new("Martin", "Hale", Gender::Male))
        .map_err(|err| err.to_string())?;
    let son = state
        .add_person(Person::new("Theo", "Hale", Gender::Male))
        .map_err(|err| err.to_string())?;
    let spouse = state
        .add_person(Person::new("Jonah", "Reyes", Gender::Male))
        .map_err(|err| err.to_string())?;

    state
        .add_relationship(Relationship::parent_child(father.id, root.id))
        .map_err(|err| err.to_string())?;
    state
        .add_relationship(Relationship::parent_child(root.id, son.id))
        .map_err(|err| err.to_string())?;
    state
        .add_relationship(Relationship::spouse(
            root.id,
            spouse.id,
            Some("2008-05-17".to_string()),
        ))
        .map_err(|err| err.to_string())?;

    let cancel = CancelToken::new();
    let diagram = match state
        .fetch_tree(root.id, 3, &cancel)
        .map_err(|err| err.to_string())?
    {
        FetchOutcome::Ready(diagram) => diagram,
        FetchOutcome::Cancelled => return Err("fetch was cancelled unexpectedly".to_string()),
    };

    println!(
        "tree root={} {} nodes={} edges={}",
        root.first_name,
        root.last_name,
        diagram.nodes.len(),
        diagram.edges.len()
    );
    for edge in &diagram.edges {
        println!(
            "edge kind={:?} label={}",
            edge.kind,
            edge.label.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
