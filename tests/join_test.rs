// End-to-end join scenarios against the in-memory store.

use std::sync::Arc;

use serde_json::json;

use docjoin::error::{AbortedJoin, JoinError};
use docjoin::join::{JoinSession, JoinSpec};
use docjoin::store::{document, Document, MemoryStore, ScalarReader, ID_FIELD};

fn session_over(store: &MemoryStore) -> JoinSession {
    JoinSession::new(Arc::new(store.clone()))
}

#[tokio::test]
async fn joins_a_referenced_document_in_place_of_the_reference() {
    let store = MemoryStore::new();
    store.insert("C", document([("key", json!("x")), ("v", json!(1))]));
    store.insert(
        "primaries",
        document([("name", json!("p1")), ("ref", json!("x"))]),
    );

    let mut session = session_over(&store);
    session.on(JoinSpec::new("ref", "key", "C")).unwrap();

    let mut reader = session
        .bind_scalar(store.find("primaries", &Document::new()))
        .unwrap();
    let joined = reader.next_document().await.unwrap().unwrap();
    assert_eq!(joined["name"], json!("p1"));
    assert_eq!(joined["ref"]["key"], json!("x"));
    assert_eq!(joined["ref"]["v"], json!(1));
    assert!(reader.next_document().await.unwrap().is_none());
}

#[tokio::test]
async fn empty_target_collection_leaves_the_reference_untouched() {
    let store = MemoryStore::new();
    store.insert(
        "primaries",
        document([("name", json!("p1")), ("ref", json!("x"))]),
    );

    let mut session = session_over(&store);
    session.on(JoinSpec::new("ref", "key", "C")).unwrap();

    let mut reader = session
        .bind_scalar(store.find("primaries", &Document::new()))
        .unwrap();
    let joined = reader.next_document().await.unwrap().unwrap();
    assert_eq!(joined["ref"], json!("x"));
}

#[tokio::test]
async fn invalid_identifier_reference_aborts_with_the_document_unchanged() {
    let store = MemoryStore::new();
    store.insert(
        "primaries",
        document([("name", json!("p1")), ("owner", json!("not-hex"))]),
    );

    let mut session = session_over(&store);
    session.on(JoinSpec::new("owner", ID_FIELD, "users")).unwrap();

    let mut reader = session
        .bind_scalar(store.find("primaries", &Document::new()))
        .unwrap();
    let err = reader.next_document().await.unwrap_err();
    let aborted = err.downcast_ref::<AbortedJoin>().unwrap();
    assert!(matches!(aborted.source, JoinError::InvalidIdentifier { .. }));
    assert_eq!(aborted.applied, 0);
    assert_eq!(aborted.partial["owner"], json!("not-hex"));
}

#[tokio::test]
async fn builder_quadruples_join_two_secondaries_from_one_collection() {
    // Mirrors the classic shape: one master document referencing two
    // sub-documents by name, all in the same collection.
    let store = MemoryStore::new();
    store.insert(
        "jointest",
        document([
            ("name", json!("master-foo")),
            ("sub1", json!("sub-bar")),
            ("sub2", json!("sub-baz")),
        ]),
    );
    store.insert(
        "jointest",
        document([("name", json!("sub-bar")), ("amount", json!(10))]),
    );
    store.insert(
        "jointest",
        document([("name", json!("sub-baz")), ("amount", json!(42))]),
    );

    let mut session = session_over(&store);
    session.field("sub1").to("name").from("jointest").as_field("sub1");
    session.field("sub2").to("name").from("jointest").as_field("sub2");

    let master_query = document([("name", json!("master-foo"))]);
    let mut reader = session
        .bind_scalar(store.find("jointest", &master_query))
        .unwrap();
    let joined = reader.next_document().await.unwrap().unwrap();
    assert_eq!(joined["sub1"]["amount"], json!(10));
    assert_eq!(joined["sub2"]["amount"], json!(42));
}

#[tokio::test]
async fn identifier_reference_joins_through_the_canonical_form() {
    let store = MemoryStore::new();
    let owner = store.insert("users", document([("name", json!("ada"))]));
    let owner_hex = owner[ID_FIELD]["$oid"].as_str().unwrap().to_string();
    store.insert(
        "primaries",
        document([("name", json!("p1")), ("owner", json!(owner_hex))]),
    );

    let mut session = session_over(&store);
    session.on(JoinSpec::new("owner", ID_FIELD, "users")).unwrap();

    let mut reader = session
        .bind_scalar(store.find("primaries", &Document::new()))
        .unwrap();
    let joined = reader.next_document().await.unwrap().unwrap();
    assert_eq!(joined["owner"]["name"], json!("ada"));
}
