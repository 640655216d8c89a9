// Consumption-adapter contracts: transparency, option elision, terminal
// passthrough, and partial-state propagation through the error channel.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use docjoin::error::AbortedBatch;
use docjoin::join::{JoinSession, JoinSpec};
use docjoin::store::{
    document, BatchReader, CollectionHandle, Document, DocumentStore, FetchOptions, FindOptions,
    MemoryStore, ScalarReader, StoreResult,
};

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert("C", document([("key", json!("x")), ("v", json!(1))]));
    store.insert(
        "primaries",
        document([("name", json!("p1")), ("ref", json!("x"))]),
    );
    store.insert(
        "primaries",
        document([("name", json!("p2")), ("ref", json!("x"))]),
    );
    store
}

fn session_over(store: &MemoryStore) -> JoinSession {
    let mut session = JoinSession::new(Arc::new(store.clone()));
    session.on(JoinSpec::new("ref", "key", "C")).unwrap();
    session
}

/// Counts which scalar entry point the adapter routed to.
struct CountingReader<R> {
    inner: R,
    elided_calls: usize,
    explicit_calls: usize,
}

#[async_trait]
impl<R: ScalarReader> ScalarReader for CountingReader<R> {
    async fn next_document_with(
        &mut self,
        options: FetchOptions,
    ) -> StoreResult<Option<Document>> {
        self.explicit_calls += 1;
        self.inner.next_document_with(options).await
    }

    async fn next_document(&mut self) -> StoreResult<Option<Document>> {
        self.elided_calls += 1;
        self.inner.next_document().await
    }
}

#[tokio::test]
async fn scalar_adapter_routes_both_call_shapes_to_the_matching_inner_shape() {
    let store = seeded();
    let session = session_over(&store);
    let counting = CountingReader {
        inner: store.find("primaries", &Document::new()),
        elided_calls: 0,
        explicit_calls: 0,
    };
    let mut reader = session.bind_scalar(counting).unwrap();

    let first = reader.next_document().await.unwrap().unwrap();
    let second = reader
        .next_document_with(FetchOptions::default())
        .await
        .unwrap()
        .unwrap();
    // Both shapes deliver joined documents.
    assert_eq!(first["ref"]["v"], json!(1));
    assert_eq!(second["ref"]["v"], json!(1));

    let counting = reader.into_inner();
    assert_eq!(counting.elided_calls, 1);
    assert_eq!(counting.explicit_calls, 1);
}

#[tokio::test]
async fn scalar_adapter_passes_the_terminal_none_through_unjoined() {
    let store = seeded();
    let session = session_over(&store);
    let mut reader = session
        .bind_scalar(store.find("primaries", &Document::new()))
        .unwrap();
    assert!(reader.next_document().await.unwrap().is_some());
    assert!(reader.next_document().await.unwrap().is_some());
    assert!(reader.next_document().await.unwrap().is_none());
    // Still terminal on repeated calls.
    assert!(reader.next_document().await.unwrap().is_none());
}

#[tokio::test]
async fn batch_adapter_joins_the_whole_batch_in_order() {
    let store = seeded();
    let session = session_over(&store);
    let mut reader = session
        .bind_batch(store.find("primaries", &Document::new()))
        .unwrap();
    let docs = reader.read_all().await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["name"], json!("p1"));
    assert_eq!(docs[1]["name"], json!("p2"));
    assert_eq!(docs[0]["ref"]["v"], json!(1));
    assert_eq!(docs[1]["ref"]["v"], json!(1));
}

#[tokio::test]
async fn batch_adapter_with_no_specs_returns_structurally_equal_documents() {
    let store = seeded();
    let session = JoinSession::new(Arc::new(store.clone()));
    let raw = store
        .find("primaries", &Document::new())
        .read_all()
        .await
        .unwrap();
    let mut reader = session
        .bind_batch(store.find("primaries", &Document::new()))
        .unwrap();
    let joined = reader.read_all().await.unwrap();
    assert_eq!(joined, raw);
}

#[tokio::test]
async fn lookup_adapter_joins_a_found_document_and_passes_misses_through() {
    let store = seeded();
    let session = session_over(&store);
    let primaries = store.collection("primaries").await.unwrap();
    let wrapped = session.bind_collection(primaries).unwrap();

    let query = document([("name", json!("p1"))]);
    let found = wrapped
        .find_one(&query, FindOptions::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found["ref"]["v"], json!(1));

    let missing = document([("name", json!("nobody"))]);
    let found = wrapped
        .find_one(&missing, FindOptions::default())
        .await
        .unwrap();
    assert!(found.is_none());
}

/// Store whose handle resolution fails for one collection name.
struct FailingStore {
    inner: MemoryStore,
    poisoned: String,
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn collection(&self, name: &str) -> StoreResult<Arc<dyn CollectionHandle>> {
        if name == self.poisoned {
            return Err(format!("connection to '{}' refused", name).into());
        }
        self.inner.collection(name).await
    }
}

#[tokio::test]
async fn batch_adapter_surfaces_the_joined_prefix_inside_the_error() {
    let store = seeded();
    // Two soft-miss documents first, then one that actually resolves the
    // poisoned collection.
    let mut docs = vec![
        document([("n", json!(0))]),
        document([("n", json!(1))]),
        document([("n", json!(2)), ("ref", json!("x"))]),
        document([("n", json!(3)), ("ref", json!("x"))]),
    ];
    for doc in docs.drain(..) {
        store.insert("batch", doc);
    }

    let mut session = JoinSession::new(Arc::new(FailingStore {
        inner: store.clone(),
        poisoned: "C".to_string(),
    }));
    session.on(JoinSpec::new("ref", "key", "C")).unwrap();

    let mut reader = session
        .bind_batch(store.find("batch", &Document::new()))
        .unwrap();
    let err = reader.read_all().await.unwrap_err();
    let aborted = err.downcast_ref::<AbortedBatch>().unwrap();
    assert_eq!(aborted.index, 2);
    assert_eq!(aborted.joined.len(), 2);
    assert_eq!(aborted.joined[0]["n"], json!(0));
    assert_eq!(aborted.joined[1]["n"], json!(1));
}
