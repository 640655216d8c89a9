//! In-memory reference store.
//!
//! Implements every collaborator trait over plain vectors behind locks.
//! Collections are created lazily on first touch, inserts assign a fresh
//! `_id` when one is missing, and cursors are snapshots taken at `find`
//! time. The event stream pushes through a bounded channel whose producer
//! task honors pause/resume, so it behaves like a genuinely eager source.

use async_trait::async_trait;
use log::trace;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, Notify};

use super::traits::{
    BatchReader, CollectionHandle, DocumentStore, EventReader, FetchOptions, FindOptions,
    ScalarReader, StoreResult,
};
use super::{Document, DocumentId, ID_FIELD};

/// In-memory document store. Cheap to clone; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Arc<MemoryCollection>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, assigning a fresh `_id` when absent. Returns the
    /// document as stored.
    pub fn insert(&self, collection: &str, mut doc: Document) -> Document {
        if !doc.contains_key(ID_FIELD) {
            doc.insert(ID_FIELD.to_string(), DocumentId::new().to_value());
        }
        let handle = self.handle(collection);
        handle.docs.write().unwrap().push(doc.clone());
        doc
    }

    /// Snapshot cursor over the documents matching `query`, in insertion
    /// order. An empty query matches everything.
    pub fn find(&self, collection: &str, query: &Document) -> MemoryCursor {
        self.handle(collection).find(query)
    }

    /// Push-based stream over the documents matching `query`.
    ///
    /// Spawns the producer task immediately, so a Tokio runtime must be
    /// running.
    pub fn stream(&self, collection: &str, query: &Document) -> MemoryEventStream {
        let matches = self.handle(collection).matching(query);
        MemoryEventStream::from_documents(matches)
    }

    fn handle(&self, name: &str) -> Arc<MemoryCollection> {
        let mut map = self.collections.write().unwrap();
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
            .clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn collection(&self, name: &str) -> StoreResult<Arc<dyn CollectionHandle>> {
        Ok(self.handle(name))
    }
}

/// One in-memory collection.
pub struct MemoryCollection {
    name: String,
    docs: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            docs: RwLock::new(Vec::new()),
        }
    }

    fn matching(&self, query: &Document) -> Vec<Document> {
        self.docs
            .read()
            .unwrap()
            .iter()
            .filter(|doc| matches_query(doc, query))
            .cloned()
            .collect()
    }

    fn find(&self, query: &Document) -> MemoryCursor {
        MemoryCursor {
            remaining: self.matching(query).into(),
        }
    }
}

#[async_trait]
impl CollectionHandle for MemoryCollection {
    async fn find_one(
        &self,
        query: &Document,
        options: FindOptions,
    ) -> StoreResult<Option<Document>> {
        let found = self
            .docs
            .read()
            .unwrap()
            .iter()
            .find(|doc| matches_query(doc, query))
            .cloned();
        trace!(
            "find_one on '{}': {}",
            self.name,
            if found.is_some() { "hit" } else { "miss" }
        );
        Ok(found.map(|doc| apply_projection(doc, &options)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn matches_query(doc: &Document, query: &Document) -> bool {
    query.iter().all(|(field, value)| doc.get(field) == Some(value))
}

fn apply_projection(doc: Document, options: &FindOptions) -> Document {
    match &options.projection {
        None => doc,
        Some(fields) => doc
            .into_iter()
            .filter(|(key, _)| key.as_str() == ID_FIELD || fields.iter().any(|f| f == key))
            .collect(),
    }
}

/// Snapshot cursor over one collection. Serves both the scalar get-next and
/// the bulk materialize primitives, like a driver cursor would.
pub struct MemoryCursor {
    remaining: VecDeque<Document>,
}

impl MemoryCursor {
    /// Documents left on the cursor.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

#[async_trait]
impl ScalarReader for MemoryCursor {
    async fn next_document_with(
        &mut self,
        _options: FetchOptions,
    ) -> StoreResult<Option<Document>> {
        // A snapshot never waits, so any timeout is trivially satisfied.
        Ok(self.remaining.pop_front())
    }
}

#[async_trait]
impl BatchReader for MemoryCursor {
    async fn read_all(&mut self) -> StoreResult<Vec<Document>> {
        Ok(self.remaining.drain(..).collect())
    }
}

/// Gate shared between a stream's producer task and its consumer handle.
#[derive(Default)]
struct PauseGate {
    paused: AtomicBool,
    resumed: Notify,
}

impl PauseGate {
    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resumed.notify_waiters();
    }

    async fn ready(&self) {
        while self.paused.load(Ordering::SeqCst) {
            let resumed = self.resumed.notified();
            tokio::pin!(resumed);
            // Register for the wakeup before re-checking the flag; a
            // notify_waiters() only reaches futures already enabled, so
            // enabling first means a resume() landing after the re-check
            // cannot be lost.
            resumed.as_mut().enable();
            if !self.paused.load(Ordering::SeqCst) {
                return;
            }
            resumed.await;
        }
    }
}

/// Push-based stream over a fixed set of documents.
///
/// A producer task sends each item through a capacity-1 channel as fast as
/// the gate allows; `pause` stops it before the next send, `resume` lets it
/// continue. The channel closes when the items run out.
pub struct MemoryEventStream {
    rx: mpsc::Receiver<StoreResult<Document>>,
    gate: Arc<PauseGate>,
}

impl MemoryEventStream {
    /// Stream over plain documents.
    pub fn from_documents(docs: Vec<Document>) -> Self {
        Self::from_items(docs.into_iter().map(Ok).collect())
    }

    /// Stream over pre-built items, errors included. Useful for exercising
    /// consumers against mid-stream failures.
    pub fn from_items(items: Vec<StoreResult<Document>>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let gate = Arc::new(PauseGate::default());
        let producer_gate = gate.clone();
        tokio::spawn(async move {
            for item in items {
                producer_gate.ready().await;
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        Self { rx, gate }
    }
}

#[async_trait]
impl EventReader for MemoryEventStream {
    async fn recv(&mut self) -> Option<StoreResult<Document>> {
        self.rx.recv().await
    }

    fn pause(&mut self) {
        self.gate.pause();
    }

    fn resume(&mut self) {
        self.gate.resume();
    }
}
