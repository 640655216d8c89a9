//! Join sessions: specification registration plus the four bind operations.

use std::sync::Arc;

use super::adapters::{
    JoinedBatchReader, JoinedCollection, JoinedEventReader, JoinedScalarReader,
};
use super::engine::JoinEngine;
use super::spec::{JoinSpec, SpecRegistry};
use crate::error::{AbortedBatch, AbortedJoin, JoinError};
use crate::store::{
    BatchReader, CollectionHandle, Document, DocumentStore, EventReader, ScalarReader,
};

/// One join session: an ordered specification list bound to a store.
///
/// Create one session per source, register the joins, then either call the
/// orchestration entry points directly or bind an adapter around the
/// source's retrieval primitive. Registering more specifications after a
/// bound source has started producing is unsupported; bound adapters
/// snapshot the spec list at bind time.
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use docjoin::join::{JoinSession, JoinSpec};
/// use docjoin::store::{document, Document, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let store = MemoryStore::new();
/// store.insert("C", document([("key", json!("x")), ("v", json!(1))]));
/// store.insert("primaries", document([("name", json!("p1")), ("ref", json!("x"))]));
///
/// let mut session = JoinSession::new(Arc::new(store.clone()));
/// session.on(JoinSpec::new("ref", "key", "C"))?;
///
/// let cursor = store.find("primaries", &Document::new());
/// let mut reader = session.bind_batch(cursor)?;
/// use docjoin::store::BatchReader;
/// let docs = reader.read_all().await?;
/// assert!(docs[0]["ref"].is_object());
/// # Ok(())
/// # }
/// ```
pub struct JoinSession {
    store: Arc<dyn DocumentStore>,
    registry: SpecRegistry,
}

impl JoinSession {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            registry: SpecRegistry::new(),
        }
    }

    /// Register a structured specification. Chainable; fails immediately on
    /// a malformed spec.
    pub fn on(&mut self, spec: JoinSpec) -> Result<&mut Self, JoinError> {
        self.registry.register(spec)?;
        Ok(self)
    }

    /// Builder-style registration: the primary document's reference field.
    /// Must be matched by one `to`, `from`, and `as_field` call each.
    pub fn field(&mut self, name: impl Into<String>) -> &mut Self {
        self.registry.push_field(name);
        self
    }

    /// Builder-style registration: the secondary document's key field.
    pub fn to(&mut self, name: impl Into<String>) -> &mut Self {
        self.registry.push_target(name);
        self
    }

    /// Builder-style registration: the secondary collection.
    pub fn from(&mut self, collection: impl Into<String>) -> &mut Self {
        self.registry.push_collection(collection);
        self
    }

    /// Builder-style registration: where the joined document lands.
    pub fn as_field(&mut self, name: impl Into<String>) -> &mut Self {
        self.registry.push_result(name);
        self
    }

    /// The full ordered specification list (structured registrations first,
    /// then builder quadruples). Fails when builder calls are unbalanced.
    pub fn joins(&self) -> Result<Vec<JoinSpec>, JoinError> {
        self.registry.resolve()
    }

    /// Read-only view of the structured registrations only.
    pub fn registered(&self) -> &[JoinSpec] {
        self.registry.list()
    }

    /// Join one owned working document through every specification.
    ///
    /// A configuration problem (unbalanced builder calls) surfaces here as
    /// an abort with zero specifications applied; `total` still reports how
    /// many registrations the session holds.
    pub async fn join_one(&self, doc: Document) -> Result<Document, AbortedJoin> {
        match self.engine() {
            Ok(engine) => engine.join_one(doc).await,
            Err(source) => Err(AbortedJoin {
                partial: doc,
                applied: 0,
                total: self.registry.len(),
                source,
            }),
        }
    }

    /// Join a batch of documents in input order, fail-fast.
    ///
    /// A configuration problem aborts before any document is touched: the
    /// error carries an empty prefix and `index` 0, meaning the batch
    /// stopped before its first document, not that document 0 failed.
    pub async fn join_many(&self, docs: Vec<Document>) -> Result<Vec<Document>, AbortedBatch> {
        match self.engine() {
            Ok(engine) => engine.join_many(docs).await,
            Err(source) => Err(AbortedBatch {
                joined: Vec::new(),
                index: 0,
                source,
            }),
        }
    }

    /// Wrap a scalar get-next primitive. The returned reader has the same
    /// call shape as `reader`; documents come back joined.
    pub fn bind_scalar<R: ScalarReader>(
        &self,
        reader: R,
    ) -> Result<JoinedScalarReader<R>, JoinError> {
        Ok(JoinedScalarReader::new(self.engine()?, reader))
    }

    /// Wrap a bulk materialize primitive.
    pub fn bind_batch<R: BatchReader>(
        &self,
        reader: R,
    ) -> Result<JoinedBatchReader<R>, JoinError> {
        Ok(JoinedBatchReader::new(self.engine()?, reader))
    }

    /// Wrap a collection handle's find-one primitive.
    pub fn bind_collection<C: CollectionHandle>(
        &self,
        handle: C,
    ) -> Result<JoinedCollection<C>, JoinError> {
        Ok(JoinedCollection::new(self.engine()?, handle))
    }

    /// Wrap a push-based event source. Delivery order matches source order;
    /// the source is paused while each document joins.
    pub fn bind_stream<S: EventReader>(
        &self,
        source: S,
    ) -> Result<JoinedEventReader<S>, JoinError> {
        Ok(JoinedEventReader::new(self.engine()?, source))
    }

    fn engine(&self) -> Result<JoinEngine, JoinError> {
        Ok(JoinEngine::new(self.store.clone(), self.registry.resolve()?))
    }
}
