//! Capability traits the join engine requires from a document store.
//!
//! The four retrieval primitives (scalar get-next, bulk materialize,
//! find-one, push-based events) are separate traits so each consumption
//! adapter can decorate exactly one of them while exposing the same shape.
//! Implementations must tolerate being owned and wrapped without breaking
//! their internal iteration state.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::Document;
use crate::error::BoxError;

/// Result type at the store seams. Store failures are opaque to the join
/// engine beyond "the lookup failed".
pub type StoreResult<T> = Result<T, BoxError>;

/// An opened document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Resolve a collection handle by name.
    ///
    /// The engine requests a handle per lookup and assumes nothing about
    /// caching; if handles are cacheable, that is the store's business.
    async fn collection(&self, name: &str) -> StoreResult<Arc<dyn CollectionHandle>>;
}

/// Options for a find-one lookup.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Field names to include in the returned document; `None` returns the
    /// whole document. The primary-key field is always included.
    pub projection: Option<Vec<String>>,
}

/// Options for advancing a scalar cursor.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Give up waiting for the next document after this long. `None` waits
    /// indefinitely. Snapshot-backed cursors may ignore it.
    pub timeout: Option<Duration>,
}

/// A handle to one collection, supporting equality-style single-document
/// lookups.
#[async_trait]
pub trait CollectionHandle: Send + Sync {
    /// Find at most one document where every field in `query` is equal to
    /// the queried value. Absent is not an error.
    async fn find_one(
        &self,
        query: &Document,
        options: FindOptions,
    ) -> StoreResult<Option<Document>>;

    /// Collection name, for diagnostics.
    fn name(&self) -> &str;
}

// Lets a handle fresh out of `DocumentStore::collection` be wrapped or
// shared without unwrapping the Arc.
#[async_trait]
impl<T: CollectionHandle + ?Sized> CollectionHandle for Arc<T> {
    async fn find_one(
        &self,
        query: &Document,
        options: FindOptions,
    ) -> StoreResult<Option<Document>> {
        (**self).find_one(query, options).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Scalar retrieval primitive: fetch the next document from a cursor.
#[async_trait]
pub trait ScalarReader: Send {
    /// Fetch the next document with explicit options. `None` when the cursor
    /// is exhausted.
    async fn next_document_with(
        &mut self,
        options: FetchOptions,
    ) -> StoreResult<Option<Document>>;

    /// Option-elided fetch. Must behave exactly like
    /// `next_document_with(FetchOptions::default())`.
    async fn next_document(&mut self) -> StoreResult<Option<Document>> {
        self.next_document_with(FetchOptions::default()).await
    }
}

/// Bulk retrieval primitive: materialize every remaining document at once.
#[async_trait]
pub trait BatchReader: Send {
    /// Drain the remaining documents into a vector, in cursor order. Empty
    /// when already exhausted.
    async fn read_all(&mut self) -> StoreResult<Vec<Document>>;
}

/// Push-based retrieval primitive with flow control.
///
/// The source produces documents eagerly on its own schedule; `pause` must
/// stop production (buffered items stay buffered) until `resume`.
#[async_trait]
pub trait EventReader: Send {
    /// Wait for the next pushed document. `None` once the source has closed.
    async fn recv(&mut self) -> Option<StoreResult<Document>>;

    /// Suspend production.
    fn pause(&mut self);

    /// Resume production after a pause.
    fn resume(&mut self);
}
