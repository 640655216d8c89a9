//! Sequential join orchestration over one document or a batch.
//!
//! Specifications apply strictly in registration order, never concurrently:
//! later specifications may read fields written by earlier ones, and the
//! fail-fast contract needs a deterministic stopping point. The first hard
//! error stops the current document's remaining specifications and, in the
//! batch case, the remaining documents — callers still get the partially
//! joined prefix through the error.

use log::warn;
use std::sync::Arc;

use super::resolver::JoinResolver;
use super::spec::JoinSpec;
use crate::error::{AbortedBatch, AbortedJoin};
use crate::store::{Document, DocumentStore};

/// One resolved spec list bound to a store. Owned by each adapter so the
/// specs cannot change underneath a source mid-consumption.
pub struct JoinEngine {
    resolver: JoinResolver,
    specs: Vec<JoinSpec>,
}

impl JoinEngine {
    pub(crate) fn new(store: Arc<dyn DocumentStore>, specs: Vec<JoinSpec>) -> Self {
        Self {
            resolver: JoinResolver::new(store),
            specs,
        }
    }

    /// The specs this engine applies, in order.
    pub fn specs(&self) -> &[JoinSpec] {
        &self.specs
    }

    /// Apply every specification in order to one working document.
    ///
    /// The document is owned by this call; soft misses leave it untouched
    /// and continue. The first hard error returns [`AbortedJoin`] holding
    /// the document as of the last successful step — later specifications
    /// are not applied.
    pub async fn join_one(&self, mut doc: Document) -> Result<Document, AbortedJoin> {
        for (applied, spec) in self.specs.iter().enumerate() {
            if let Err(source) = self.resolver.resolve_into(&mut doc, spec).await {
                warn!(
                    "join into '{}' failed after {} of {} specification(s): {}",
                    spec.target_collection,
                    applied,
                    self.specs.len(),
                    source
                );
                return Err(AbortedJoin {
                    partial: doc,
                    applied,
                    total: self.specs.len(),
                    source,
                });
            }
        }
        Ok(doc)
    }

    /// Apply [`join_one`](Self::join_one) to each document in input order.
    ///
    /// The first per-document hard error stops the batch: [`AbortedBatch`]
    /// holds exactly the successfully joined prefix, and the failing
    /// document and everything after it are dropped. An empty input yields
    /// an empty output without touching the store.
    pub async fn join_many(&self, docs: Vec<Document>) -> Result<Vec<Document>, AbortedBatch> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let mut joined = Vec::with_capacity(docs.len());
        for (index, doc) in docs.into_iter().enumerate() {
            match self.join_one(doc).await {
                Ok(doc) => joined.push(doc),
                Err(aborted) => {
                    return Err(AbortedBatch {
                        joined,
                        index,
                        source: aborted.source,
                    });
                }
            }
        }
        Ok(joined)
    }
}
