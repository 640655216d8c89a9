//! Bulk materialize interception.

use async_trait::async_trait;

use super::{transition, AdapterPhase};
use crate::error::BoxError;
use crate::join::engine::JoinEngine;
use crate::store::{BatchReader, Document, StoreResult};

/// Wraps a [`BatchReader`] so the materialized batch is joined, in input
/// order, before delivery. An empty raw batch is the terminal signal and
/// passes through untouched.
pub struct JoinedBatchReader<R> {
    inner: R,
    engine: JoinEngine,
    phase: AdapterPhase,
}

impl<R: BatchReader> JoinedBatchReader<R> {
    pub(crate) fn new(engine: JoinEngine, inner: R) -> Self {
        Self {
            inner,
            engine,
            phase: AdapterPhase::Idle,
        }
    }

    /// Unwrap back to the raw reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[async_trait]
impl<R: BatchReader> BatchReader for JoinedBatchReader<R> {
    async fn read_all(&mut self) -> StoreResult<Vec<Document>> {
        transition("batch", &mut self.phase, AdapterPhase::Fetching);
        let raw = match self.inner.read_all().await {
            Ok(docs) => docs,
            Err(err) => {
                transition("batch", &mut self.phase, AdapterPhase::Idle);
                return Err(err);
            }
        };
        if raw.is_empty() {
            transition("batch", &mut self.phase, AdapterPhase::Closed);
            return Ok(raw);
        }
        transition("batch", &mut self.phase, AdapterPhase::Joining);
        let joined = self.engine.join_many(raw).await;
        transition("batch", &mut self.phase, AdapterPhase::Delivering);
        let result = match joined {
            Ok(docs) => Ok(docs),
            Err(aborted) => Err(Box::new(aborted) as BoxError),
        };
        transition("batch", &mut self.phase, AdapterPhase::Idle);
        result
    }
}
