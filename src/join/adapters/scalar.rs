//! Scalar get-next interception.

use async_trait::async_trait;

use super::{transition, AdapterPhase};
use crate::error::BoxError;
use crate::join::engine::JoinEngine;
use crate::store::{Document, FetchOptions, ScalarReader, StoreResult};

/// Wraps a [`ScalarReader`] so every fetched document is joined before the
/// caller sees it.
///
/// Both call shapes are intercepted: the option-elided `next_document` and
/// the explicit `next_document_with`. Each routes to the inner reader's own
/// entry point of the same shape, so a reader that distinguishes the two
/// keeps its contract and its internal cursor state keeps advancing exactly
/// as it would undecorated.
pub struct JoinedScalarReader<R> {
    inner: R,
    engine: JoinEngine,
    phase: AdapterPhase,
}

impl<R: ScalarReader> JoinedScalarReader<R> {
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

    async fn deliver(&mut self, raw: StoreResult<Option<Document>>) -> StoreResult<Option<Document>> {
        let doc = match raw {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                transition("scalar", &mut self.phase, AdapterPhase::Closed);
                return Ok(None);
            }
            Err(err) => {
                transition("scalar", &mut self.phase, AdapterPhase::Idle);
                return Err(err);
            }
        };
        transition("scalar", &mut self.phase, AdapterPhase::Joining);
        let joined = self.engine.join_one(doc).await;
        transition("scalar", &mut self.phase, AdapterPhase::Delivering);
        let result = match joined {
            Ok(doc) => Ok(Some(doc)),
            Err(aborted) => Err(Box::new(aborted) as BoxError),
        };
        transition("scalar", &mut self.phase, AdapterPhase::Idle);
        result
    }
}

#[async_trait]
impl<R: ScalarReader> ScalarReader for JoinedScalarReader<R> {
    async fn next_document_with(
        &mut self,
        options: FetchOptions,
    ) -> StoreResult<Option<Document>> {
        transition("scalar", &mut self.phase, AdapterPhase::Fetching);
        let raw = self.inner.next_document_with(options).await;
        self.deliver(raw).await
    }

    async fn next_document(&mut self) -> StoreResult<Option<Document>> {
        transition("scalar", &mut self.phase, AdapterPhase::Fetching);
        let raw = self.inner.next_document().await;
        self.deliver(raw).await
    }
}
