//! Single-document find-one interception.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{transition, AdapterPhase};
use crate::error::BoxError;
use crate::join::engine::JoinEngine;
use crate::store::{CollectionHandle, Document, FindOptions, StoreResult};

/// Wraps a [`CollectionHandle`] so a found document is joined before
/// delivery. An absent result is passed through unchanged.
pub struct JoinedCollection<C> {
    inner: C,
    engine: JoinEngine,
    // find_one takes &self, so the phase needs interior mutability
    phase: Mutex<AdapterPhase>,
}

impl<C: CollectionHandle> JoinedCollection<C> {
    pub(crate) fn new(engine: JoinEngine, inner: C) -> Self {
        Self {
            inner,
            engine,
            phase: Mutex::new(AdapterPhase::Idle),
        }
    }

    /// Unwrap back to the raw handle.
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn set_phase(&self, next: AdapterPhase) {
        let mut phase = self.phase.lock().unwrap();
        transition("lookup", &mut phase, next);
    }
}

#[async_trait]
impl<C: CollectionHandle> CollectionHandle for JoinedCollection<C> {
    async fn find_one(
        &self,
        query: &Document,
        options: FindOptions,
    ) -> StoreResult<Option<Document>> {
        self.set_phase(AdapterPhase::Fetching);
        let raw = match self.inner.find_one(query, options).await {
            Ok(raw) => raw,
            Err(err) => {
                self.set_phase(AdapterPhase::Idle);
                return Err(err);
            }
        };
        let Some(doc) = raw else {
            self.set_phase(AdapterPhase::Closed);
            return Ok(None);
        };
        self.set_phase(AdapterPhase::Joining);
        let joined = self.engine.join_one(doc).await;
        self.set_phase(AdapterPhase::Delivering);
        let result = match joined {
            Ok(doc) => Ok(Some(doc)),
            Err(aborted) => Err(Box::new(aborted) as BoxError),
        };
        self.set_phase(AdapterPhase::Idle);
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
