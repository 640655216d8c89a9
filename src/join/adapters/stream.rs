//! Push-based stream interception.
//!
//! The ordering guarantee here is the hard one: the raw source pushes
//! eagerly, but join resolution for document *n* must complete before
//! document *n+1* reaches the consumer. The adapter pauses the source the
//! moment a raw document arrives, joins it, delivers, and only then
//! resumes. The pause is scoped to this one adapter instance; unrelated
//! sessions are never serialized against each other.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use super::{transition, AdapterPhase};
use crate::error::BoxError;
use crate::join::engine::JoinEngine;
use crate::store::{Document, EventReader, StoreResult};

/// Wraps an [`EventReader`] so every pushed document is joined, in push
/// order, before the consumer sees it.
///
/// Raw errors pass through and the stream continues; a join abort is
/// delivered as that document's error item, also without ending the stream.
pub struct JoinedEventReader<S> {
    inner: S,
    engine: JoinEngine,
    phase: AdapterPhase,
}

impl<S: EventReader> JoinedEventReader<S> {
    pub(crate) fn new(engine: JoinEngine, inner: S) -> Self {
        Self {
            inner,
            engine,
            phase: AdapterPhase::Idle,
        }
    }

    /// Unwrap back to the raw source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: EventReader> EventReader for JoinedEventReader<S> {
    async fn recv(&mut self) -> Option<StoreResult<Document>> {
        transition("stream", &mut self.phase, AdapterPhase::Fetching);
        let doc = match self.inner.recv().await {
            None => {
                transition("stream", &mut self.phase, AdapterPhase::Closed);
                return None;
            }
            Some(Err(err)) => {
                transition("stream", &mut self.phase, AdapterPhase::Idle);
                return Some(Err(err));
            }
            Some(Ok(doc)) => doc,
        };
        // Hold the source back while this document joins, so an eager
        // producer cannot run ahead of delivery order.
        self.inner.pause();
        transition("stream", &mut self.phase, AdapterPhase::Joining);
        let joined = self.engine.join_one(doc).await;
        transition("stream", &mut self.phase, AdapterPhase::Delivering);
        self.inner.resume();
        transition("stream", &mut self.phase, AdapterPhase::Idle);
        Some(match joined {
            Ok(doc) => Ok(doc),
            Err(aborted) => Err(Box::new(aborted) as BoxError),
        })
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn resume(&mut self) {
        self.inner.resume();
    }
}

impl<S: EventReader + 'static> JoinedEventReader<S> {
    /// Relay the joined stream through a channel as a [`futures::Stream`].
    ///
    /// A spawned task drives the source: each document is joined and sent
    /// into the channel before the source is resumed, so consumers observe
    /// source order even when they poll across await points. Dropping the
    /// returned stream stops the task.
    pub fn into_stream(self) -> JoinedDocumentStream {
        let mut inner = self.inner;
        let engine = self.engine;
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            while let Some(item) = inner.recv().await {
                match item {
                    Ok(doc) => {
                        inner.pause();
                        let joined = engine
                            .join_one(doc)
                            .await
                            .map_err(|aborted| Box::new(aborted) as BoxError);
                        let delivered = tx.send(joined).await.is_ok();
                        inner.resume();
                        if !delivered {
                            break;
                        }
                    }
                    Err(err) => {
                        if tx.send(Err(err)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        JoinedDocumentStream { receiver: rx }
    }
}

/// Channel-backed stream of joined documents.
pub struct JoinedDocumentStream {
    receiver: mpsc::Receiver<StoreResult<Document>>,
}

impl Stream for JoinedDocumentStream {
    type Item = StoreResult<Document>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
