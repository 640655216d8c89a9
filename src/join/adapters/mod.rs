//! Consumption adapters: transparent interception of the four retrieval
//! patterns.
//!
//! Each adapter owns one raw retrieval primitive and implements the same
//! capability trait, so a consumer that does not know joins are configured
//! sees the undecorated call shape with richer documents. On every delivery
//! the adapter suspends the raw result, runs the orchestration, then hands
//! the augmented result through the original channel.
//!
//! The interception lifecycle is the same for all four variants and is
//! logged at `trace` level: idle, fetching (raw retrieval in flight),
//! joining (orchestration running), delivering, then idle again. Exhaustion
//! of the source (a `None`/empty raw result) is terminal: joins are skipped
//! and the terminal signal passes straight through.
//!
//! When a join chain aborts, the primitive's normal error channel carries an
//! [`AbortedJoin`](crate::error::AbortedJoin) or
//! [`AbortedBatch`](crate::error::AbortedBatch); at the boxed store seams it
//! can be recovered by downcast, partial state and all.

mod batch;
mod lookup;
mod scalar;
mod stream;

pub use batch::JoinedBatchReader;
pub use lookup::JoinedCollection;
pub use scalar::JoinedScalarReader;
pub use stream::{JoinedDocumentStream, JoinedEventReader};

use log::trace;
use std::fmt;

/// Interception lifecycle of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterPhase {
    /// No retrieval in flight
    Idle,
    /// Raw retrieval submitted to the source
    Fetching,
    /// Raw result obtained, orchestration running
    Joining,
    /// Augmented result on its way to the original caller
    Delivering,
    /// Source exhausted; terminal signals pass through unjoined
    Closed,
}

impl fmt::Display for AdapterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterPhase::Idle => "idle",
            AdapterPhase::Fetching => "fetching",
            AdapterPhase::Joining => "joining",
            AdapterPhase::Delivering => "delivering",
            AdapterPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

pub(crate) fn transition(adapter: &str, phase: &mut AdapterPhase, next: AdapterPhase) {
    trace!("{} adapter: {} -> {}", adapter, phase, next);
    *phase = next;
}
