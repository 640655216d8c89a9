//! Join orchestration.
//!
//! - `spec`: join specifications and their ordered registry
//! - `resolver`: one specification against one document
//! - `engine`: sequential orchestration over a document or a batch
//! - `session`: registration API and the four bind operations
//! - `adapters`: transparent interception of the consumption patterns

pub mod adapters;
pub mod engine;
pub mod resolver;
pub mod session;
pub mod spec;

pub use adapters::{
    AdapterPhase, JoinedBatchReader, JoinedCollection, JoinedDocumentStream, JoinedEventReader,
    JoinedScalarReader,
};
pub use engine::JoinEngine;
pub use resolver::JoinResolver;
pub use session::JoinSession;
pub use spec::{JoinSpec, SpecRegistry};
