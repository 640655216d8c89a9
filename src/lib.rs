//! Client-side joins for schemaless document stores.
//!
//! Stores in this family do not join across collections. This crate fills
//! the gap on the client: register specifications describing how a field on
//! a primary document references a document in another collection, then
//! consume a source the way you already do — bulk array, scalar get-next,
//! push-based stream, or a single find-one — and every document comes back
//! with the referenced documents attached.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use docjoin::{JoinSession, JoinSpec};
//! use docjoin::store::{document, MemoryStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.insert("parts", document([("key", json!("x")), ("v", json!(1))]));
//!
//! let mut session = JoinSession::new(Arc::new(store));
//! session.on(JoinSpec::new("ref", "key", "parts"))?;
//!
//! let joined = session
//!     .join_one(document([("name", json!("p1")), ("ref", json!("x"))]))
//!     .await?;
//! assert_eq!(joined["ref"]["v"], json!(1));
//! # Ok(())
//! # }
//! ```
//!
//! Documents whose reference field is missing, and references that match
//! nothing, are soft misses: the document passes through unchanged and no
//! error is raised. Hard errors (identifier coercion, store failures) abort
//! the rest of the document's joins and carry the partially joined state in
//! the error.

pub mod error;
pub mod join;
pub mod store;

pub use error::{AbortedBatch, AbortedJoin, BoxError, JoinError};
pub use join::{JoinSession, JoinSpec};
pub use store::{Document, DocumentId, DocumentStore};
