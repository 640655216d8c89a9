//! Error types for join orchestration.
//!
//! Hard errors (`JoinError`) stop the current document's remaining
//! specifications and the current batch's remaining documents. Soft misses
//! (a primary document lacking the reference field, or a lookup matching
//! nothing) are not errors and never stop orchestration; every contract in
//! this crate distinguishes the two explicitly.

use crate::store::Document;
use thiserror::Error;

/// Boxed error used at the document-store collaborator seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Hard errors raised while registering or resolving joins.
#[derive(Debug, Error)]
pub enum JoinError {
    /// Malformed or incomplete join specification. Raised at registration or
    /// resolution time, never mid-stream.
    #[error("invalid join specification: {message}")]
    Configuration {
        /// Description of what is missing or mismatched
        message: String,
    },

    /// The foreign-key value could not be coerced into the store's canonical
    /// identifier form while identifier-lookup mode was set.
    #[error("cannot use {value} as a document id: {reason}")]
    InvalidIdentifier {
        /// The offending value, rendered for diagnostics
        value: String,
        /// Why coercion failed
        reason: String,
    },

    /// Collection-handle resolution or the equality lookup failed. Opaque
    /// beyond "the secondary lookup failed"; retry policy belongs to the
    /// store or the caller, not here.
    #[error("lookup against collection '{collection}' failed: {source}")]
    Store {
        /// Collection the failed lookup targeted
        collection: String,
        #[source]
        source: BoxError,
    },
}

impl JoinError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an identifier-coercion error.
    pub fn invalid_identifier(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a store error for a lookup against `collection`.
    pub fn store(collection: impl Into<String>, source: BoxError) -> Self {
        Self::Store {
            collection: collection.into(),
            source,
        }
    }
}

/// A per-document join chain stopped by a hard error.
///
/// Carries the working document as of the last successful specification, so
/// callers can observe the partially joined state next to the error. A
/// present error means "stop trusting completeness", not "discard the
/// document". A configuration abort has `applied` 0 with `total` still
/// reporting the session's registrations.
#[derive(Debug, Error)]
#[error("join aborted after {applied} of {total} specification(s): {source}")]
pub struct AbortedJoin {
    /// Working document as of the last successfully applied specification
    pub partial: Document,
    /// How many specifications were applied before the failure
    pub applied: usize,
    /// Total specifications registered for the session
    pub total: usize,
    #[source]
    pub source: JoinError,
}

/// A batch join stopped by a hard error on one of its documents.
///
/// Holds exactly the successfully joined prefix; the failing document and
/// everything after it are dropped from the result. A configuration abort
/// stops the batch before any document is processed: empty prefix, `index`
/// 0.
#[derive(Debug, Error)]
#[error("batch join aborted before document {index} was joined: {source}")]
pub struct AbortedBatch {
    /// The successfully joined prefix, in input order
    pub joined: Vec<Document>,
    /// Zero-based index of the first document the batch did not join
    pub index: usize,
    #[source]
    pub source: JoinError,
}
