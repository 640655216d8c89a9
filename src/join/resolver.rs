//! Resolves one join specification against one working document.

use log::{debug, trace};
use serde_json::Value;
use std::sync::Arc;

use super::spec::JoinSpec;
use crate::error::JoinError;
use crate::store::{Document, DocumentId, DocumentStore, FindOptions, OID_KEY};

/// Performs the single secondary lookup a specification describes and
/// writes the match into the working document.
pub struct JoinResolver {
    store: Arc<dyn DocumentStore>,
}

impl JoinResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Join at most one secondary document into `doc` per `spec`.
    ///
    /// Soft misses leave the document untouched and report no error: a
    /// missing, null, or empty reference value, or a lookup matching no
    /// secondary document. On a lookup miss the result field is left
    /// absent, never set to null, so "field never existed" stays
    /// distinguishable from "explicitly empty".
    ///
    /// Hard errors are identifier-coercion failures and store failures;
    /// both leave `doc` exactly as it was when this call started.
    pub async fn resolve_into(&self, doc: &mut Document, spec: &JoinSpec) -> Result<(), JoinError> {
        let value = match doc.get(&spec.source_field) {
            None | Some(Value::Null) => {
                trace!(
                    "document has no '{}' reference; skipping join into '{}'",
                    spec.source_field,
                    spec.target_collection
                );
                return Ok(());
            }
            Some(Value::String(s)) if s.is_empty() => {
                trace!(
                    "empty '{}' reference; skipping join into '{}'",
                    spec.source_field,
                    spec.target_collection
                );
                return Ok(());
            }
            Some(value) => value.clone(),
        };

        let value = if spec.coerces_identifier() {
            coerce_identifier(&value)?
        } else {
            value
        };

        let collection = self
            .store
            .collection(&spec.target_collection)
            .await
            .map_err(|source| JoinError::store(&spec.target_collection, source))?;

        let mut query = Document::new();
        query.insert(spec.target_field.clone(), value);
        let found = collection
            .find_one(&query, FindOptions::default())
            .await
            .map_err(|source| JoinError::store(&spec.target_collection, source))?;

        match found {
            Some(secondary) => {
                trace!(
                    "joined '{}' from '{}' into '{}'",
                    spec.target_field,
                    spec.target_collection,
                    spec.resolved_result_field()
                );
                doc.insert(
                    spec.resolved_result_field().to_string(),
                    Value::Object(secondary),
                );
            }
            None => {
                debug!(
                    "no document in '{}' where '{}' matches; leaving '{}' untouched",
                    spec.target_collection,
                    spec.target_field,
                    spec.resolved_result_field()
                );
            }
        }
        Ok(())
    }
}

/// Coerce a foreign-key value into the canonical identifier form
/// `{"$oid": "<hex>"}`. Accepts a 24-hex string or an already-canonical
/// object (re-validated); anything else is a hard error.
fn coerce_identifier(value: &Value) -> Result<Value, JoinError> {
    match value {
        Value::String(s) => DocumentId::parse_str(s)
            .map(|id| id.to_value())
            .map_err(|err| JoinError::invalid_identifier(format!("'{}'", s), err.to_string())),
        Value::Object(obj) => match obj.get(OID_KEY).and_then(Value::as_str) {
            Some(hex) => DocumentId::parse_str(hex)
                .map(|id| id.to_value())
                .map_err(|err| {
                    JoinError::invalid_identifier(format!("'{}'", hex), err.to_string())
                }),
            None => Err(JoinError::invalid_identifier(
                value.to_string(),
                "expected a hex string or an object with an \"$oid\" key",
            )),
        },
        other => Err(JoinError::invalid_identifier(
            other.to_string(),
            "expected a hex string or an object with an \"$oid\" key",
        )),
    }
}
