//! Join specifications and their ordered registry.
//!
//! A [`JoinSpec`] names the foreign-key field on the primary document, the
//! field and collection it points into, and where the joined document lands.
//! The registry keeps specifications in registration order and also accepts
//! the builder-style quadruple form (`field` / `to` / `from` / `as_field`
//! pushed separately), normalizing both shapes into the same spec list
//! before orchestration ever runs.

use serde::{Deserialize, Serialize};

use crate::error::JoinError;
use crate::store::ID_FIELD;

/// One join: match `source_field` on the primary document against
/// `target_field` in `target_collection`, storing the match in
/// `result_field`.
///
/// Specs are immutable once registered. Deserializable, so join
/// configuration can live in a config file:
///
/// ```
/// use docjoin::join::JoinSpec;
///
/// let spec: JoinSpec = serde_json::from_str(
///     r#"{"source_field": "owner", "target_field": "_id", "target_collection": "users"}"#,
/// ).unwrap();
/// assert!(spec.coerces_identifier());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Field on the primary document holding the foreign-key value.
    pub source_field: String,
    /// Field on the secondary document that must equal the foreign key.
    pub target_field: String,
    /// Collection the secondary document is fetched from.
    pub target_collection: String,
    /// Field on the primary document that receives the joined document.
    /// Defaults to `source_field`, overwriting the reference value.
    #[serde(default)]
    pub result_field: Option<String>,
    /// Coerce the foreign-key value into the store's canonical identifier
    /// form before querying. Defaults to true exactly when `target_field`
    /// is the reserved primary-key field.
    #[serde(default)]
    pub identifier_lookup: Option<bool>,
}

impl JoinSpec {
    /// Spec with defaulted result field and identifier mode.
    pub fn new(
        source_field: impl Into<String>,
        target_field: impl Into<String>,
        target_collection: impl Into<String>,
    ) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            target_collection: target_collection.into(),
            result_field: None,
            identifier_lookup: None,
        }
    }

    /// Store the joined document under `field` instead of `source_field`.
    pub fn store_as(mut self, field: impl Into<String>) -> Self {
        self.result_field = Some(field.into());
        self
    }

    /// Force identifier-lookup mode on or off.
    pub fn coerce_identifier(mut self, enabled: bool) -> Self {
        self.identifier_lookup = Some(enabled);
        self
    }

    /// Result field after defaulting.
    pub fn resolved_result_field(&self) -> &str {
        self.result_field.as_deref().unwrap_or(&self.source_field)
    }

    /// Identifier-lookup mode after defaulting.
    pub fn coerces_identifier(&self) -> bool {
        self.identifier_lookup
            .unwrap_or(self.target_field == ID_FIELD)
    }

    fn validate(&self) -> Result<(), JoinError> {
        for (name, value) in [
            ("source_field", &self.source_field),
            ("target_field", &self.target_field),
            ("target_collection", &self.target_collection),
        ] {
            if value.is_empty() {
                return Err(JoinError::configuration(format!("{} is required", name)));
            }
        }
        Ok(())
    }

    /// Validate and populate both defaults so the spec is ready for use.
    fn normalize(mut self) -> Result<Self, JoinError> {
        self.validate()?;
        if self.result_field.is_none() {
            self.result_field = Some(self.source_field.clone());
        }
        if self.identifier_lookup.is_none() {
            self.identifier_lookup = Some(self.target_field == ID_FIELD);
        }
        Ok(self)
    }
}

/// Ordered collection of join specifications for one session.
#[derive(Debug, Default)]
pub struct SpecRegistry {
    specs: Vec<JoinSpec>,
    // Builder-style quadruples, zipped behind the structured registrations
    // at resolution time.
    fields: Vec<String>,
    targets: Vec<String>,
    collections: Vec<String>,
    results: Vec<String>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, default, and append a structured specification.
    pub fn register(&mut self, spec: JoinSpec) -> Result<(), JoinError> {
        self.specs.push(spec.normalize()?);
        Ok(())
    }

    /// Read-only view of the structured registrations, in order.
    pub fn list(&self) -> &[JoinSpec] {
        &self.specs
    }

    /// Total registrations held, builder quadruples included (each counted
    /// by its `field` entry, balanced or not).
    pub fn len(&self) -> usize {
        self.specs.len() + self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_field(&mut self, name: impl Into<String>) {
        self.fields.push(name.into());
    }

    pub fn push_target(&mut self, name: impl Into<String>) {
        self.targets.push(name.into());
    }

    pub fn push_collection(&mut self, name: impl Into<String>) {
        self.collections.push(name.into());
    }

    pub fn push_result(&mut self, name: impl Into<String>) {
        self.results.push(name.into());
    }

    /// The full ordered spec list: structured registrations first, then the
    /// builder quadruples. Fails when the quadruple counts mismatch.
    pub fn resolve(&self) -> Result<Vec<JoinSpec>, JoinError> {
        let n = self.fields.len();
        if self.targets.len() != n || self.collections.len() != n || self.results.len() != n {
            return Err(JoinError::configuration(format!(
                "builder-style joins need matched field/to/from/as quadruples \
                 (got {} field, {} to, {} from, {} as)",
                n,
                self.targets.len(),
                self.collections.len(),
                self.results.len()
            )));
        }
        let mut all = self.specs.clone();
        for i in 0..n {
            let spec = JoinSpec::new(
                self.fields[i].clone(),
                self.targets[i].clone(),
                self.collections[i].clone(),
            )
            .store_as(self.results[i].clone());
            all.push(spec.normalize()?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_field_defaults_to_source_field() {
        let mut registry = SpecRegistry::new();
        registry
            .register(JoinSpec::new("sub1", "name", "other"))
            .unwrap();
        let spec = &registry.list()[0];
        assert_eq!(spec.resolved_result_field(), "sub1");
        assert_eq!(spec.result_field.as_deref(), Some("sub1"));
    }

    #[test]
    fn identifier_lookup_defaults_on_primary_key_target() {
        assert!(JoinSpec::new("owner", "_id", "users").coerces_identifier());
        assert!(!JoinSpec::new("owner", "name", "users").coerces_identifier());
        assert!(!JoinSpec::new("owner", "_id", "users")
            .coerce_identifier(false)
            .coerces_identifier());
    }

    #[test]
    fn registration_requires_the_three_mandatory_fields() {
        let mut registry = SpecRegistry::new();
        let err = registry
            .register(JoinSpec::new("", "name", "other"))
            .unwrap_err();
        assert!(matches!(err, JoinError::Configuration { .. }));
        assert!(err.to_string().contains("source_field"));
    }

    #[test]
    fn builder_quadruples_append_after_structured_specs() {
        let mut registry = SpecRegistry::new();
        registry
            .register(JoinSpec::new("first", "name", "a"))
            .unwrap();
        registry.push_field("second");
        registry.push_target("_id");
        registry.push_collection("b");
        registry.push_result("second_doc");
        let specs = registry.resolve().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].source_field, "second");
        assert_eq!(specs[1].resolved_result_field(), "second_doc");
        assert!(specs[1].coerces_identifier());
    }

    #[test]
    fn mismatched_quadruples_fail_at_resolution() {
        let mut registry = SpecRegistry::new();
        registry.push_field("a");
        registry.push_target("name");
        // missing from/as entries
        let err = registry.resolve().unwrap_err();
        assert!(matches!(err, JoinError::Configuration { .. }));
    }
}
