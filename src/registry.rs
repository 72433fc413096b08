//! Named schema storage and reference resolution.
//!
//! This module provides the [`SchemaRegistry`] type that stores the named
//! definitions of a document (`definitions` in Swagger 2.0,
//! `components.schemas` in OpenAPI 3) so that reference nodes and
//! discriminators can find them.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::schema::{definition_name, Schema, SchemaKind};

/// Type alias for the schema storage map.
type SchemaMap = Arc<RwLock<HashMap<String, Arc<Schema>>>>;

/// A thread-safe registry of named schema definitions.
///
/// # Thread Safety
///
/// The registry uses `Arc<RwLock<...>>` for thread-safe access:
/// - Multiple threads can resolve references concurrently (read-only access)
/// - Registration operations are serialized (write access)
///
/// Clones share the same storage.
///
/// # Example
///
/// ```rust
/// use enforcer::{Schema, SchemaBuilder, SchemaRegistry};
///
/// let registry = SchemaRegistry::new();
///
/// registry.register("Email", Schema::string().format("email")).unwrap();
/// registry.register("User", Schema::object()
///     .field("email", Schema::reference("Email"))
///     .optional("manager", Schema::reference("User"))
/// ).unwrap();
///
/// assert!(registry.validate_refs().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    schemas: SchemaMap,
}

impl SchemaRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under `name` and returns the shared node.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateName` if the name is already registered.
    ///
    /// # Example
    ///
    /// ```rust
    /// use enforcer::{Schema, SchemaRegistry};
    ///
    /// let registry = SchemaRegistry::new();
    /// registry.register("Email", Schema::string()).unwrap();
    ///
    /// // Duplicate registration fails
    /// assert!(registry.register("Email", Schema::string()).is_err());
    /// ```
    pub fn register(
        &self,
        name: impl Into<String>,
        schema: impl Into<Arc<Schema>>,
    ) -> Result<Arc<Schema>, RegistryError> {
        let name = name.into();
        let mut schemas = self.schemas.write();

        if schemas.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        let schema = schema.into();
        schemas.insert(name, Arc::clone(&schema));
        Ok(schema)
    }

    /// Retrieves a schema by name.
    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.read().get(name).cloned()
    }

    /// Retrieves a schema by name, as an error when it is missing.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SchemaNotFound` if no schema has that name.
    pub fn require(&self, name: &str) -> Result<Arc<Schema>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::SchemaNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.read().contains_key(name)
    }

    /// The registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    /// Returns every referenced name that is not registered.
    ///
    /// Covers reference nodes and discriminator mapping targets. This should
    /// be called after all schemas are registered to ensure reference
    /// integrity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use enforcer::{Schema, SchemaBuilder, SchemaRegistry};
    ///
    /// let registry = SchemaRegistry::new();
    /// registry.register("User", Schema::object()
    ///     .field("id", Schema::reference("UserId"))  // UserId not registered!
    /// ).unwrap();
    ///
    /// assert_eq!(registry.validate_refs(), vec!["UserId"]);
    /// ```
    pub fn validate_refs(&self) -> Vec<String> {
        let schemas = self.schemas.read();
        let mut all_refs = Vec::new();

        for schema in schemas.values() {
            collect_all_refs(schema, &mut all_refs);
        }

        let mut unresolved: Vec<String> = all_refs
            .into_iter()
            .filter(|name| !schemas.contains_key(definition_name(name)))
            .collect();

        unresolved.sort();
        unresolved.dedup();
        unresolved
    }
}

/// Reference names plus discriminator mapping targets reachable from
/// `schema` without following references.
fn collect_all_refs(schema: &Schema, refs: &mut Vec<String>) {
    schema.collect_refs(refs);
    visit_discriminators(schema, refs);
}

fn visit_discriminators(schema: &Schema, refs: &mut Vec<String>) {
    if let Some(discriminator) = schema.discriminator() {
        refs.extend(discriminator.mappings().map(|(_, target)| target.to_string()));
    }
    match schema.kind() {
        SchemaKind::Array(rules) => {
            if let Some(items) = rules.items() {
                visit_discriminators(items, refs);
            }
        }
        SchemaKind::Object(rules) => {
            for property in rules.properties().values() {
                visit_discriminators(property, refs);
            }
        }
        SchemaKind::AllOf(schemas) => {
            for branch in schemas {
                visit_discriminators(branch, refs);
            }
        }
        SchemaKind::AnyOf(composition) | SchemaKind::OneOf(composition) => {
            for branch in composition.schemas() {
                visit_discriminators(branch, refs);
            }
        }
        SchemaKind::Not(inner) => visit_discriminators(inner, refs),
        _ => {}
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Discriminator, SchemaBuilder};

    #[test]
    fn test_register_and_get() {
        let registry = SchemaRegistry::new();
        let stored = registry.register("Name", Schema::string()).unwrap();

        let fetched = registry.get("Name").unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
        assert!(registry.contains("Name"));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("Other").is_none());
    }

    #[test]
    fn test_duplicate_and_missing_names() {
        let registry = SchemaRegistry::new();
        registry.register("A", Schema::boolean()).unwrap();

        assert_eq!(
            registry.register("A", Schema::boolean()).unwrap_err(),
            RegistryError::DuplicateName("A".to_string())
        );
        assert_eq!(
            registry.require("B").unwrap_err(),
            RegistryError::SchemaNotFound("B".to_string())
        );
    }

    #[test]
    fn test_clones_share_storage() {
        let registry = SchemaRegistry::new();
        let clone = registry.clone();
        clone.register("Late", Schema::any()).unwrap();
        assert!(registry.contains("Late"));
    }

    #[test]
    fn test_validate_refs_covers_discriminator_mapping() {
        let registry = SchemaRegistry::new();
        registry
            .register(
                "Pet",
                Schema::object()
                    .field("petType", Schema::string())
                    .discriminator(
                        Discriminator::new("petType")
                            .mapping("dog", "#/components/schemas/Dog")
                            .mapping("cat", "Cat"),
                    ),
            )
            .unwrap();
        registry.register("Cat", Schema::object()).unwrap();

        assert_eq!(registry.validate_refs(), vec!["#/components/schemas/Dog"]);
    }
}
