//! Object schemas.
//!
//! This module provides [`ObjectSchema`] for `type: object` nodes with
//! declared properties, required names, additional property handling,
//! property count bounds and an optional inheritance-style discriminator.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::Exception;

use super::{Discriminator, Schema, SchemaBase, SchemaBuilder, SchemaKind};

/// How to handle properties not declared in the schema.
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    /// Accept unknown properties unchanged (the default).
    #[default]
    Allow,
    /// Reject unknown properties.
    Deny,
    /// Process unknown properties against a schema.
    Validate(Arc<Schema>),
}

/// A value that can be turned into an [`AdditionalProperties`] setting:
/// `true`, `false`, or a schema.
#[derive(Debug, Clone)]
pub struct AdditionalPropertiesSetting(AdditionalProperties);

impl From<bool> for AdditionalPropertiesSetting {
    fn from(allow: bool) -> Self {
        if allow {
            AdditionalPropertiesSetting(AdditionalProperties::Allow)
        } else {
            AdditionalPropertiesSetting(AdditionalProperties::Deny)
        }
    }
}

impl From<Schema> for AdditionalPropertiesSetting {
    fn from(schema: Schema) -> Self {
        AdditionalPropertiesSetting(AdditionalProperties::Validate(Arc::new(schema)))
    }
}

impl From<Arc<Schema>> for AdditionalPropertiesSetting {
    fn from(schema: Arc<Schema>) -> Self {
        AdditionalPropertiesSetting(AdditionalProperties::Validate(schema))
    }
}

/// The properties and constraints of an object node.
#[derive(Debug, Clone, Default)]
pub struct ObjectRules {
    properties: IndexMap<String, Arc<Schema>>,
    required: IndexSet<String>,
    additional: AdditionalProperties,
    min_properties: Option<usize>,
    max_properties: Option<usize>,
    discriminator: Option<Discriminator>,
}

impl ObjectRules {
    pub fn properties(&self) -> &IndexMap<String, Arc<Schema>> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Arc<Schema>> {
        self.properties.get(name)
    }

    pub fn required(&self) -> &IndexSet<String> {
        &self.required
    }

    pub fn additional_properties(&self) -> &AdditionalProperties {
        &self.additional
    }

    pub fn min_properties(&self) -> Option<usize> {
        self.min_properties
    }

    pub fn max_properties(&self) -> Option<usize> {
        self.max_properties
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub(crate) fn collect_refs(&self, refs: &mut Vec<String>) {
        for schema in self.properties.values() {
            schema.collect_refs(refs);
        }
        if let AdditionalProperties::Validate(schema) = &self.additional {
            schema.collect_refs(refs);
        }
    }

    /// Checks `required` and the property count bounds against the keys
    /// present in a value.
    pub(crate) fn check<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a String>,
        exception: &mut Exception,
    ) {
        let present: IndexSet<&str> = keys.into_iter().map(String::as_str).collect();

        let missing: Vec<&str> = self
            .required
            .iter()
            .map(String::as_str)
            .filter(|name| !present.contains(name))
            .collect();
        if !missing.is_empty() {
            exception.push(format!(
                "Missing required properties: {}",
                missing.join(", ")
            ));
        }

        if let Some(min) = self.min_properties {
            if present.len() < min {
                exception.push(format!(
                    "Too few properties. Expected at least {}. Received {}",
                    min,
                    present.len()
                ));
            }
        }
        if let Some(max) = self.max_properties {
            if present.len() > max {
                exception.push(format!(
                    "Too many properties. Expected at most {}. Received {}",
                    max,
                    present.len()
                ));
            }
        }
    }
}

/// Builder for `type: object` nodes.
///
/// # Example
///
/// ```rust
/// use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
/// use serde_json::json;
///
/// let schema = Schema::object()
///     .field("id", Schema::integer())
///     .optional("name", Schema::string())
///     .additional_properties(false)
///     .build();
/// let enforcer = Enforcer::new(Version::V3);
///
/// assert!(enforcer.validate(&schema, &Value::from(json!({"id": 1}))).is_none());
///
/// let exception = enforcer
///     .validate(&schema, &Value::from(json!({"name": "x", "extra": true})))
///     .unwrap();
/// assert_eq!(exception.count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    base: SchemaBase,
    rules: ObjectRules,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a property without requiring it.
    pub fn property(mut self, name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        self.rules.properties.insert(name.into(), schema.into());
        self
    }

    /// Declares a required property.
    pub fn field(self, name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        let name = name.into();
        self.property(name.clone(), schema).required([name])
    }

    /// Declares an optional property.
    pub fn optional(self, name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        self.property(name, schema)
    }

    /// Adds names to the `required` set. Names need not be declared
    /// properties.
    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets `additionalProperties` to `true`, `false` or a schema.
    pub fn additional_properties(mut self, setting: impl Into<AdditionalPropertiesSetting>) -> Self {
        self.rules.additional = setting.into().0;
        self
    }

    pub fn min_properties(mut self, min: usize) -> Self {
        self.rules.min_properties = Some(min);
        self
    }

    pub fn max_properties(mut self, max: usize) -> Self {
        self.rules.max_properties = Some(max);
        self
    }

    /// Declares a discriminator on this base object. Schemas composing it
    /// through `allOf` are selected by the discriminator value.
    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.rules.discriminator = Some(discriminator);
        self
    }
}

impl SchemaBuilder for ObjectSchema {
    fn base_mut(&mut self) -> &mut SchemaBase {
        &mut self.base
    }

    fn build(self) -> Schema {
        Schema::from_parts(SchemaKind::Object(self.rules), self.base)
    }
}
