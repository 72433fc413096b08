//! Composition schemas: `allOf`, `anyOf`, `oneOf` and `not`.
//!
//! Composition nodes hold their branches as shared schemas. `anyOf` and
//! `oneOf` may carry a [`Discriminator`] that selects exactly one branch from
//! a property of the value instead of trying every branch.

use std::sync::Arc;

use indexmap::IndexMap;

use super::{Schema, SchemaBase, SchemaBuilder, SchemaKind};

/// Selects a concrete schema for a polymorphic value.
///
/// `mapping` maps discriminator values to definition names. Targets may be
/// plain names or JSON pointers such as `#/components/schemas/Dog`; only the
/// last pointer segment is used. Values missing from the mapping fall back
/// to the definition of the same name.
///
/// # Example
///
/// ```rust
/// use enforcer::Discriminator;
///
/// let discriminator = Discriminator::new("petType")
///     .mapping("dog", "#/components/schemas/Dog")
///     .mapping("cat", "Cat");
///
/// assert_eq!(discriminator.property_name(), "petType");
/// assert_eq!(discriminator.target("dog"), Some("Dog"));
/// assert_eq!(discriminator.target("Cat"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    property_name: String,
    mapping: IndexMap<String, String>,
}

impl Discriminator {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            mapping: IndexMap::new(),
        }
    }

    /// Maps a discriminator value to a definition name or pointer.
    pub fn mapping(mut self, value: impl Into<String>, target: impl Into<String>) -> Self {
        self.mapping.insert(value.into(), target.into());
        self
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// The raw mapping entries.
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapping.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The definition name an explicit mapping entry points at.
    pub fn target(&self, value: &str) -> Option<&str> {
        self.mapping
            .get(value)
            .map(|target| super::definition_name(target))
    }
}

/// The branches of an `anyOf` or `oneOf` node.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    schemas: Vec<Arc<Schema>>,
    discriminator: Option<Discriminator>,
}

impl Composition {
    pub fn schemas(&self) -> &[Arc<Schema>] {
        &self.schemas
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub(crate) fn collect_refs(&self, refs: &mut Vec<String>) {
        for schema in &self.schemas {
            schema.collect_refs(refs);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    AllOf,
    AnyOf,
    OneOf,
}

/// Builder for `allOf`, `anyOf` and `oneOf` nodes.
///
/// # Example
///
/// ```rust
/// use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
///
/// let schema = Schema::one_of([Schema::integer().shared(), Schema::string().shared()]).build();
/// let enforcer = Enforcer::new(Version::V3);
///
/// assert!(enforcer.validate(&schema, &Value::from("hello")).is_none());
/// assert!(enforcer.validate(&schema, &Value::Bool(true)).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct CompositionSchema {
    base: SchemaBase,
    combinator: Combinator,
    composition: Composition,
}

impl CompositionSchema {
    fn with<I, S>(combinator: Combinator, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        Self {
            base: SchemaBase::default(),
            combinator,
            composition: Composition {
                schemas: schemas.into_iter().map(Into::into).collect(),
                discriminator: None,
            },
        }
    }

    pub fn all_of<I, S>(schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        Self::with(Combinator::AllOf, schemas)
    }

    pub fn any_of<I, S>(schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        Self::with(Combinator::AnyOf, schemas)
    }

    pub fn one_of<I, S>(schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        Self::with(Combinator::OneOf, schemas)
    }

    /// Attaches a discriminator. Ignored on `allOf` nodes, where the
    /// discriminator belongs on the composed base object instead.
    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.composition.discriminator = Some(discriminator);
        self
    }
}

impl SchemaBuilder for CompositionSchema {
    fn base_mut(&mut self) -> &mut SchemaBase {
        &mut self.base
    }

    fn build(self) -> Schema {
        let kind = match self.combinator {
            Combinator::AllOf => SchemaKind::AllOf(self.composition.schemas),
            Combinator::AnyOf => SchemaKind::AnyOf(self.composition),
            Combinator::OneOf => SchemaKind::OneOf(self.composition),
        };
        Schema::from_parts(kind, self.base)
    }
}

/// Builder for `not` nodes.
#[derive(Debug, Clone)]
pub struct NotSchema {
    base: SchemaBase,
    schema: Arc<Schema>,
}

impl NotSchema {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            base: SchemaBase::default(),
            schema: schema.into(),
        }
    }
}

impl SchemaBuilder for NotSchema {
    fn base_mut(&mut self) -> &mut SchemaBase {
        &mut self.base
    }

    fn build(self) -> Schema {
        Schema::from_parts(SchemaKind::Not(self.schema), self.base)
    }
}
