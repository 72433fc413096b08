//! Schema nodes.
//!
//! A [`Schema`] is one validation/conversion unit of an API document. Its
//! [`SchemaKind`] is a closed union, so exactly one of a primitive type,
//! `array`, `object`, `allOf`, `anyOf`, `oneOf`, `not` or a named reference
//! governs how a node is traversed. Attributes shared by every kind
//! (`format`, `nullable`, `enum`, `example`) live next to the kind.
//!
//! Schemas are built once, wrapped in `Arc`, and shared read-only by every
//! call that uses them.
//!
//! # Example
//!
//! ```rust
//! use enforcer::{Schema, SchemaBuilder};
//!
//! let pet = Schema::object()
//!     .field("name", Schema::string().min_length(1))
//!     .optional("born", Schema::string().format("date"))
//!     .optional("tags", Schema::array(Schema::string()).unique_items())
//!     .build();
//!
//! assert!(pet.is_object());
//! ```

mod array;
mod combinators;
mod numeric;
mod object;
mod ref_schema;
mod string;

use std::sync::Arc;

use crate::format::DataType;
use crate::value::Value;

pub use array::{ArrayRules, ArraySchema};
pub use combinators::{Composition, CompositionSchema, Discriminator, NotSchema};
pub use numeric::{NumericRules, NumericSchema};
pub use object::{AdditionalProperties, AdditionalPropertiesSetting, ObjectRules, ObjectSchema};
pub use string::{StringRules, StringSchema};

pub(crate) use ref_schema::{definition_name, resolve_chain, RefFailure};

/// What governs traversal at a schema node.
#[derive(Debug)]
pub enum SchemaKind {
    /// No `type`: any value is accepted.
    Any,
    Boolean,
    Integer(NumericRules),
    Number(NumericRules),
    String(StringRules),
    Array(ArrayRules),
    Object(ObjectRules),
    AllOf(Vec<Arc<Schema>>),
    AnyOf(Composition),
    OneOf(Composition),
    Not(Arc<Schema>),
    /// A named definition held by the [`SchemaRegistry`](crate::SchemaRegistry).
    Ref(String),
}

/// Attributes every schema kind carries.
#[derive(Debug, Clone, Default)]
pub struct SchemaBase {
    format: Option<String>,
    nullable: bool,
    enumeration: Option<Vec<Value>>,
    example: Option<Value>,
}

/// A schema node.
#[derive(Debug)]
pub struct Schema {
    kind: SchemaKind,
    base: SchemaBase,
}

impl Schema {
    /// Assembles a node from its kind and shared attributes.
    pub fn from_parts(kind: SchemaKind, base: SchemaBase) -> Self {
        Self { kind, base }
    }

    /// A schema without a `type`.
    pub fn any() -> AnySchema {
        AnySchema::default()
    }

    pub fn boolean() -> BooleanSchema {
        BooleanSchema::default()
    }

    pub fn integer() -> NumericSchema {
        NumericSchema::integer()
    }

    pub fn number() -> NumericSchema {
        NumericSchema::number()
    }

    pub fn string() -> StringSchema {
        StringSchema::new()
    }

    /// An array schema whose items follow `items`.
    pub fn array(items: impl Into<Arc<Schema>>) -> ArraySchema {
        ArraySchema::new().items(items)
    }

    pub fn object() -> ObjectSchema {
        ObjectSchema::new()
    }

    pub fn all_of<I, S>(schemas: I) -> CompositionSchema
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        CompositionSchema::all_of(schemas)
    }

    pub fn any_of<I, S>(schemas: I) -> CompositionSchema
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        CompositionSchema::any_of(schemas)
    }

    pub fn one_of<I, S>(schemas: I) -> CompositionSchema
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Schema>>,
    {
        CompositionSchema::one_of(schemas)
    }

    pub fn not(schema: impl Into<Arc<Schema>>) -> NotSchema {
        NotSchema::new(schema)
    }

    /// A reference to a named definition, resolved at call time.
    pub fn reference(name: impl Into<String>) -> Schema {
        Schema::from_parts(SchemaKind::Ref(name.into()), SchemaBase::default())
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn format(&self) -> Option<&str> {
        self.base.format.as_deref()
    }

    pub fn is_nullable(&self) -> bool {
        self.base.nullable
    }

    pub fn enumeration(&self) -> Option<&[Value]> {
        self.base.enumeration.as_deref()
    }

    pub fn example(&self) -> Option<&Value> {
        self.base.example.as_ref()
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, SchemaKind::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, SchemaKind::Array(_))
    }

    /// The primitive data type of this node, if it has one.
    pub fn data_type(&self) -> Option<DataType> {
        match self.kind {
            SchemaKind::Boolean => Some(DataType::Boolean),
            SchemaKind::Integer(_) => Some(DataType::Integer),
            SchemaKind::Number(_) => Some(DataType::Number),
            SchemaKind::String(_) => Some(DataType::String),
            _ => None,
        }
    }

    /// String constraints, for format codecs that interpret them.
    pub fn string_rules(&self) -> Option<&StringRules> {
        match &self.kind {
            SchemaKind::String(rules) => Some(rules),
            _ => None,
        }
    }

    /// The discriminator declared on this node, if any.
    pub fn discriminator(&self) -> Option<&Discriminator> {
        match &self.kind {
            SchemaKind::Object(rules) => rules.discriminator(),
            SchemaKind::AnyOf(composition) | SchemaKind::OneOf(composition) => {
                composition.discriminator()
            }
            _ => None,
        }
    }

    /// Collects the names of every definition this schema refers to,
    /// without following the references themselves.
    pub fn collect_refs(&self, refs: &mut Vec<String>) {
        match &self.kind {
            SchemaKind::Ref(name) => refs.push(name.clone()),
            SchemaKind::Array(rules) => {
                if let Some(items) = rules.items() {
                    items.collect_refs(refs);
                }
            }
            SchemaKind::Object(rules) => rules.collect_refs(refs),
            SchemaKind::AllOf(schemas) => {
                for schema in schemas {
                    schema.collect_refs(refs);
                }
            }
            SchemaKind::AnyOf(composition) | SchemaKind::OneOf(composition) => {
                composition.collect_refs(refs)
            }
            SchemaKind::Not(schema) => schema.collect_refs(refs),
            SchemaKind::Any
            | SchemaKind::Boolean
            | SchemaKind::Integer(_)
            | SchemaKind::Number(_)
            | SchemaKind::String(_) => {}
        }
    }
}

/// Builder methods shared by every schema builder.
///
/// Implementors only expose their [`SchemaBase`]; the attribute setters and
/// the conversion into a shared node come for free.
pub trait SchemaBuilder: Sized {
    /// The shared attributes being built.
    fn base_mut(&mut self) -> &mut SchemaBase;

    /// Finishes the node.
    fn build(self) -> Schema;

    /// Allows `null` in addition to the schema's own type.
    fn nullable(mut self) -> Self {
        self.base_mut().nullable = true;
        self
    }

    /// Restricts values to the given members, compared by value.
    fn enumeration<I, V>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.base_mut().enumeration = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the `format` keyword (`date`, `date-time`, `byte`, `int32`, ...).
    fn format(mut self, format: impl Into<String>) -> Self {
        self.base_mut().format = Some(format.into());
        self
    }

    /// Attaches an example in wire format.
    fn example(mut self, example: impl Into<Value>) -> Self {
        self.base_mut().example = Some(example.into());
        self
    }

    /// Finishes the node and wraps it for sharing.
    fn shared(self) -> Arc<Schema> {
        Arc::new(self.build())
    }
}

/// Builder for a schema without a `type`.
#[derive(Debug, Default)]
pub struct AnySchema {
    base: SchemaBase,
}

impl SchemaBuilder for AnySchema {
    fn base_mut(&mut self) -> &mut SchemaBase {
        &mut self.base
    }

    fn build(self) -> Schema {
        Schema::from_parts(SchemaKind::Any, self.base)
    }
}

/// Builder for `type: boolean`.
#[derive(Debug, Default)]
pub struct BooleanSchema {
    base: SchemaBase,
}

impl SchemaBuilder for BooleanSchema {
    fn base_mut(&mut self) -> &mut SchemaBase {
        &mut self.base
    }

    fn build(self) -> Schema {
        Schema::from_parts(SchemaKind::Boolean, self.base)
    }
}

macro_rules! impl_schema_conversions {
    ($($builder:ty),* $(,)?) => {
        $(
            impl From<$builder> for Schema {
                fn from(builder: $builder) -> Self {
                    builder.build()
                }
            }

            impl From<$builder> for Arc<Schema> {
                fn from(builder: $builder) -> Self {
                    Arc::new(builder.build())
                }
            }
        )*
    };
}

impl_schema_conversions!(
    AnySchema,
    BooleanSchema,
    NumericSchema,
    StringSchema,
    ArraySchema,
    ObjectSchema,
    CompositionSchema,
    NotSchema,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_per_kind() {
        assert_eq!(Schema::boolean().build().data_type(), Some(DataType::Boolean));
        assert_eq!(Schema::integer().build().data_type(), Some(DataType::Integer));
        assert_eq!(Schema::number().build().data_type(), Some(DataType::Number));
        assert_eq!(Schema::string().build().data_type(), Some(DataType::String));
        assert_eq!(Schema::object().build().data_type(), None);
        assert_eq!(Schema::reference("Pet").data_type(), None);
    }

    #[test]
    fn test_shared_attributes() {
        let schema = Schema::string()
            .format("date")
            .nullable()
            .enumeration(["2020-01-01"])
            .example("2020-01-01")
            .build();

        assert_eq!(schema.format(), Some("date"));
        assert!(schema.is_nullable());
        assert_eq!(schema.enumeration().map(<[Value]>::len), Some(1));
        assert_eq!(schema.example(), Some(&Value::from("2020-01-01")));
    }

    #[test]
    fn test_collect_refs_walks_the_tree() {
        let schema = Schema::object()
            .field("owner", Schema::reference("Person"))
            .optional("pets", Schema::array(Schema::reference("Pet")))
            .build();

        let mut refs = Vec::new();
        schema.collect_refs(&mut refs);
        assert_eq!(refs, vec!["Person".to_string(), "Pet".to_string()]);
    }
}
