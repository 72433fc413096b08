//! The schema processing engine.
//!
//! An [`Enforcer`] binds the settings of one API document (version, named
//! definitions, format codecs) and runs `validate`, `serialize` and
//! `deserialize` over schema trees. Every call threads one [`Exception`]
//! and one cycle map through the recursion and reports all problems at
//! once.

mod context;
mod discriminator;
mod primitive;
mod transform;
mod validate;

use std::sync::Arc;

use tracing::debug;

use crate::config::{EnforcerConfig, Version};
use crate::error::{Exception, RegistryError};
use crate::format::FormatRegistry;
use crate::registry::SchemaRegistry;
use crate::result::EnforcerResult;
use crate::schema::{resolve_chain, RefFailure, Schema, SchemaKind};
use crate::value::Value;

use context::{CallContext, Operation};

pub use discriminator::Discriminated;

pub(crate) use discriminator::Selection;

/// Runs schema operations for one API document.
///
/// Cloning is cheap: definitions and formats are shared.
///
/// # Example
///
/// ```rust
/// use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
/// use serde_json::json;
///
/// let enforcer = Enforcer::new(Version::V3);
/// let schema = Schema::object()
///     .field("born", Schema::string().format("date"))
///     .build();
///
/// let wire = Value::from(json!({"born": "2020-01-31"}));
/// let typed = enforcer.deserialize(&schema, &wire, false).into_result().unwrap();
/// assert!(matches!(typed.get("born"), Some(Value::Date(_))));
///
/// assert!(enforcer.validate(&schema, &typed).is_none());
///
/// let back = enforcer.serialize(&schema, &typed, false).into_result().unwrap();
/// assert_eq!(back, wire);
/// ```
#[derive(Debug, Clone)]
pub struct Enforcer {
    config: EnforcerConfig,
    definitions: SchemaRegistry,
    formats: Arc<FormatRegistry>,
}

impl Enforcer {
    /// An enforcer with default settings for the given document version,
    /// no definitions and the standard format codecs.
    pub fn new(version: Version) -> Self {
        Self::with_config(EnforcerConfig::new(version))
    }

    pub fn with_config(config: EnforcerConfig) -> Self {
        Self {
            config,
            definitions: SchemaRegistry::new(),
            formats: Arc::new(FormatRegistry::standard()),
        }
    }

    /// Uses `definitions` to resolve references and discriminators.
    pub fn with_definitions(mut self, definitions: SchemaRegistry) -> Self {
        self.definitions = definitions;
        self
    }

    /// Uses `formats` instead of the standard codecs.
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Arc::new(formats);
        self
    }

    /// Sets the maximum chain of references followed within one call.
    ///
    /// # Example
    ///
    /// ```rust
    /// use enforcer::{Enforcer, Version};
    ///
    /// let enforcer = Enforcer::new(Version::V3).with_max_depth(50);
    /// assert_eq!(enforcer.config().max_depth, 50);
    /// ```
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn version(&self) -> Version {
        self.config.version
    }

    pub fn config(&self) -> &EnforcerConfig {
        &self.config
    }

    pub fn definitions(&self) -> &SchemaRegistry {
        &self.definitions
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Validates a typed value. Returns `None` when the value is valid.
    pub fn validate(&self, schema: &Schema, value: &Value) -> Option<Exception> {
        let mut exception = Exception::new("Invalid value");
        let mut ctx = CallContext::new(self, Operation::Validate, false);
        validate::validate_node(&mut ctx, schema, value, &mut exception);

        debug!(
            operation = Operation::Validate.as_str(),
            valid = !exception.has_exception(),
            errors = exception.count(),
            "schema operation finished"
        );
        exception.has_exception().then_some(exception)
    }

    /// Validates a value against a named definition.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SchemaNotFound` if no definition has that name.
    pub fn validate_named(&self, name: &str, value: &Value) -> Result<Option<Exception>, RegistryError> {
        let schema = self.definitions.require(name)?;
        Ok(self.validate(&schema, value))
    }

    /// Converts a typed value into its wire form.
    ///
    /// With `coerce`, loosely typed scalars (numeric strings, `0`/`1` for
    /// booleans, ...) are forced into the schema's type.
    pub fn serialize(&self, schema: &Schema, value: &Value, coerce: bool) -> EnforcerResult<Value> {
        self.transform(
            Operation::Serialize,
            "Unable to serialize value",
            schema,
            value,
            coerce,
        )
    }

    /// Converts a wire value into its typed form.
    pub fn deserialize(&self, schema: &Schema, value: &Value, coerce: bool) -> EnforcerResult<Value> {
        self.transform(
            Operation::Deserialize,
            "Unable to deserialize value",
            schema,
            value,
            coerce,
        )
    }

    fn transform(
        &self,
        operation: Operation,
        header: &str,
        schema: &Schema,
        value: &Value,
        coerce: bool,
    ) -> EnforcerResult<Value> {
        let mut exception = Exception::new(header);
        let mut ctx = CallContext::new(self, operation, coerce);
        let output = transform::transform_node(&mut ctx, schema, value, &mut exception);

        debug!(
            operation = operation.as_str(),
            coerce,
            valid = !exception.has_exception(),
            errors = exception.count(),
            "schema operation finished"
        );
        EnforcerResult::new(output, exception)
    }

    /// Reads the discriminator of `schema` (following references) and
    /// selects the schema `value` names. Returns `None` when the schema has
    /// no discriminator.
    ///
    /// # Example
    ///
    /// ```rust
    /// use enforcer::{Discriminator, Enforcer, Schema, SchemaBuilder, Value, Version};
    /// use serde_json::json;
    ///
    /// let enforcer = Enforcer::new(Version::V3);
    /// enforcer.definitions().register("Cat", Schema::object()).unwrap();
    ///
    /// let pet = Schema::one_of([Schema::reference("Cat")])
    ///     .discriminator(Discriminator::new("petType"))
    ///     .build();
    ///
    /// let found = enforcer.discriminator(&pet, &Value::from(json!({"petType": "Cat"}))).unwrap();
    /// assert_eq!(found.key.as_deref(), Some("Cat"));
    /// assert!(found.schema.is_some());
    ///
    /// let unknown = enforcer.discriminator(&pet, &Value::from(json!({"petType": "Fox"}))).unwrap();
    /// assert!(unknown.schema.is_none());
    /// ```
    pub fn discriminator(&self, schema: &Schema, value: &Value) -> Option<Discriminated> {
        let resolved;
        let schema = match schema.kind() {
            SchemaKind::Ref(name) => {
                let start = Arc::new(Schema::reference(name.clone()));
                resolved = self.resolve(&start).ok()?;
                resolved.as_ref()
            }
            _ => schema,
        };
        let discriminator = schema.discriminator()?;
        Some(match self.select(discriminator, value) {
            Selection::Missing => Discriminated {
                key: None,
                schema: None,
            },
            Selection::Unmapped(key) => Discriminated {
                key: Some(key),
                schema: None,
            },
            Selection::Mapped(key, schema) => Discriminated {
                key: Some(key),
                schema: Some(schema),
            },
        })
    }

    /// Checks every `example` in a schema tree against its own schema.
    ///
    /// Problems are advisory: they are reported on the warning tree of the
    /// result and never on its error tree. References are not followed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use enforcer::{Enforcer, Schema, SchemaBuilder, Version};
    ///
    /// let enforcer = Enforcer::new(Version::V3);
    /// let schema = Schema::object()
    ///     .field("age", Schema::integer().minimum(0.0).example(-1))
    ///     .build();
    ///
    /// let result = enforcer.check_example(&schema);
    /// assert!(result.is_ok());
    /// assert!(result.warning().is_some());
    /// ```
    pub fn check_example(&self, schema: &Schema) -> EnforcerResult<()> {
        let mut warning = Exception::new("One or more examples do not match their schema");
        self.check_examples_in(schema, &mut warning);

        debug!(
            warnings = warning.count(),
            "example check finished"
        );
        EnforcerResult::new(Some(()), Exception::default()).with_warning(warning)
    }

    fn check_examples_in(&self, schema: &Schema, warning: &mut Exception) {
        if let Some(example) = schema.example() {
            let deserialized = self.deserialize(schema, example, false);
            match deserialized.into_result() {
                Ok(typed) => {
                    if let Some(problems) = self.validate(schema, &typed) {
                        warning.merge(problems);
                    }
                }
                Err(problems) => {
                    warning.merge(problems);
                }
            }
        }

        match schema.kind() {
            SchemaKind::Array(rules) => {
                if let Some(items) = rules.items() {
                    self.check_examples_in(items, warning.at("items"));
                }
            }
            SchemaKind::Object(rules) => {
                for (name, property) in rules.properties() {
                    self.check_examples_in(property, warning.at(name.as_str()));
                }
            }
            SchemaKind::AllOf(schemas) => {
                for (index, branch) in schemas.iter().enumerate() {
                    self.check_examples_in(branch, warning.at("allOf").at(index));
                }
            }
            SchemaKind::AnyOf(composition) => {
                for (index, branch) in composition.schemas().iter().enumerate() {
                    self.check_examples_in(branch, warning.at("anyOf").at(index));
                }
            }
            SchemaKind::OneOf(composition) => {
                for (index, branch) in composition.schemas().iter().enumerate() {
                    self.check_examples_in(branch, warning.at("oneOf").at(index));
                }
            }
            SchemaKind::Not(inner) => self.check_examples_in(inner, warning.at("not")),
            _ => {}
        }
    }

    /// Follows reference nodes to a concrete schema.
    pub(crate) fn resolve(&self, schema: &Arc<Schema>) -> Result<Arc<Schema>, RefFailure> {
        resolve_chain(&self.definitions, schema, self.config.max_depth)
    }
}

impl Default for Enforcer {
    fn default() -> Self {
        Self::with_config(EnforcerConfig::default())
    }
}

// Enforcers are shared across request-handling threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Enforcer>();
    assert_send_sync::<Schema>();
};
