//! Primitive format codecs.
//!
//! Every primitive schema node is handled by a [`FormatCodec`] chosen by its
//! `(type, format)` pair. Codecs convert between the wire form and the typed
//! form and check representation-specific rules (date bounds, byte lengths).
//! A [`FormatRegistry`] holds the codecs; new pairs can be registered without
//! touching the engine, and a format with no codec of its own falls back to
//! the codec of its base type.

mod binary;
mod boolean;
mod date;
mod numeric;
mod string;

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::Arc;

use crate::error::{Exception, RegistryError};
use crate::schema::Schema;
use crate::value::Value;

pub use binary::{BinaryCodec, ByteCodec};
pub use boolean::BooleanCodec;
pub use date::{DateCodec, DateTimeCodec};
pub use numeric::{IntegerCodec, NumberCodec};
pub use string::StringCodec;

/// The primitive `type` of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Integer,
    Number,
    String,
}

impl DataType {
    fn slot(self) -> usize {
        match self {
            DataType::Boolean => 0,
            DataType::Integer => 1,
            DataType::Number => 2,
            DataType::String => 3,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Number => "number",
            DataType::String => "string",
        };
        write!(f, "{}", name)
    }
}

/// Everything a codec sees for one value.
pub struct FormatContext<'a> {
    /// The schema node being applied.
    pub schema: &'a Schema,
    /// The input value.
    pub value: &'a Value,
    /// Loosely typed input may be forced into the schema's type.
    pub coerce: bool,
    /// Where problems are reported.
    pub exception: &'a mut Exception,
}

impl<'a> FormatContext<'a> {
    /// Reports a problem with the current value.
    pub fn error(&mut self, message: impl Into<String>) {
        self.exception.push(message);
    }

    /// Reports that the value is not of the expected kind and returns
    /// `None`, for use as a codec's failure result.
    pub fn expected(&mut self, what: &str) -> Option<Value> {
        let message = format!("Expected {}. Received: {}", what, self.value.describe());
        self.exception.push(message);
        None
    }
}

/// A converter for one `(type, format)` pair.
///
/// `serialize` and `deserialize` return the converted value, or `None` after
/// reporting a problem on the context. `validate` checks a typed value and
/// reports problems on the context.
///
/// # Example
///
/// ```rust
/// use enforcer::{DataType, FormatCodec, FormatContext, FormatRegistry, Value};
///
/// struct Uppercase;
///
/// impl FormatCodec for Uppercase {
///     fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
///         match ctx.value.as_str() {
///             Some(s) => Some(Value::from(s.to_uppercase())),
///             None => ctx.expected("a string"),
///         }
///     }
///
///     fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
///         self.deserialize(ctx)
///     }
///
///     fn validate(&self, ctx: &mut FormatContext<'_>) {
///         if let Some(s) = ctx.value.as_str() {
///             if s.chars().any(char::is_lowercase) {
///                 ctx.error("Expected an uppercase string");
///             }
///         }
///     }
/// }
///
/// let mut formats = FormatRegistry::standard();
/// formats.register(DataType::String, "uppercase", Uppercase).unwrap();
/// assert!(formats.get(DataType::String, "uppercase").is_some());
/// ```
pub trait FormatCodec: Send + Sync {
    /// Converts a wire value into its typed form.
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value>;

    /// Converts a typed value into its wire form.
    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value>;

    /// Checks a typed value.
    fn validate(&self, ctx: &mut FormatContext<'_>);
}

/// A table of codecs keyed by `(type, format)`.
///
/// The four base types always have a codec. Registries are assembled before
/// use and then shared read-only behind an `Arc`, so tests and documents can
/// use isolated registries side by side.
#[derive(Clone)]
pub struct FormatRegistry {
    base: [Arc<dyn FormatCodec>; 4],
    formats: HashMap<(DataType, String), Arc<dyn FormatCodec>>,
}

impl FormatRegistry {
    /// A registry with codecs for the base types only.
    pub fn new() -> Self {
        Self {
            base: [
                Arc::new(BooleanCodec),
                Arc::new(IntegerCodec::new()),
                Arc::new(NumberCodec::new()),
                Arc::new(StringCodec),
            ],
            formats: HashMap::new(),
        }
    }

    /// A registry with the base types plus `int32`, `int64`, `float`,
    /// `double`, `date`, `date-time`, `byte` and `binary`.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let builtin: [(DataType, &str, Arc<dyn FormatCodec>); 8] = [
            (DataType::Integer, "int32", Arc::new(IntegerCodec::int32())),
            (DataType::Integer, "int64", Arc::new(IntegerCodec::new())),
            (DataType::Number, "float", Arc::new(NumberCodec::new())),
            (DataType::Number, "double", Arc::new(NumberCodec::new())),
            (DataType::String, "date", Arc::new(DateCodec)),
            (DataType::String, "date-time", Arc::new(DateTimeCodec)),
            (DataType::String, "byte", Arc::new(ByteCodec)),
            (DataType::String, "binary", Arc::new(BinaryCodec)),
        ];
        for (data_type, format, codec) in builtin {
            registry.formats.insert((data_type, format.to_string()), codec);
        }
        registry
    }

    /// Registers a codec for a new `(type, format)` pair.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateFormat` if the pair already has a
    /// codec, including the empty format of a base type.
    pub fn register(
        &mut self,
        data_type: DataType,
        format: impl Into<String>,
        codec: impl FormatCodec + 'static,
    ) -> Result<(), RegistryError> {
        let format = format.into();
        let key = (data_type, format);
        if key.1.is_empty() || self.formats.contains_key(&key) {
            return Err(RegistryError::DuplicateFormat {
                data_type,
                format: key.1,
            });
        }
        self.formats.insert(key, Arc::new(codec));
        Ok(())
    }

    /// The codec registered for exactly this pair. The empty format names
    /// the base type's codec.
    pub fn get(&self, data_type: DataType, format: &str) -> Option<Arc<dyn FormatCodec>> {
        if format.is_empty() {
            return Some(Arc::clone(&self.base[data_type.slot()]));
        }
        self.formats
            .get(&(data_type, format.to_string()))
            .cloned()
    }

    /// The codec to use for a node: its format's codec if there is one,
    /// otherwise the base type's.
    pub(crate) fn lookup(&self, data_type: DataType, format: Option<&str>) -> &dyn FormatCodec {
        format
            .and_then(|f| self.formats.get(&(data_type, f.to_string())))
            .unwrap_or(&self.base[data_type.slot()])
            .as_ref()
    }

    /// Whether a codec is registered for the pair.
    pub fn contains(&self, data_type: DataType, format: &str) -> bool {
        format.is_empty() || self.formats.contains_key(&(data_type, format.to_string()))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .formats
            .keys()
            .map(|(data_type, format)| format!("{}/{}", data_type, format))
            .collect();
        keys.sort();
        f.debug_struct("FormatRegistry").field("formats", &keys).finish()
    }
}
