//! # Enforcer
//!
//! A value engine for OpenAPI (v2 and v3) documents that validates,
//! serializes, deserializes and parameter-decodes values, reporting ALL
//! problems in one pass rather than stopping at the first.
//!
//! ## Overview
//!
//! Every operation threads one [`Exception`] tree through the whole schema
//! walk. Problems are attached at the array index or property they concern,
//! grouped under explanatory headers, and rendered either as an indented
//! tree or as one line per problem. Whether a non-empty tree becomes an
//! error, a panic or a log line is up to the caller.
//!
//! ## Core Types
//!
//! - [`Schema`]: a schema node, built with [`Schema::string`], [`Schema::object`], ...
//! - [`Enforcer`]: runs `validate`, `serialize`, `deserialize` against a document's settings
//! - [`Value`]: the runtime value model, including dates, bytes and cyclic containers
//! - [`Exception`]: the hierarchical error/warning tree
//! - [`Parameter`]: decodes path, query, header and cookie parameters
//! - [`FormatRegistry`]: the codecs behind `format` (`date`, `byte`, ...)
//!
//! ## Example
//!
//! ```rust
//! use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
//! use serde_json::json;
//!
//! let enforcer = Enforcer::new(Version::V3);
//! let schema = Schema::object()
//!     .field("name", Schema::string().min_length(1))
//!     .field("age", Schema::integer().minimum(0.0))
//!     .build();
//!
//! // Valid values produce no exception
//! assert!(enforcer.validate(&schema, &Value::from(json!({"name": "Ada", "age": 36}))).is_none());
//!
//! // Invalid values report every problem
//! let exception = enforcer
//!     .validate(&schema, &Value::from(json!({"name": "", "age": -1})))
//!     .unwrap();
//! assert_eq!(exception.count(), 2);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod parameter;
pub mod path;
pub mod registry;
pub mod result;
pub mod schema;
pub mod value;

pub use config::{EnforcerConfig, UnsupportedVersion, Version};
pub use engine::{Discriminated, Enforcer};
pub use error::{DefinitionError, Exception, RegistryError};
pub use format::{DataType, FormatCodec, FormatContext, FormatRegistry};
pub use parameter::{CollectionFormat, Location, Parameter, ParameterBuilder, QueryMap, Style};
pub use path::{PathSegment, ValuePath};
pub use registry::SchemaRegistry;
pub use result::EnforcerResult;
pub use schema::{
    AdditionalProperties, AnySchema, ArraySchema, BooleanSchema, CompositionSchema, Discriminator,
    NotSchema, NumericSchema, ObjectSchema, Schema, SchemaBase, SchemaBuilder, SchemaKind,
    StringSchema,
};
pub use value::{Value, ValueAttributes};
