use crate::config::Version;
use crate::format::DataType;
use crate::parameter::{CollectionFormat, Location, Style};

/// A parameter definition that cannot be used to decode values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("style \"{style}\" is not allowed for {location} parameter \"{name}\"")]
    StyleNotAllowed {
        name: String,
        location: Location,
        style: Style,
    },

    #[error("style \"{style}\" requires an {expected} schema for parameter \"{name}\"")]
    StyleSchemaMismatch {
        name: String,
        style: Style,
        expected: &'static str,
    },

    #[error("collection format \"{format}\" is not allowed for {location} parameter \"{name}\"")]
    CollectionFormatNotAllowed {
        name: String,
        location: Location,
        format: CollectionFormat,
    },

    #[error("collection format is only allowed for array parameters, \"{0}\" is not an array")]
    CollectionFormatRequiresArray(String),

    #[error("path parameter \"{0}\" must be required")]
    PathNotRequired(String),

    #[error("allowEmptyValue is not allowed for {location} parameter \"{name}\"")]
    AllowEmptyValueNotAllowed { name: String, location: Location },

    #[error("{location} parameters are not supported in OpenAPI {version}")]
    LocationNotSupported { location: Location, version: Version },

    #[error("{setting} cannot be used on parameter \"{name}\" in OpenAPI {version}")]
    VersionMismatch {
        name: String,
        setting: &'static str,
        version: Version,
    },

    #[error("{location} parameter \"{name}\" cannot have an object schema in OpenAPI {version}")]
    ObjectNotSupported {
        name: String,
        location: Location,
        version: Version,
    },

    #[error("unresolved schema reference '{0}'")]
    UnresolvedReference(String),
}

/// Errors raised while registering named schemas or format codecs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Attempted to register a schema with a name that already exists.
    #[error("schema '{0}' already registered")]
    DuplicateName(String),

    /// Looked up a schema name that doesn't exist.
    #[error("schema '{0}' not found")]
    SchemaNotFound(String),

    /// Attempted to register a second codec for the same type and format.
    #[error("a codec for {data_type} format '{format}' is already registered")]
    DuplicateFormat { data_type: DataType, format: String },
}
