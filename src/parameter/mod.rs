//! HTTP parameter decoding.
//!
//! A [`Parameter`] knows where a value travels (path, query, header, ...)
//! and how it is encoded there. Decoding happens in three steps: the raw
//! text is decomposed according to the style (or v2 collection format),
//! every leaf is parsed into a scalar of the schema's type, and the result
//! is deserialized through the [`Enforcer`] so formats such as `date` apply.
//!
//! Whether a parameter is present at all, and whether that is acceptable,
//! is left to the caller: an absent parameter decodes to `None`.
//!
//! # Example
//!
//! ```rust
//! use enforcer::{Enforcer, Location, Parameter, Schema, Style, Value, Version};
//!
//! let enforcer = Enforcer::new(Version::V3);
//! let ids = Parameter::builder("ids", Location::Path, Schema::array(Schema::number()))
//!     .required(true)
//!     .style(Style::Simple)
//!     .build(&enforcer)
//!     .unwrap();
//!
//! let parsed = ids.parse(&enforcer, "3,4,5", None).unwrap();
//! assert_eq!(
//!     parsed.into_result().unwrap(),
//!     Value::array(vec![Value::Integer(3), Value::Integer(4), Value::Integer(5)])
//! );
//! ```

mod primitive;
mod query;
mod style;

use std::fmt::{self, Display};
use std::sync::Arc;

use tracing::debug;

use crate::config::Version;
use crate::engine::Enforcer;
use crate::error::{DefinitionError, Exception};
use crate::format::DataType;
use crate::result::EnforcerResult;
use crate::schema::{AdditionalProperties, RefFailure, Schema, SchemaKind};
use crate::value::Value;

pub use query::{parse_cookie, parse_query, QueryMap};
pub use style::{CollectionFormat, Style};

use primitive::{parse_primitive, EMPTY_NOT_ALLOWED};
use style::{Malformed, Raw, Shape, NOT_FORMATTED};

/// Where a parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Path,
    Query,
    Header,
    Cookie,
    /// Swagger 2 only.
    Body,
    /// Swagger 2 only.
    FormData,
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
            Location::Body => "body",
            Location::FormData => "formData",
        };
        f.write_str(name)
    }
}

/// How a built parameter's value is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Style { style: Style, explode: bool },
    Collection(CollectionFormat),
    Json,
}

/// A parameter definition checked against its document version.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    location: Location,
    schema: Arc<Schema>,
    required: bool,
    allow_empty_value: bool,
    encoding: Encoding,
    shape: Shape,
}

/// Builder for [`Parameter`]. Unset settings take the defaults of the
/// document version.
#[derive(Debug, Clone)]
pub struct ParameterBuilder {
    name: String,
    location: Location,
    schema: Arc<Schema>,
    required: bool,
    allow_empty_value: bool,
    style: Option<Style>,
    explode: Option<bool>,
    collection_format: Option<CollectionFormat>,
}

impl Parameter {
    pub fn builder(
        name: impl Into<String>,
        location: Location,
        schema: impl Into<Arc<Schema>>,
    ) -> ParameterBuilder {
        ParameterBuilder {
            name: name.into(),
            location,
            schema: schema.into(),
            required: false,
            allow_empty_value: false,
            style: None,
            explode: None,
            collection_format: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allows_empty_value(&self) -> bool {
        self.allow_empty_value
    }

    /// The effective v3 style, if the parameter has one.
    pub fn style(&self) -> Option<Style> {
        match self.encoding {
            Encoding::Style { style, .. } => Some(style),
            _ => None,
        }
    }

    /// The effective v3 explode flag, if the parameter has one.
    pub fn explode(&self) -> Option<bool> {
        match self.encoding {
            Encoding::Style { explode, .. } => Some(explode),
            _ => None,
        }
    }

    /// The effective v2 collection format, if the parameter has one.
    pub fn collection_format(&self) -> Option<CollectionFormat> {
        match self.encoding {
            Encoding::Collection(format) => Some(format),
            _ => None,
        }
    }

    /// Decodes this parameter from a request.
    ///
    /// `raw` is the parameter's own text for path and header parameters,
    /// the JSON text of a v2 body, and the full query string (or `Cookie`
    /// header, or form body) for query, cookie and formData parameters.
    /// Callers that already split the query or cookie pass the map as
    /// `preparsed` and `raw` is ignored for those locations.
    ///
    /// Returns `None` when the parameter is absent.
    pub fn parse(
        &self,
        enforcer: &Enforcer,
        raw: &str,
        preparsed: Option<&QueryMap>,
    ) -> Option<EnforcerResult<Value>> {
        let mut exception = Exception::new(format!(
            "Unable to parse {} parameter \"{}\"",
            self.location, self.name
        ));

        if self.encoding == Encoding::Json {
            return Some(self.parse_json(enforcer, raw, exception));
        }

        let owned;
        let map = match self.location {
            Location::Query | Location::Cookie | Location::FormData => Some(match preparsed {
                Some(map) => map,
                None => {
                    owned = match self.location {
                        Location::Cookie => parse_cookie(raw),
                        _ => parse_query(raw),
                    };
                    &owned
                }
            }),
            _ => None,
        };

        let empty = match map {
            Some(map) => map
                .get(&self.name)
                .is_some_and(|values| values.iter().all(String::is_empty)),
            None => raw.is_empty(),
        };
        if empty {
            if self.allow_empty_value {
                debug!(parameter = %self.name, "empty parameter value");
                return Some(EnforcerResult::new(Some(Value::Empty), exception));
            }
            exception.push(EMPTY_NOT_ALLOWED);
            return Some(EnforcerResult::new(None, exception));
        }

        let decomposed = match map {
            Some(map) => self.decompose_map(enforcer, map),
            None => self.decompose_text(raw).map(Some),
        };
        let raw = match decomposed {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(Malformed) => {
                exception.push(NOT_FORMATTED);
                return Some(EnforcerResult::new(None, exception));
            }
        };

        let Some(typed) = self.type_raw(enforcer, raw, &mut exception) else {
            return Some(EnforcerResult::new(None, exception));
        };
        if exception.has_exception() {
            return Some(EnforcerResult::new(None, exception));
        }

        let result = enforcer.deserialize(&self.schema, &typed, true);
        debug!(
            parameter = %self.name,
            location = %self.location,
            valid = result.is_ok(),
            "parameter parsed"
        );
        Some(result)
    }

    fn parse_json(&self, enforcer: &Enforcer, raw: &str, mut exception: Exception) -> EnforcerResult<Value> {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(json) => enforcer.deserialize(&self.schema, &Value::from(json), false),
            Err(err) => {
                exception.push(format!("{}: {}", NOT_FORMATTED, err));
                EnforcerResult::new(None, exception)
            }
        }
    }

    fn decompose_text(&self, text: &str) -> Result<Raw, Malformed> {
        let raw = match self.encoding {
            Encoding::Style { style, explode } => {
                style::split_text(style, explode, self.shape, &self.name, text)?
            }
            Encoding::Collection(format) => {
                style::split_collection(format, self.shape, &[text.to_string()])
            }
            Encoding::Json => Raw::Scalar(text.to_string()),
        };
        Ok(match self.location {
            Location::Path => raw.map_leaves(query::decode),
            _ => raw,
        })
    }

    fn decompose_map(&self, enforcer: &Enforcer, map: &QueryMap) -> Result<Option<Raw>, Malformed> {
        match self.encoding {
            Encoding::Style { style, explode } => {
                let properties = property_names(enforcer, &self.schema);
                style::split_map(style, explode, self.shape, &self.name, map, &properties)
            }
            Encoding::Collection(format) => Ok(map
                .get(&self.name)
                .map(|values| style::split_collection(format, self.shape, values))),
            Encoding::Json => Ok(None),
        }
    }

    /// Parses the leaves of a decomposed value against the schema.
    fn type_raw(&self, enforcer: &Enforcer, raw: Raw, exception: &mut Exception) -> Option<Value> {
        match raw {
            Raw::Scalar(text) => parse_primitive(&text, leaf_type(enforcer, &self.schema), exception),
            Raw::List(items) => {
                let item_type = items_schema(enforcer, &self.schema)
                    .and_then(|items| leaf_type(enforcer, &items));
                let mut output = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    if let Some(value) = parse_primitive(item, item_type, exception.at(index)) {
                        output.push(value);
                    }
                }
                Some(Value::array(output))
            }
            Raw::Pairs(pairs) => {
                let output = Value::object(Vec::<(String, Value)>::new());
                for (key, text) in &pairs {
                    let property_type = property_schema(enforcer, &self.schema, key)
                        .and_then(|property| leaf_type(enforcer, &property));
                    if let Some(value) = parse_primitive(text, property_type, exception.at(key.as_str())) {
                        output.insert(key.clone(), value);
                    }
                }
                Some(output)
            }
        }
    }
}

/// The primitive type leaves of `schema` parse into.
fn leaf_type(enforcer: &Enforcer, schema: &Arc<Schema>) -> Option<DataType> {
    let schema = enforcer.resolve(schema).ok()?;
    match schema.kind() {
        SchemaKind::AllOf(branches) => branches
            .iter()
            .find_map(|branch| leaf_type(enforcer, branch)),
        _ => schema.data_type(),
    }
}

/// Finds the concrete node that decides a parameter's structure: references
/// are followed, and an `allOf` takes the first branch that has a structure.
fn structural(enforcer: &Enforcer, schema: &Arc<Schema>) -> Result<Arc<Schema>, RefFailure> {
    let schema = enforcer.resolve(schema)?;
    if let SchemaKind::AllOf(branches) = schema.kind() {
        for branch in branches {
            let concrete = structural(enforcer, branch)?;
            if concrete.is_array() || concrete.is_object() {
                return Ok(concrete);
            }
        }
    }
    Ok(schema)
}

fn shape_of(enforcer: &Enforcer, schema: &Arc<Schema>) -> Result<Shape, RefFailure> {
    let schema = structural(enforcer, schema)?;
    Ok(match schema.kind() {
        SchemaKind::Array(_) => Shape::Array,
        SchemaKind::Object(_) => Shape::Object,
        _ => Shape::Primitive,
    })
}

fn items_schema(enforcer: &Enforcer, schema: &Arc<Schema>) -> Option<Arc<Schema>> {
    let schema = structural(enforcer, schema).ok()?;
    match schema.kind() {
        SchemaKind::Array(rules) => rules.items().cloned(),
        _ => None,
    }
}

/// The schema of one property, searching `allOf` branches in order.
fn property_schema(enforcer: &Enforcer, schema: &Arc<Schema>, name: &str) -> Option<Arc<Schema>> {
    let schema = enforcer.resolve(schema).ok()?;
    match schema.kind() {
        SchemaKind::Object(rules) => rules.property(name).cloned().or_else(|| {
            match rules.additional_properties() {
                AdditionalProperties::Validate(additional) => Some(Arc::clone(additional)),
                _ => None,
            }
        }),
        SchemaKind::AllOf(branches) => branches
            .iter()
            .find_map(|branch| property_schema(enforcer, branch, name)),
        _ => None,
    }
}

fn property_names(enforcer: &Enforcer, schema: &Arc<Schema>) -> Vec<String> {
    let Ok(schema) = enforcer.resolve(schema) else {
        return Vec::new();
    };
    match schema.kind() {
        SchemaKind::Object(rules) => rules.properties().keys().cloned().collect(),
        SchemaKind::AllOf(branches) => {
            let mut names = Vec::new();
            for branch in branches {
                for name in property_names(enforcer, branch) {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
            names
        }
        _ => Vec::new(),
    }
}

impl ParameterBuilder {
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn allow_empty_value(mut self, allow: bool) -> Self {
        self.allow_empty_value = allow;
        self
    }

    /// Sets the v3 style.
    pub fn style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    /// Sets the v3 explode flag.
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = Some(explode);
        self
    }

    /// Sets the v2 collection format.
    pub fn collection_format(mut self, format: CollectionFormat) -> Self {
        self.collection_format = Some(format);
        self
    }

    /// Checks the definition against the enforcer's document version and
    /// fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] when the location, style, collection
    /// format or schema cannot be used together.
    pub fn build(self, enforcer: &Enforcer) -> Result<Parameter, DefinitionError> {
        let version = enforcer.version();
        let shape = shape_of(enforcer, &self.schema).map_err(|failure| match failure {
            RefFailure::Unresolved(name) => DefinitionError::UnresolvedReference(name),
            RefFailure::TooDeep(_) => DefinitionError::UnresolvedReference(self.name.clone()),
        })?;

        if self.location == Location::Path && !self.required {
            return Err(DefinitionError::PathNotRequired(self.name));
        }

        let encoding = match version {
            Version::V3 => self.check_v3(shape)?,
            Version::V2 => self.check_v2(shape)?,
        };

        debug!(
            parameter = %self.name,
            location = %self.location,
            version = %version,
            "parameter definition built"
        );

        Ok(Parameter {
            name: self.name,
            location: self.location,
            schema: self.schema,
            required: self.required,
            allow_empty_value: self.allow_empty_value,
            encoding,
            shape,
        })
    }

    fn check_v3(&self, shape: Shape) -> Result<Encoding, DefinitionError> {
        let allowed: &[Style] = match self.location {
            Location::Path => &[Style::Simple, Style::Label, Style::Matrix],
            Location::Query => &[
                Style::Form,
                Style::SpaceDelimited,
                Style::PipeDelimited,
                Style::DeepObject,
            ],
            Location::Header => &[Style::Simple],
            Location::Cookie => &[Style::Form],
            Location::Body | Location::FormData => {
                return Err(DefinitionError::LocationNotSupported {
                    location: self.location,
                    version: Version::V3,
                })
            }
        };

        if self.collection_format.is_some() {
            return Err(DefinitionError::VersionMismatch {
                name: self.name.clone(),
                setting: "collectionFormat",
                version: Version::V3,
            });
        }
        if self.allow_empty_value && self.location != Location::Query {
            return Err(DefinitionError::AllowEmptyValueNotAllowed {
                name: self.name.clone(),
                location: self.location,
            });
        }

        let style = self.style.unwrap_or(allowed[0]);
        if !allowed.contains(&style) {
            return Err(DefinitionError::StyleNotAllowed {
                name: self.name.clone(),
                location: self.location,
                style,
            });
        }

        let expected = match style {
            Style::SpaceDelimited | Style::PipeDelimited if shape != Shape::Array => Some("array"),
            Style::DeepObject if shape != Shape::Object => Some("object"),
            _ => None,
        };
        if let Some(expected) = expected {
            return Err(DefinitionError::StyleSchemaMismatch {
                name: self.name.clone(),
                style,
                expected,
            });
        }

        let explode = self.explode.unwrap_or(style == Style::Form);
        Ok(Encoding::Style { style, explode })
    }

    fn check_v2(&self, shape: Shape) -> Result<Encoding, DefinitionError> {
        if self.location == Location::Cookie {
            return Err(DefinitionError::LocationNotSupported {
                location: self.location,
                version: Version::V2,
            });
        }
        for (set, setting) in [(self.style.is_some(), "style"), (self.explode.is_some(), "explode")] {
            if set {
                return Err(DefinitionError::VersionMismatch {
                    name: self.name.clone(),
                    setting,
                    version: Version::V2,
                });
            }
        }

        let form_like = matches!(self.location, Location::Query | Location::FormData);
        if self.allow_empty_value && !form_like {
            return Err(DefinitionError::AllowEmptyValueNotAllowed {
                name: self.name.clone(),
                location: self.location,
            });
        }

        if self.location == Location::Body {
            if let Some(format) = self.collection_format {
                return Err(DefinitionError::CollectionFormatNotAllowed {
                    name: self.name.clone(),
                    location: self.location,
                    format,
                });
            }
            return Ok(Encoding::Json);
        }

        if shape == Shape::Object {
            return Err(DefinitionError::ObjectNotSupported {
                name: self.name.clone(),
                location: self.location,
                version: Version::V2,
            });
        }

        match self.collection_format {
            Some(_) if shape != Shape::Array => {
                Err(DefinitionError::CollectionFormatRequiresArray(self.name.clone()))
            }
            Some(CollectionFormat::Multi) if !form_like => {
                Err(DefinitionError::CollectionFormatNotAllowed {
                    name: self.name.clone(),
                    location: self.location,
                    format: CollectionFormat::Multi,
                })
            }
            format => Ok(Encoding::Collection(format.unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaBuilder;

    #[test]
    fn test_v3_defaults() {
        let enforcer = Enforcer::new(Version::V3);
        let query = Parameter::builder("q", Location::Query, Schema::string())
            .build(&enforcer)
            .unwrap();
        assert_eq!(query.style(), Some(Style::Form));
        assert_eq!(query.explode(), Some(true));

        let header = Parameter::builder("X-Id", Location::Header, Schema::string())
            .build(&enforcer)
            .unwrap();
        assert_eq!(header.style(), Some(Style::Simple));
        assert_eq!(header.explode(), Some(false));
        assert_eq!(header.collection_format(), None);
    }

    #[test]
    fn test_v2_defaults() {
        let enforcer = Enforcer::new(Version::V2);
        let ids = Parameter::builder("ids", Location::Query, Schema::array(Schema::integer()))
            .build(&enforcer)
            .unwrap();
        assert_eq!(ids.collection_format(), Some(CollectionFormat::Csv));
        assert_eq!(ids.style(), None);
    }

    #[test]
    fn test_shape_follows_references_and_all_of() {
        let enforcer = Enforcer::new(Version::V3);
        enforcer
            .definitions()
            .register("Point", Schema::object().field("x", Schema::integer()))
            .unwrap();

        let schema: Arc<Schema> = Schema::all_of([Schema::reference("Point")]).into();
        assert_eq!(shape_of(&enforcer, &schema), Ok(Shape::Object));
        assert_eq!(property_names(&enforcer, &schema), vec!["x".to_string()]);

        let missing = Arc::new(Schema::reference("Nope"));
        let err = Parameter::builder("p", Location::Query, missing)
            .build(&enforcer)
            .unwrap_err();
        assert_eq!(err, DefinitionError::UnresolvedReference("Nope".to_string()));
    }
}
