//! Parameter encodings and their structural decomposition.
//!
//! Decomposition turns the raw text of a parameter into a [`Raw`] shape
//! (a scalar, a list or key/value pairs) of undecoded strings. Typing the
//! leaves is a separate step.

use std::fmt::{self, Display};

use super::query::QueryMap;

/// OpenAPI 3 `style`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Simple,
    Label,
    Matrix,
    Form,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Style::Simple => "simple",
            Style::Label => "label",
            Style::Matrix => "matrix",
            Style::Form => "form",
            Style::SpaceDelimited => "spaceDelimited",
            Style::PipeDelimited => "pipeDelimited",
            Style::DeepObject => "deepObject",
        };
        f.write_str(name)
    }
}

/// Swagger 2 `collectionFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionFormat {
    #[default]
    Csv,
    Ssv,
    Tsv,
    Pipes,
    Multi,
}

impl CollectionFormat {
    /// The item separator, or `None` for `multi`.
    pub fn delimiter(&self) -> Option<char> {
        match self {
            CollectionFormat::Csv => Some(','),
            CollectionFormat::Ssv => Some(' '),
            CollectionFormat::Tsv => Some('\t'),
            CollectionFormat::Pipes => Some('|'),
            CollectionFormat::Multi => None,
        }
    }
}

impl Display for CollectionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionFormat::Csv => "csv",
            CollectionFormat::Ssv => "ssv",
            CollectionFormat::Tsv => "tsv",
            CollectionFormat::Pipes => "pipes",
            CollectionFormat::Multi => "multi",
        };
        f.write_str(name)
    }
}

/// The structural type of a parameter's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Primitive,
    Array,
    Object,
}

/// A decomposed parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Raw {
    Scalar(String),
    List(Vec<String>),
    Pairs(Vec<(String, String)>),
}

impl Raw {
    /// Applies `f` to every leaf and key.
    pub(crate) fn map_leaves(self, f: impl Fn(&str) -> String) -> Raw {
        match self {
            Raw::Scalar(s) => Raw::Scalar(f(&s)),
            Raw::List(items) => Raw::List(items.iter().map(|s| f(s)).collect()),
            Raw::Pairs(pairs) => Raw::Pairs(pairs.iter().map(|(k, v)| (f(k), f(v))).collect()),
        }
    }
}

/// The value does not follow its style's syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Malformed;

pub(crate) const NOT_FORMATTED: &str = "The value is not formatted properly";

fn split(text: &str, delimiter: char) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(delimiter).map(str::to_string).collect()
}

/// `k1,v1,k2,v2` into pairs.
fn flat_pairs(text: &str, delimiter: char) -> Result<Vec<(String, String)>, Malformed> {
    let parts = split(text, delimiter);
    if parts.len() % 2 != 0 {
        return Err(Malformed);
    }
    Ok(parts
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

/// `k1=v1,k2=v2` into pairs.
fn assigned_pairs(text: &str, delimiter: char) -> Result<Vec<(String, String)>, Malformed> {
    split(text, delimiter)
        .iter()
        .map(|part| {
            part.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or(Malformed)
        })
        .collect()
}

fn by_shape(
    text: &str,
    shape: Shape,
    explode: bool,
    delimiter: char,
    exploded_delimiter: char,
) -> Result<Raw, Malformed> {
    let delimiter = if explode { exploded_delimiter } else { delimiter };
    Ok(match shape {
        Shape::Primitive => Raw::Scalar(text.to_string()),
        Shape::Array => Raw::List(split(text, delimiter)),
        Shape::Object if explode => Raw::Pairs(assigned_pairs(text, delimiter)?),
        Shape::Object => Raw::Pairs(flat_pairs(text, delimiter)?),
    })
}

/// Decomposes a path or header value.
pub(crate) fn split_text(
    style: Style,
    explode: bool,
    shape: Shape,
    name: &str,
    text: &str,
) -> Result<Raw, Malformed> {
    match style {
        Style::Label => {
            let rest = text.strip_prefix('.').ok_or(Malformed)?;
            by_shape(rest, shape, explode, ',', '.')
        }
        Style::Matrix => split_matrix(explode, shape, name, text),
        _ => by_shape(text, shape, explode, ',', ','),
    }
}

fn split_matrix(explode: bool, shape: Shape, name: &str, text: &str) -> Result<Raw, Malformed> {
    let rest = text.strip_prefix(';').ok_or(Malformed)?;

    if explode && shape != Shape::Primitive {
        let assignments = assigned_pairs(rest, ';')?;
        return Ok(match shape {
            Shape::Array => {
                if assignments.iter().any(|(key, _)| key != name) {
                    return Err(Malformed);
                }
                Raw::List(assignments.into_iter().map(|(_, value)| value).collect())
            }
            _ => Raw::Pairs(assignments),
        });
    }

    let value = match rest.split_once('=') {
        Some((key, value)) if key == name => value,
        None if rest == name => "",
        _ => return Err(Malformed),
    };
    by_shape(value, shape, false, ',', ',')
}

/// Picks a query or cookie parameter out of the split map. Returns `None`
/// when the parameter is absent.
///
/// `properties` are the declared property names of an object schema; an
/// exploded `form` object is assembled from those keys.
pub(crate) fn split_map(
    style: Style,
    explode: bool,
    shape: Shape,
    name: &str,
    map: &QueryMap,
    properties: &[String],
) -> Result<Option<Raw>, Malformed> {
    if style == Style::DeepObject {
        let prefix = format!("{}[", name);
        let pairs: Vec<(String, String)> = map
            .iter()
            .filter_map(|(key, values)| {
                let property = key.strip_prefix(&prefix)?.strip_suffix(']')?;
                Some((property.to_string(), values.first().cloned().unwrap_or_default()))
            })
            .collect();
        return Ok((!pairs.is_empty()).then_some(Raw::Pairs(pairs)));
    }

    if explode && shape == Shape::Object {
        let pairs: Vec<(String, String)> = properties
            .iter()
            .filter_map(|property| {
                let value = map.get(property)?.first()?;
                Some((property.clone(), value.clone()))
            })
            .collect();
        return Ok((!pairs.is_empty()).then_some(Raw::Pairs(pairs)));
    }

    let Some(values) = map.get(name) else {
        return Ok(None);
    };

    if explode && shape == Shape::Array {
        return Ok(Some(Raw::List(values.clone())));
    }

    let first = values.first().map(String::as_str).unwrap_or_default();
    let delimiter = match style {
        Style::SpaceDelimited => ' ',
        Style::PipeDelimited => '|',
        _ => ',',
    };
    by_shape(first, shape, false, delimiter, delimiter).map(Some)
}

/// Decomposes a Swagger 2 value. `values` holds every occurrence of the
/// parameter; only `multi` reads more than the first.
pub(crate) fn split_collection(format: CollectionFormat, shape: Shape, values: &[String]) -> Raw {
    let first = values.first().map(String::as_str).unwrap_or_default();
    match (shape, format.delimiter()) {
        (Shape::Array, Some(delimiter)) => Raw::List(split(first, delimiter)),
        (Shape::Array, None) => Raw::List(values.to_vec()),
        _ => Raw::Scalar(first.to_string()),
    }
}
