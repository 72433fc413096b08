//! String schemas.
//!
//! This module provides [`StringSchema`] for `type: string` nodes with
//! length, pattern and (for date formats) range constraints. Length and
//! pattern apply to plain strings; formats that decode to dates or bytes
//! read the same rules through [`StringRules`] accessors and apply them to
//! the decoded value.

use regex::Regex;

use crate::error::Exception;

use super::{Schema, SchemaBase, SchemaBuilder, SchemaKind};

/// A constraint applied to string values.
#[derive(Debug, Clone)]
enum StringConstraint {
    MinLength(usize),
    MaxLength(usize),
    Pattern { regex: Regex, source: String },
    Minimum { bound: String, exclusive: bool },
    Maximum { bound: String, exclusive: bool },
}

/// The constraints of a string node.
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    constraints: Vec<StringConstraint>,
}

impl StringRules {
    pub fn min_length(&self) -> Option<usize> {
        self.constraints.iter().find_map(|c| match c {
            StringConstraint::MinLength(n) => Some(*n),
            _ => None,
        })
    }

    pub fn max_length(&self) -> Option<usize> {
        self.constraints.iter().find_map(|c| match c {
            StringConstraint::MaxLength(n) => Some(*n),
            _ => None,
        })
    }

    /// The `pattern` source, if one is set.
    pub fn pattern(&self) -> Option<&str> {
        self.constraints.iter().find_map(|c| match c {
            StringConstraint::Pattern { source, .. } => Some(source.as_str()),
            _ => None,
        })
    }

    /// Lower bound literal for formats with an ordering (dates).
    pub fn minimum(&self) -> Option<(&str, bool)> {
        self.constraints.iter().find_map(|c| match c {
            StringConstraint::Minimum { bound, exclusive } => Some((bound.as_str(), *exclusive)),
            _ => None,
        })
    }

    /// Upper bound literal for formats with an ordering (dates).
    pub fn maximum(&self) -> Option<(&str, bool)> {
        self.constraints.iter().find_map(|c| match c {
            StringConstraint::Maximum { bound, exclusive } => Some((bound.as_str(), *exclusive)),
            _ => None,
        })
    }

    /// Checks a length against `minLength`/`maxLength`.
    ///
    /// `unit` names what is being counted in the message ("characters",
    /// "bytes").
    pub(crate) fn check_length(&self, length: usize, unit: &str, exception: &mut Exception) {
        if let Some(min) = self.min_length() {
            if length < min {
                exception.push(format!(
                    "Expected at least {} {}. Received {}",
                    min, unit, length
                ));
            }
        }
        if let Some(max) = self.max_length() {
            if length > max {
                exception.push(format!(
                    "Expected at most {} {}. Received {}",
                    max, unit, length
                ));
            }
        }
    }

    /// Checks a plain string against length and pattern constraints.
    pub(crate) fn check(&self, s: &str, exception: &mut Exception) {
        self.check_length(s.chars().count(), "characters", exception);
        for constraint in &self.constraints {
            if let StringConstraint::Pattern { regex, source } = constraint {
                if !regex.is_match(s) {
                    exception.push(format!(
                        "Value does not match the pattern {}. Received: {:?}",
                        source, s
                    ));
                }
            }
        }
    }
}

/// Builder for `type: string` nodes.
///
/// # Example
///
/// ```rust
/// use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
///
/// let schema = Schema::string()
///     .min_length(3)
///     .pattern("^[a-z]+$")
///     .unwrap()
///     .build();
/// let enforcer = Enforcer::new(Version::V3);
///
/// // Both the length and the pattern are reported
/// let exception = enforcer.validate(&schema, &Value::from("AB")).unwrap();
/// assert_eq!(exception.count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    base: SchemaBase,
    rules: StringRules,
}

impl StringSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum number of characters (bytes for `byte`/`binary`).
    pub fn min_length(mut self, min: usize) -> Self {
        self.rules.constraints.push(StringConstraint::MinLength(min));
        self
    }

    /// Maximum number of characters (bytes for `byte`/`binary`).
    pub fn max_length(mut self, max: usize) -> Self {
        self.rules.constraints.push(StringConstraint::MaxLength(max));
        self
    }

    /// Adds a regular expression the string must match.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error when `pattern` is not a valid
    /// expression.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        self.rules.constraints.push(StringConstraint::Pattern {
            regex,
            source: pattern.to_string(),
        });
        Ok(self)
    }

    /// Inclusive lower bound, written in the format's own syntax
    /// (`"2020-01-01"` for `format: date`).
    pub fn minimum(mut self, bound: impl Into<String>) -> Self {
        self.rules.constraints.push(StringConstraint::Minimum {
            bound: bound.into(),
            exclusive: false,
        });
        self
    }

    pub fn exclusive_minimum(mut self, bound: impl Into<String>) -> Self {
        self.rules.constraints.push(StringConstraint::Minimum {
            bound: bound.into(),
            exclusive: true,
        });
        self
    }

    /// Inclusive upper bound, written in the format's own syntax.
    pub fn maximum(mut self, bound: impl Into<String>) -> Self {
        self.rules.constraints.push(StringConstraint::Maximum {
            bound: bound.into(),
            exclusive: false,
        });
        self
    }

    pub fn exclusive_maximum(mut self, bound: impl Into<String>) -> Self {
        self.rules.constraints.push(StringConstraint::Maximum {
            bound: bound.into(),
            exclusive: true,
        });
        self
    }
}

impl SchemaBuilder for StringSchema {
    fn base_mut(&mut self) -> &mut SchemaBase {
        &mut self.base
    }

    fn build(self) -> Schema {
        Schema::from_parts(SchemaKind::String(self.rules), self.base)
    }
}
