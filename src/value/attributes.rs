//! Per-value processing attributes.
//!
//! Before the engine touches a value it asks what may be done with it. The
//! empty-parameter marker passes through every operation untouched, and
//! coercion only ever applies to scalars.

use super::Value;

/// What the engine may do with one input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueAttributes {
    /// Loosely typed input may be forced into the schema's type.
    pub coerce: bool,
    /// The value takes part in serialize and deserialize.
    pub serialize: bool,
    /// The value takes part in validation.
    pub validate: bool,
}

impl ValueAttributes {
    /// Resolves the attributes for `value` given the caller's coercion flag.
    pub fn resolve(value: &Value, coerce: bool) -> Self {
        match value {
            Value::Empty => Self {
                coerce: false,
                serialize: false,
                validate: false,
            },
            Value::Array(_) | Value::Object(_) | Value::Null => Self {
                coerce: false,
                serialize: true,
                validate: true,
            },
            _ => Self {
                coerce,
                serialize: true,
                validate: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_marker_is_left_alone() {
        let attributes = ValueAttributes::resolve(&Value::Empty, true);
        assert!(!attributes.serialize);
        assert!(!attributes.validate);
        assert!(!attributes.coerce);
    }

    #[test]
    fn test_coercion_applies_to_scalars_only() {
        assert!(ValueAttributes::resolve(&Value::from("1"), true).coerce);
        assert!(!ValueAttributes::resolve(&Value::from("1"), false).coerce);
        assert!(!ValueAttributes::resolve(&Value::array(Vec::new()), true).coerce);
    }
}
