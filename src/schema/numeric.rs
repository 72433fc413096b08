//! Integer and number schemas.
//!
//! This module provides [`NumericSchema`] for `type: integer` and
//! `type: number` nodes with range and `multipleOf` constraints. The type
//! check itself belongs to the format codec; the rules here run once the
//! value is known to be numeric.

use crate::error::Exception;

use super::{Schema, SchemaBase, SchemaBuilder, SchemaKind};

/// A constraint applied to numeric values.
#[derive(Debug, Clone, PartialEq)]
enum NumericConstraint {
    Minimum { value: f64, exclusive: bool },
    Maximum { value: f64, exclusive: bool },
    MultipleOf(f64),
}

/// The numeric constraints of an integer or number node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericRules {
    constraints: Vec<NumericConstraint>,
}

impl NumericRules {
    /// Returns the lower bound and whether it is exclusive.
    pub fn minimum(&self) -> Option<(f64, bool)> {
        self.constraints.iter().find_map(|c| match c {
            NumericConstraint::Minimum { value, exclusive } => Some((*value, *exclusive)),
            _ => None,
        })
    }

    /// Returns the upper bound and whether it is exclusive.
    pub fn maximum(&self) -> Option<(f64, bool)> {
        self.constraints.iter().find_map(|c| match c {
            NumericConstraint::Maximum { value, exclusive } => Some((*value, *exclusive)),
            _ => None,
        })
    }

    pub fn multiple_of(&self) -> Option<f64> {
        self.constraints.iter().find_map(|c| match c {
            NumericConstraint::MultipleOf(m) => Some(*m),
            _ => None,
        })
    }

    /// Checks every constraint and reports each violation.
    pub(crate) fn check(&self, n: f64, exception: &mut Exception) {
        for constraint in &self.constraints {
            match constraint {
                NumericConstraint::Minimum { value, exclusive } => {
                    if *exclusive && n <= *value {
                        exception.push(format!(
                            "Expected number to be greater than {}. Received: {}",
                            display_number(*value),
                            display_number(n)
                        ));
                    } else if !*exclusive && n < *value {
                        exception.push(format!(
                            "Expected number to be greater than or equal to {}. Received: {}",
                            display_number(*value),
                            display_number(n)
                        ));
                    }
                }
                NumericConstraint::Maximum { value, exclusive } => {
                    if *exclusive && n >= *value {
                        exception.push(format!(
                            "Expected number to be less than {}. Received: {}",
                            display_number(*value),
                            display_number(n)
                        ));
                    } else if !*exclusive && n > *value {
                        exception.push(format!(
                            "Expected number to be less than or equal to {}. Received: {}",
                            display_number(*value),
                            display_number(n)
                        ));
                    }
                }
                NumericConstraint::MultipleOf(m) => {
                    if *m > 0.0 && !is_multiple(n, *m) {
                        exception.push(format!(
                            "Expected a multiple of {}. Received: {}",
                            display_number(*m),
                            display_number(n)
                        ));
                    }
                }
            }
        }
    }
}

fn is_multiple(n: f64, m: f64) -> bool {
    let quotient = n / m;
    (quotient - quotient.round()).abs() < 1e-9
}

/// Formats a number without a trailing `.0` for integral values.
pub(crate) fn display_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Builder for `type: integer` and `type: number` nodes.
///
/// # Example
///
/// ```rust
/// use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
///
/// let schema = Schema::integer().minimum(1.0).exclusive_maximum(10.0).build();
/// let enforcer = Enforcer::new(Version::V3);
///
/// assert!(enforcer.validate(&schema, &Value::Integer(5)).is_none());
/// assert!(enforcer.validate(&schema, &Value::Integer(10)).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct NumericSchema {
    base: SchemaBase,
    integer: bool,
    rules: NumericRules,
}

impl NumericSchema {
    pub fn integer() -> Self {
        Self {
            base: SchemaBase::default(),
            integer: true,
            rules: NumericRules::default(),
        }
    }

    pub fn number() -> Self {
        Self {
            base: SchemaBase::default(),
            integer: false,
            rules: NumericRules::default(),
        }
    }

    /// Inclusive lower bound.
    pub fn minimum(mut self, value: f64) -> Self {
        self.rules.constraints.push(NumericConstraint::Minimum {
            value,
            exclusive: false,
        });
        self
    }

    /// Exclusive lower bound.
    pub fn exclusive_minimum(mut self, value: f64) -> Self {
        self.rules.constraints.push(NumericConstraint::Minimum {
            value,
            exclusive: true,
        });
        self
    }

    /// Inclusive upper bound.
    pub fn maximum(mut self, value: f64) -> Self {
        self.rules.constraints.push(NumericConstraint::Maximum {
            value,
            exclusive: false,
        });
        self
    }

    /// Exclusive upper bound.
    pub fn exclusive_maximum(mut self, value: f64) -> Self {
        self.rules.constraints.push(NumericConstraint::Maximum {
            value,
            exclusive: true,
        });
        self
    }

    pub fn multiple_of(mut self, value: f64) -> Self {
        self.rules.constraints.push(NumericConstraint::MultipleOf(value));
        self
    }
}

impl SchemaBuilder for NumericSchema {
    fn base_mut(&mut self) -> &mut SchemaBase {
        &mut self.base
    }

    fn build(self) -> Schema {
        let kind = if self.integer {
            SchemaKind::Integer(self.rules)
        } else {
            SchemaKind::Number(self.rules)
        };
        Schema::from_parts(kind, self.base)
    }
}
