//! Array schemas.
//!
//! This module provides [`ArraySchema`] for `type: array` nodes with an item
//! schema, item count bounds and value-based uniqueness.

use std::sync::Arc;

use crate::error::Exception;
use crate::value::Value;

use super::{Schema, SchemaBase, SchemaBuilder, SchemaKind};

/// A constraint applied to array values.
#[derive(Debug, Clone, PartialEq)]
enum ArrayConstraint {
    MinItems(usize),
    MaxItems(usize),
    UniqueItems,
}

/// The item schema and constraints of an array node.
#[derive(Debug, Clone, Default)]
pub struct ArrayRules {
    items: Option<Arc<Schema>>,
    constraints: Vec<ArrayConstraint>,
}

impl ArrayRules {
    /// The schema every item must satisfy, if declared.
    pub fn items(&self) -> Option<&Arc<Schema>> {
        self.items.as_ref()
    }

    pub fn min_items(&self) -> Option<usize> {
        self.constraints.iter().find_map(|c| match c {
            ArrayConstraint::MinItems(n) => Some(*n),
            _ => None,
        })
    }

    pub fn max_items(&self) -> Option<usize> {
        self.constraints.iter().find_map(|c| match c {
            ArrayConstraint::MaxItems(n) => Some(*n),
            _ => None,
        })
    }

    pub fn unique_items(&self) -> bool {
        self.constraints.contains(&ArrayConstraint::UniqueItems)
    }

    /// Checks item count and uniqueness; items themselves are checked by
    /// the caller against [`ArrayRules::items`].
    pub(crate) fn check(&self, items: &[Value], exception: &mut Exception) {
        for constraint in &self.constraints {
            match constraint {
                ArrayConstraint::MinItems(min) if items.len() < *min => {
                    exception.push(format!(
                        "Too few items in the array. Expected at least {}. Received {}",
                        min,
                        items.len()
                    ));
                }
                ArrayConstraint::MaxItems(max) if items.len() > *max => {
                    exception.push(format!(
                        "Too many items in the array. Expected at most {}. Received {}",
                        max,
                        items.len()
                    ));
                }
                ArrayConstraint::UniqueItems => {
                    let duplicates = find_duplicates(items);
                    if !duplicates.is_empty() {
                        let indexes: Vec<String> =
                            duplicates.iter().map(ToString::to_string).collect();
                        exception.push(format!(
                            "Array items must be unique. Duplicates found at indexes: {}",
                            indexes.join(", ")
                        ));
                    }
                }
                _ => {}
            }
        }
    }
}

/// Indexes of items that deep-equal an earlier item.
fn find_duplicates(items: &[Value]) -> Vec<usize> {
    let mut duplicates = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if items[..i].iter().any(|earlier| earlier.deep_equal(item)) {
            duplicates.push(i);
        }
    }
    duplicates
}

/// Builder for `type: array` nodes.
///
/// # Example
///
/// ```rust
/// use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
/// use serde_json::json;
///
/// let schema = Schema::array(Schema::integer()).max_items(3).unique_items().build();
/// let enforcer = Enforcer::new(Version::V3);
///
/// assert!(enforcer.validate(&schema, &Value::from(json!([1, 2, 3]))).is_none());
/// assert!(enforcer.validate(&schema, &Value::from(json!([1, 2, 1]))).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArraySchema {
    base: SchemaBase,
    rules: ArrayRules,
}

impl ArraySchema {
    /// An array schema without an item schema: any items are accepted.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(mut self, items: impl Into<Arc<Schema>>) -> Self {
        self.rules.items = Some(items.into());
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.rules.constraints.push(ArrayConstraint::MinItems(min));
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.rules.constraints.push(ArrayConstraint::MaxItems(max));
        self
    }

    /// Requires items to be pairwise unequal by value.
    pub fn unique_items(mut self) -> Self {
        self.rules.constraints.push(ArrayConstraint::UniqueItems);
        self
    }
}

impl SchemaBuilder for ArraySchema {
    fn base_mut(&mut self) -> &mut SchemaBase {
        &mut self.base
    }

    fn build(self) -> Schema {
        Schema::from_parts(SchemaKind::Array(self.rules), self.base)
    }
}
