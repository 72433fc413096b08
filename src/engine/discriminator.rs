//! Discriminator resolution.

use std::sync::Arc;

use tracing::trace;

use crate::config::Version;
use crate::schema::{Discriminator, Schema};
use crate::value::Value;

use super::Enforcer;

/// The outcome of [`Enforcer::discriminator`].
///
/// `key` is the value of the discriminator property, or `None` when the
/// property is absent. `schema` is the definition the key selects, or
/// `None` when it selects nothing.
#[derive(Debug, Clone)]
pub struct Discriminated {
    pub key: Option<String>,
    pub schema: Option<Arc<Schema>>,
}

/// How a value's discriminator property resolved.
pub(crate) enum Selection {
    /// The value has no discriminator property.
    Missing,
    /// The property value selects no schema.
    Unmapped(String),
    Mapped(String, Arc<Schema>),
}

impl Selection {
    pub(crate) fn unmapped_message(discriminator: &Discriminator, key: &str) -> String {
        format!(
            "Discriminator property \"{}\" value \"{}\" mapped to no schema",
            discriminator.property_name(),
            key
        )
    }

    pub(crate) fn missing_message(discriminator: &Discriminator) -> String {
        format!(
            "Missing required discriminator property \"{}\"",
            discriminator.property_name()
        )
    }
}

impl Enforcer {
    /// Selects the schema a value's discriminator property names.
    ///
    /// v3 consults the explicit mapping first and falls back to the
    /// definition of the same name only for keys the mapping does not list.
    /// A mapped key whose target is not defined selects nothing. v2 only has
    /// the name lookup.
    pub(crate) fn select(&self, discriminator: &Discriminator, value: &Value) -> Selection {
        let key = match value.get(discriminator.property_name()) {
            None | Some(Value::Null) => return Selection::Missing,
            Some(Value::String(s)) => s,
            Some(other) => other.describe(),
        };

        let mapped = match self.version() {
            Version::V3 => match discriminator.target(&key) {
                Some(name) => self.definitions().get(name),
                None => self.definitions().get(&key),
            },
            Version::V2 => self.definitions().get(&key),
        };

        match mapped {
            Some(schema) => {
                trace!(
                    property = discriminator.property_name(),
                    key = %key,
                    "discriminator selected a schema"
                );
                Selection::Mapped(key, schema)
            }
            None => {
                trace!(
                    property = discriminator.property_name(),
                    key = %key,
                    "discriminator selected no schema"
                );
                Selection::Unmapped(key)
            }
        }
    }
}
