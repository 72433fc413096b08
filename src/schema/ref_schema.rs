//! Named schema references.
//!
//! [`Schema::reference`](super::Schema::reference) nodes name a definition
//! held by a [`SchemaRegistry`]. Recursive and sibling definitions are
//! expressed this way instead of through cyclic `Arc`s.

use std::sync::Arc;

use crate::registry::SchemaRegistry;

use super::{Schema, SchemaKind};

/// The definition name a reference target points at.
///
/// Accepts plain names and JSON pointers (`#/components/schemas/Dog`,
/// `#/definitions/Dog`); the last pointer segment is the name.
pub(crate) fn definition_name(target: &str) -> &str {
    target.rsplit('/').next().unwrap_or(target)
}

/// Why a reference chain could not be followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RefFailure {
    Unresolved(String),
    TooDeep(usize),
}

impl RefFailure {
    pub(crate) fn message(&self) -> String {
        match self {
            RefFailure::Unresolved(name) => format!("Unresolved schema reference \"{}\"", name),
            RefFailure::TooDeep(max) => format!("maximum schema depth of {} exceeded", max),
        }
    }
}

/// Follows reference nodes until a concrete schema is reached.
///
/// Non-reference schemas are returned as they are. At most `max_depth`
/// references are followed.
pub(crate) fn resolve_chain(
    registry: &SchemaRegistry,
    schema: &Arc<Schema>,
    max_depth: usize,
) -> Result<Arc<Schema>, RefFailure> {
    let mut current = Arc::clone(schema);
    let mut hops = 0;
    while let SchemaKind::Ref(name) = current.kind() {
        if hops >= max_depth {
            return Err(RefFailure::TooDeep(max_depth));
        }
        let next = registry
            .get(definition_name(name))
            .ok_or_else(|| RefFailure::Unresolved(name.clone()))?;
        current = next;
        hops += 1;
    }
    Ok(current)
}
