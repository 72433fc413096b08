//! Recursive validation.

use tracing::trace;

use crate::error::Exception;
use crate::schema::{AdditionalProperties, ArrayRules, Composition, ObjectRules, Schema, SchemaKind};
use crate::value::{Value, ValueAttributes};

use super::context::{CallContext, Entry};
use super::discriminator::Selection;
use super::primitive;

/// Validates `value` against `schema`, reporting every problem found.
pub(crate) fn validate_node(
    ctx: &mut CallContext<'_>,
    schema: &Schema,
    value: &Value,
    exception: &mut Exception,
) {
    if !ValueAttributes::resolve(value, false).validate {
        return;
    }

    if let SchemaKind::Ref(name) = schema.kind() {
        match ctx.follow(name) {
            Ok(target) => {
                validate_node(ctx, &target, value, exception);
                ctx.unfollow();
            }
            Err(failure) => {
                exception.push(failure.message());
            }
        }
        return;
    }

    if value.is_null() {
        if !schema.is_nullable() && !matches!(schema.kind(), SchemaKind::Any) {
            exception.push("Null value is not allowed");
        }
        return;
    }

    let resumed = match ctx.enter(schema, value) {
        Entry::Done(_) => {
            trace!(value = value.type_name(), "value already validated against schema");
            return;
        }
        Entry::Resume => true,
        Entry::Fresh => false,
    };

    match schema.kind() {
        SchemaKind::Any | SchemaKind::Ref(_) => {}
        SchemaKind::Boolean
        | SchemaKind::Integer(_)
        | SchemaKind::Number(_)
        | SchemaKind::String(_) => primitive::validate(ctx, schema, value, exception),
        SchemaKind::Array(rules) => validate_array(ctx, rules, value, exception),
        SchemaKind::Object(rules) => {
            validate_object(ctx, schema, rules, value, exception, resumed)
        }
        SchemaKind::AllOf(schemas) => {
            let failures = exception.nest("Did not validate against all schemas");
            for (index, branch) in schemas.iter().enumerate() {
                validate_node(ctx, branch, value, failures.at(index));
            }
        }
        SchemaKind::AnyOf(composition) => validate_any_of(ctx, composition, value, exception),
        SchemaKind::OneOf(composition) => validate_one_of(ctx, composition, value, exception),
        SchemaKind::Not(inner) => {
            let mark = ctx.mark();
            let mut inner_exception = Exception::default();
            validate_node(ctx, inner, value, &mut inner_exception);
            let _ = ctx.rollback(mark);
            if !inner_exception.has_exception() {
                exception.push("Value should not validate against the schema");
            }
        }
    }

    if let Some(members) = schema.enumeration() {
        if !members
            .iter()
            .any(|member| primitive::is_member(ctx, schema, member, value))
        {
            let allowed: Vec<String> = members.iter().map(Value::describe).collect();
            exception.push(format!(
                "Value must be one of the enumerated values: {}. Received: {}",
                allowed.join(", "),
                value.describe()
            ));
        }
    }
}

fn validate_array(
    ctx: &mut CallContext<'_>,
    rules: &ArrayRules,
    value: &Value,
    exception: &mut Exception,
) {
    let Some(items) = value.items() else {
        exception.push(format!("Expected an array. Received: {}", value.describe()));
        return;
    };
    if let Some(item_schema) = rules.items() {
        for (index, item) in items.iter().enumerate() {
            ctx.descend(|ctx| validate_node(ctx, item_schema, item, exception.at(index)));
        }
    }
    rules.check(&items, exception);
}

fn validate_object(
    ctx: &mut CallContext<'_>,
    schema: &Schema,
    rules: &ObjectRules,
    value: &Value,
    exception: &mut Exception,
    resumed: bool,
) {
    let Some(entries) = value.entries() else {
        exception.push(format!("Expected an object. Received: {}", value.describe()));
        return;
    };

    if !resumed {
        if let Some(discriminator) = rules.discriminator() {
            match ctx.enforcer().select(discriminator, value) {
                Selection::Unmapped(key) => {
                    exception.push(Selection::unmapped_message(discriminator, &key));
                    return;
                }
                // A target already on the way here reached this base through
                // its own composition; process the base itself.
                Selection::Mapped(_, target) if !ctx.visited(&target, value) => {
                    ctx.mark_dispatching(schema, value);
                    validate_node(ctx, &target, value, exception);
                    return;
                }
                Selection::Missing | Selection::Mapped(..) => {}
            }
        }
    }

    let mut not_allowed = Vec::new();
    for (key, item) in &entries {
        match rules.property(key) {
            Some(property) => {
                ctx.descend(|ctx| validate_node(ctx, property, item, exception.at(key.as_str())))
            }
            None => match rules.additional_properties() {
                AdditionalProperties::Allow => {}
                AdditionalProperties::Deny => not_allowed.push(key.as_str()),
                AdditionalProperties::Validate(additional) => ctx.descend(|ctx| {
                    validate_node(ctx, additional, item, exception.at(key.as_str()))
                }),
            },
        }
    }
    if !not_allowed.is_empty() {
        exception.push(format!("Properties not allowed: {}", not_allowed.join(", ")));
    }

    rules.check(entries.iter().map(|(key, _)| key), exception);
}

/// Validates against the branch a discriminator selects. Returns false when
/// the composition has no discriminator.
fn validate_discriminated(
    ctx: &mut CallContext<'_>,
    composition: &Composition,
    value: &Value,
    exception: &mut Exception,
) -> bool {
    let Some(discriminator) = composition.discriminator() else {
        return false;
    };
    match ctx.enforcer().select(discriminator, value) {
        Selection::Missing => {
            exception.push(Selection::missing_message(discriminator));
        }
        Selection::Unmapped(key) => {
            exception.push(Selection::unmapped_message(discriminator, &key));
        }
        Selection::Mapped(_, target) => validate_node(ctx, &target, value, exception),
    }
    true
}

fn validate_any_of(
    ctx: &mut CallContext<'_>,
    composition: &Composition,
    value: &Value,
    exception: &mut Exception,
) {
    if validate_discriminated(ctx, composition, value, exception) {
        return;
    }

    let mut failures = Exception::new("Did not validate against any schemas");
    for (index, branch) in composition.schemas().iter().enumerate() {
        let mark = ctx.mark();
        let mut branch_exception = Exception::default();
        validate_node(ctx, branch, value, &mut branch_exception);
        if !branch_exception.has_exception() {
            trace!(branch = index, "anyOf branch matched");
            ctx.commit(mark);
            return;
        }
        let _ = ctx.rollback(mark);
        failures.at(index).merge(branch_exception);
    }
    exception.push_tree(failures);
}

fn validate_one_of(
    ctx: &mut CallContext<'_>,
    composition: &Composition,
    value: &Value,
    exception: &mut Exception,
) {
    if validate_discriminated(ctx, composition, value, exception) {
        return;
    }

    let mut failures = Exception::new("Did not validate against exactly one schema");
    let mut matched = Vec::new();
    for (index, branch) in composition.schemas().iter().enumerate() {
        let mark = ctx.mark();
        let mut branch_exception = Exception::default();
        validate_node(ctx, branch, value, &mut branch_exception);
        let _ = ctx.rollback(mark);
        if branch_exception.has_exception() {
            failures.at(index).merge(branch_exception);
        } else {
            matched.push(index);
        }
    }
    trace!(matched = matched.len(), "oneOf branches evaluated");

    match matched.len() {
        1 => {}
        0 => {
            exception.push_tree(failures);
        }
        n => {
            let indexes: Vec<String> = matched.iter().map(ToString::to_string).collect();
            exception.push(format!(
                "Value matched {} schemas (indexes {}). Expected exactly one",
                n,
                indexes.join(", ")
            ));
        }
    }
}
