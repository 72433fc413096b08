//! Recursive serialize and deserialize.
//!
//! Both directions walk the schema the same way; only primitive nodes
//! differ, and they defer to their format codec. Container values get an
//! empty output container registered before their children are processed,
//! so a cyclic input produces an output with the same cycle.

use tracing::trace;

use crate::error::Exception;
use crate::schema::{AdditionalProperties, ArrayRules, Composition, ObjectRules, Schema, SchemaKind};
use crate::value::{Value, ValueAttributes};

use super::context::{CallContext, Entry, Operation};
use super::discriminator::Selection;
use super::primitive;

/// Converts `value` according to `schema`. Returns `None` when the value
/// cannot be converted; the reason is on `exception`.
pub(crate) fn transform_node(
    ctx: &mut CallContext<'_>,
    schema: &Schema,
    value: &Value,
    exception: &mut Exception,
) -> Option<Value> {
    if !ValueAttributes::resolve(value, ctx.coerce()).serialize {
        return Some(value.clone());
    }

    if let SchemaKind::Ref(name) = schema.kind() {
        return match ctx.follow(name) {
            Ok(target) => {
                let output = transform_node(ctx, &target, value, exception);
                ctx.unfollow();
                output
            }
            Err(failure) => {
                exception.push(failure.message());
                None
            }
        };
    }

    if value.is_null() {
        if schema.is_nullable() || matches!(schema.kind(), SchemaKind::Any) {
            return Some(Value::Null);
        }
        exception.push("Null value is not allowed");
        return None;
    }

    let resumed = match ctx.enter(schema, value) {
        Entry::Done(output) => {
            trace!(value = value.type_name(), "reusing output for a repeated value");
            return Some(output.unwrap_or_else(|| value.clone()));
        }
        Entry::Resume => true,
        Entry::Fresh => false,
    };

    let slot = if resumed { None } else { value.empty_like() };
    if let Some(slot) = &slot {
        ctx.set_output(schema, value, slot.clone());
    }

    let output = match schema.kind() {
        SchemaKind::Any | SchemaKind::Ref(_) | SchemaKind::Not(_) => Some(value.clone()),
        SchemaKind::Boolean
        | SchemaKind::Integer(_)
        | SchemaKind::Number(_)
        | SchemaKind::String(_) => primitive::transform(ctx, schema, value, exception),
        SchemaKind::Array(rules) => transform_array(ctx, rules, value, exception),
        SchemaKind::Object(rules) => {
            transform_object(ctx, schema, rules, value, exception, resumed)
        }
        SchemaKind::AllOf(schemas) => transform_all_of(ctx, schemas, value, exception),
        SchemaKind::AnyOf(composition) => transform_any_of(ctx, composition, value, exception),
        SchemaKind::OneOf(composition) => transform_one_of(ctx, composition, value, exception),
    }?;

    match slot {
        Some(slot) if same_container(&slot, &output) => {
            slot.replace_contents(&output);
            Some(slot)
        }
        _ => {
            if !resumed {
                ctx.set_output(schema, value, output.clone());
            }
            Some(output)
        }
    }
}

fn same_container(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_))
    )
}

fn transform_array(
    ctx: &mut CallContext<'_>,
    rules: &ArrayRules,
    value: &Value,
    exception: &mut Exception,
) -> Option<Value> {
    let Some(items) = value.items() else {
        exception.push(format!("Expected an array. Received: {}", value.describe()));
        return None;
    };
    let Some(item_schema) = rules.items() else {
        return Some(Value::array(items));
    };

    let mut output = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let converted =
            ctx.descend(|ctx| transform_node(ctx, item_schema, item, exception.at(index)));
        if let Some(converted) = converted {
            output.push(converted);
        }
    }
    Some(Value::array(output))
}

fn transform_object(
    ctx: &mut CallContext<'_>,
    schema: &Schema,
    rules: &ObjectRules,
    value: &Value,
    exception: &mut Exception,
    resumed: bool,
) -> Option<Value> {
    let Some(entries) = value.entries() else {
        exception.push(format!("Expected an object. Received: {}", value.describe()));
        return None;
    };

    if !resumed {
        if let Some(discriminator) = rules.discriminator() {
            match ctx.enforcer().select(discriminator, value) {
                Selection::Unmapped(key) => {
                    exception.push(Selection::unmapped_message(discriminator, &key));
                    return None;
                }
                Selection::Mapped(_, target) if !ctx.visited(&target, value) => {
                    ctx.mark_dispatching(schema, value);
                    return transform_node(ctx, &target, value, exception);
                }
                Selection::Missing | Selection::Mapped(..) => {}
            }
        }
    }

    let output = Value::object(Vec::<(String, Value)>::new());
    let mut not_allowed = Vec::new();
    for (key, item) in &entries {
        let converted = match rules.property(key) {
            Some(property) => {
                ctx.descend(|ctx| transform_node(ctx, property, item, exception.at(key.as_str())))
            }
            None => match rules.additional_properties() {
                AdditionalProperties::Allow => Some(item.clone()),
                AdditionalProperties::Deny => {
                    not_allowed.push(key.as_str());
                    None
                }
                AdditionalProperties::Validate(additional) => ctx.descend(|ctx| {
                    transform_node(ctx, additional, item, exception.at(key.as_str()))
                }),
            },
        };
        if let Some(converted) = converted {
            output.insert(key.clone(), converted);
        }
    }
    if !not_allowed.is_empty() {
        exception.push(format!("Properties not allowed: {}", not_allowed.join(", ")));
    }
    Some(output)
}

/// Runs every branch against the same value. Object results are merged in
/// order; a later branch only overwrites a key when it actually converted
/// it, so a branch passing a property through unchanged does not undo an
/// earlier branch's conversion.
fn transform_all_of(
    ctx: &mut CallContext<'_>,
    schemas: &[std::sync::Arc<Schema>],
    value: &Value,
    exception: &mut Exception,
) -> Option<Value> {
    let failures = exception.nest("Did not validate against all schemas");
    let mut outputs = Vec::with_capacity(schemas.len());
    for (index, branch) in schemas.iter().enumerate() {
        if let Some(output) = transform_node(ctx, branch, value, failures.at(index)) {
            outputs.push(output);
        }
    }

    if let Value::Object(_) = value {
        let merged = Value::object(Vec::<(String, Value)>::new());
        for output in &outputs {
            for (key, converted) in output.entries().unwrap_or_default() {
                let unchanged = value
                    .get(&key)
                    .is_some_and(|raw| raw.deep_equal(&converted));
                if unchanged && merged.get(&key).is_some() {
                    continue;
                }
                merged.insert(key, converted);
            }
        }
        return Some(merged);
    }

    let mut result = value.clone();
    for output in outputs {
        if !output.deep_equal(value) {
            result = output;
        }
    }
    Some(result)
}

/// Checks a branch result the way the caller will see it: the typed input
/// for serialize, the converted output for deserialize. Coerced serialize
/// input is loosely typed by definition and is not rechecked.
fn revalidates(ctx: &CallContext<'_>, branch: &Schema, input: &Value, output: &Value) -> bool {
    let subject = match ctx.operation() {
        Operation::Serialize if ctx.coerce() => return true,
        Operation::Serialize => input,
        Operation::Deserialize | Operation::Validate => output,
    };
    ctx.enforcer().validate(branch, subject).is_none()
}

fn transform_discriminated(
    ctx: &mut CallContext<'_>,
    composition: &Composition,
    value: &Value,
    exception: &mut Exception,
) -> Option<Option<Value>> {
    let discriminator = composition.discriminator()?;
    let output = match ctx.enforcer().select(discriminator, value) {
        Selection::Missing => {
            exception.push(Selection::missing_message(discriminator));
            None
        }
        Selection::Unmapped(key) => {
            exception.push(Selection::unmapped_message(discriminator, &key));
            None
        }
        Selection::Mapped(_, target) => transform_node(ctx, &target, value, exception),
    };
    Some(output)
}

fn transform_any_of(
    ctx: &mut CallContext<'_>,
    composition: &Composition,
    value: &Value,
    exception: &mut Exception,
) -> Option<Value> {
    if let Some(output) = transform_discriminated(ctx, composition, value, exception) {
        return output;
    }

    let mut failures = Exception::new("Did not validate against any schemas");
    for (index, branch) in composition.schemas().iter().enumerate() {
        let mark = ctx.mark();
        let mut branch_exception = Exception::default();
        let output = transform_node(ctx, branch, value, &mut branch_exception);
        if let Some(output) = output.filter(|_| !branch_exception.has_exception()) {
            if revalidates(ctx, branch, value, &output) {
                trace!(branch = index, "anyOf branch matched");
                ctx.commit(mark);
                return Some(output);
            }
            branch_exception.push("Converted value does not validate against the schema");
        }
        let _ = ctx.rollback(mark);
        failures.at(index).merge(branch_exception);
    }
    exception.push_tree(failures);
    None
}

fn transform_one_of(
    ctx: &mut CallContext<'_>,
    composition: &Composition,
    value: &Value,
    exception: &mut Exception,
) -> Option<Value> {
    if let Some(output) = transform_discriminated(ctx, composition, value, exception) {
        return output;
    }

    let mut failures = Exception::new("Did not validate against exactly one schema");
    let mut matched = Vec::new();
    for (index, branch) in composition.schemas().iter().enumerate() {
        let mark = ctx.mark();
        let mut branch_exception = Exception::default();
        let output = transform_node(ctx, branch, value, &mut branch_exception)
            .filter(|_| !branch_exception.has_exception());
        let valid = output
            .as_ref()
            .is_some_and(|output| revalidates(ctx, branch, value, output));
        // Every branch starts from the same visits; the one that matched is
        // reinstated below.
        let visits = ctx.rollback(mark);
        match output {
            Some(output) if valid => matched.push((index, output, visits)),
            Some(_) => {
                branch_exception.push("Converted value does not validate against the schema");
                failures.at(index).merge(branch_exception);
            }
            None => {
                failures.at(index).merge(branch_exception);
            }
        }
    }
    trace!(matched = matched.len(), "oneOf branches evaluated");

    if matched.len() > 1 {
        let indexes: Vec<String> = matched.iter().map(|(i, _, _)| i.to_string()).collect();
        exception.push(format!(
            "Value matched {} schemas (indexes {}). Expected exactly one",
            matched.len(),
            indexes.join(", ")
        ));
        return None;
    }
    match matched.pop() {
        Some((_, output, visits)) => {
            ctx.reinstate(visits);
            Some(output)
        }
        None => {
            exception.push_tree(failures);
            None
        }
    }
}
