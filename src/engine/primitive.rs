//! Primitive nodes: dispatch to the format codec of `(type, format)`.

use crate::error::Exception;
use crate::format::{FormatCodec, FormatContext};
use crate::schema::{Schema, SchemaKind};
use crate::value::Value;

use super::context::{CallContext, Operation};

fn codec<'e>(ctx: &CallContext<'e>, schema: &Schema) -> Option<&'e dyn FormatCodec> {
    let data_type = schema.data_type()?;
    Some(ctx.enforcer().formats().lookup(data_type, schema.format()))
}

/// Type check through the codec, then the node's own constraints once the
/// value is known to have the right type.
pub(crate) fn validate(
    ctx: &mut CallContext<'_>,
    schema: &Schema,
    value: &Value,
    exception: &mut Exception,
) {
    let Some(codec) = codec(ctx, schema) else {
        return;
    };

    let mut local = Exception::default();
    codec.validate(&mut FormatContext {
        schema,
        value,
        coerce: false,
        exception: &mut local,
    });

    if !local.has_exception() {
        match (schema.kind(), value) {
            (SchemaKind::Integer(rules) | SchemaKind::Number(rules), _) => {
                if let Some(n) = value.as_f64() {
                    rules.check(n, &mut local);
                }
            }
            (SchemaKind::String(rules), Value::String(s)) => rules.check(s, &mut local),
            _ => {}
        }
    }

    exception.merge(local);
}

/// Whether `value` equals an enum member. Members are written in wire form,
/// so a typed value is also compared with the member's deserialized form.
pub(crate) fn is_member(
    ctx: &CallContext<'_>,
    schema: &Schema,
    member: &Value,
    value: &Value,
) -> bool {
    if member.deep_equal(value) {
        return true;
    }
    let Some(codec) = codec(ctx, schema) else {
        return false;
    };
    let mut discarded = Exception::default();
    codec
        .deserialize(&mut FormatContext {
            schema,
            value: member,
            coerce: false,
            exception: &mut discarded,
        })
        .is_some_and(|typed| !discarded.has_exception() && typed.deep_equal(value))
}

/// Converts through the codec in the direction of the call.
pub(crate) fn transform(
    ctx: &mut CallContext<'_>,
    schema: &Schema,
    value: &Value,
    exception: &mut Exception,
) -> Option<Value> {
    let codec = codec(ctx, schema)?;
    let mut format_ctx = FormatContext {
        schema,
        value,
        coerce: ctx.coerce(),
        exception,
    };
    match ctx.operation() {
        Operation::Serialize => codec.serialize(&mut format_ctx),
        Operation::Deserialize | Operation::Validate => codec.deserialize(&mut format_ctx),
    }
}
