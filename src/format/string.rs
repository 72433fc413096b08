use crate::value::Value;

use super::{FormatCodec, FormatContext};

/// `type: string` with no special format (also `password`, `email`, ...).
///
/// With coercion, booleans and numbers become their text form.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl StringCodec {
    fn convert(ctx: &mut FormatContext<'_>) -> Option<Value> {
        match ctx.value {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Bool(b) if ctx.coerce => Some(Value::String(b.to_string())),
            Value::Integer(i) if ctx.coerce => Some(Value::String(i.to_string())),
            Value::Number(n) if ctx.coerce && n.is_finite() => Some(Value::String(n.to_string())),
            _ => ctx.expected("a string"),
        }
    }
}

impl FormatCodec for StringCodec {
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        Self::convert(ctx)
    }

    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        Self::convert(ctx)
    }

    fn validate(&self, ctx: &mut FormatContext<'_>) {
        if !matches!(ctx.value, Value::String(_)) {
            ctx.expected("a string");
        }
    }
}
