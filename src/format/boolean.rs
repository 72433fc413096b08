use crate::value::Value;

use super::{FormatCodec, FormatContext};

/// `type: boolean`.
///
/// With coercion, `"true"`/`"false"` in any case and the integers 0 and 1
/// are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl BooleanCodec {
    fn convert(ctx: &mut FormatContext<'_>) -> Option<Value> {
        match ctx.value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) if ctx.coerce => match s.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => ctx.expected("a boolean"),
            },
            Value::Integer(0) if ctx.coerce => Some(Value::Bool(false)),
            Value::Integer(1) if ctx.coerce => Some(Value::Bool(true)),
            _ => ctx.expected("a boolean"),
        }
    }
}

impl FormatCodec for BooleanCodec {
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        Self::convert(ctx)
    }

    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        Self::convert(ctx)
    }

    fn validate(&self, ctx: &mut FormatContext<'_>) {
        if !matches!(ctx.value, Value::Bool(_)) {
            ctx.expected("a boolean");
        }
    }
}
