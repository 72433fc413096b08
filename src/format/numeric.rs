use crate::value::Value;

use super::{FormatCodec, FormatContext};

/// `type: integer`, optionally limited to a bit width (`int32`).
///
/// Integral numbers are accepted as integers. With coercion, numeric
/// strings are parsed.
#[derive(Debug, Clone, Copy)]
pub struct IntegerCodec {
    bits: u32,
}

impl IntegerCodec {
    /// Full 64-bit range.
    pub fn new() -> Self {
        Self { bits: 64 }
    }

    pub fn int32() -> Self {
        Self { bits: 32 }
    }

    fn convert(ctx: &mut FormatContext<'_>) -> Option<Value> {
        match ctx.value {
            Value::Integer(i) => Some(Value::Integer(*i)),
            Value::Number(_) => match ctx.value.as_i64() {
                Some(i) => Some(Value::Integer(i)),
                None => ctx.expected("an integer"),
            },
            Value::String(s) if ctx.coerce => match parse_integer(s) {
                Some(i) => Some(Value::Integer(i)),
                None => ctx.expected("an integer"),
            },
            _ => ctx.expected("an integer"),
        }
    }
}

impl Default for IntegerCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && n.fract() == 0.0)
            .map(|n| n as i64)
    })
}

impl FormatCodec for IntegerCodec {
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        Self::convert(ctx)
    }

    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        Self::convert(ctx)
    }

    fn validate(&self, ctx: &mut FormatContext<'_>) {
        match ctx.value.as_i64() {
            Some(i) if self.bits == 32 && i32::try_from(i).is_err() => {
                let message = format!("Expected a 32-bit integer. Received: {}", i);
                ctx.error(message);
            }
            Some(_) => {}
            None => {
                ctx.expected("an integer");
            }
        }
    }
}

/// `type: number`. Non-finite values are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec;

impl NumberCodec {
    pub fn new() -> Self {
        Self
    }

    fn convert(ctx: &mut FormatContext<'_>) -> Option<Value> {
        match ctx.value {
            Value::Integer(i) => Some(Value::Integer(*i)),
            Value::Number(n) if n.is_finite() => Some(Value::Number(*n)),
            Value::String(s) if ctx.coerce => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Some(number_value(n)),
                _ => ctx.expected("a number"),
            },
            _ => ctx.expected("a number"),
        }
    }
}

/// Keeps integral results as integers so they round-trip exactly.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::Integer(n as i64)
    } else {
        Value::Number(n)
    }
}

impl FormatCodec for NumberCodec {
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        Self::convert(ctx)
    }

    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        Self::convert(ctx)
    }

    fn validate(&self, ctx: &mut FormatContext<'_>) {
        match ctx.value {
            Value::Integer(_) => {}
            Value::Number(n) if n.is_finite() => {}
            _ => {
                ctx.expected("a number");
            }
        }
    }
}
