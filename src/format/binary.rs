use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::value::Value;

use super::{FormatCodec, FormatContext};

/// Applies `minLength`/`maxLength` to a decoded byte count.
fn check_byte_length(ctx: &mut FormatContext<'_>, length: usize) {
    if let Some(rules) = ctx.schema.string_rules() {
        rules.check_length(length, "bytes", ctx.exception);
    }
}

/// `type: string, format: byte`: base64 text on the wire, bytes in memory.
///
/// With coercion, serialize also accepts a string and encodes its UTF-8
/// bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCodec;

impl FormatCodec for ByteCodec {
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        let value = ctx.value;
        match value {
            Value::String(s) => match STANDARD.decode(s.as_bytes()) {
                Ok(bytes) => Some(Value::Bytes(bytes)),
                Err(_) => ctx.expected("a base64 encoded string"),
            },
            Value::Bytes(bytes) => Some(Value::Bytes(bytes.clone())),
            _ => ctx.expected("a base64 encoded string"),
        }
    }

    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        let value = ctx.value;
        match value {
            Value::Bytes(bytes) => Some(Value::String(STANDARD.encode(bytes))),
            Value::String(s) if ctx.coerce => Some(Value::String(STANDARD.encode(s.as_bytes()))),
            _ => ctx.expected("a byte buffer"),
        }
    }

    fn validate(&self, ctx: &mut FormatContext<'_>) {
        let value = ctx.value;
        match value {
            Value::Bytes(bytes) => check_byte_length(ctx, bytes.len()),
            _ => {
                ctx.expected("a byte buffer");
            }
        }
    }
}

/// `type: string, format: binary`: a string of `0`/`1` characters (a
/// multiple of eight long) on the wire, bytes in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

fn decode_bits(s: &str) -> Option<Vec<u8>> {
    let bits = s.as_bytes();
    if bits.len() % 8 != 0 {
        return None;
    }
    bits.chunks(8)
        .map(|chunk| {
            chunk.iter().try_fold(0u8, |byte, bit| match bit {
                b'0' => Some(byte << 1),
                b'1' => Some((byte << 1) | 1),
                _ => None,
            })
        })
        .collect()
}

fn encode_bits(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:08b}", byte)).collect()
}

impl FormatCodec for BinaryCodec {
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        let value = ctx.value;
        match value {
            Value::String(s) => match decode_bits(s) {
                Some(bytes) => Some(Value::Bytes(bytes)),
                None => ctx.expected("a binary string of 0s and 1s in groups of 8"),
            },
            Value::Bytes(bytes) => Some(Value::Bytes(bytes.clone())),
            _ => ctx.expected("a binary string of 0s and 1s in groups of 8"),
        }
    }

    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        let value = ctx.value;
        match value {
            Value::Bytes(bytes) => Some(Value::String(encode_bits(bytes))),
            Value::String(s) if ctx.coerce => Some(Value::String(encode_bits(s.as_bytes()))),
            _ => ctx.expected("a byte buffer"),
        }
    }

    fn validate(&self, ctx: &mut FormatContext<'_>) {
        let value = ctx.value;
        match value {
            Value::Bytes(bytes) => check_byte_length(ctx, bytes.len()),
            _ => {
                ctx.expected("a byte buffer");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_strings() {
        assert_eq!(decode_bits("0000000111111111"), Some(vec![1, 255]));
        assert_eq!(encode_bits(&[1, 255]), "0000000111111111");
        assert_eq!(decode_bits(""), Some(Vec::new()));
        assert!(decode_bits("0101").is_none());
        assert!(decode_bits("0101010a").is_none());
    }
}
