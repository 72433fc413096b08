//! Leaf parsing: one raw string into a typed scalar.

use crate::error::Exception;
use crate::format::DataType;
use crate::value::Value;

pub(crate) const EMPTY_NOT_ALLOWED: &str = "Empty value not allowed";

/// Parses one leaf of a parameter value.
///
/// `data_type` is the type of the schema the leaf belongs to; without one
/// (no `type`, or a composition) the leaf stays a string and is left to the
/// engine. An empty string is only a valid string.
pub(crate) fn parse_primitive(
    raw: &str,
    data_type: Option<DataType>,
    exception: &mut Exception,
) -> Option<Value> {
    if raw.is_empty() {
        return match data_type {
            Some(DataType::String) | None => Some(Value::String(String::new())),
            Some(_) => {
                exception.push(EMPTY_NOT_ALLOWED);
                None
            }
        };
    }

    match data_type {
        Some(DataType::Boolean) => {
            if raw.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                exception.push(format!("Expected \"true\" or \"false\". Received: \"{}\"", raw));
                None
            }
        }
        Some(DataType::Integer) => match raw.trim().parse::<i64>() {
            Ok(i) => Some(Value::Integer(i)),
            Err(_) => {
                exception.push(format!("Expected an integer. Received: \"{}\"", raw));
                None
            }
        },
        Some(DataType::Number) => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Some(number(n)),
            _ => {
                exception.push(format!("Expected a number. Received: \"{}\"", raw));
                None
            }
        },
        Some(DataType::String) | None => Some(Value::String(raw.to_string())),
    }
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::Integer(n as i64)
    } else {
        Value::Number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str, data_type: DataType) -> (Option<Value>, Exception) {
        let mut exception = Exception::default();
        let value = parse_primitive(raw, Some(data_type), &mut exception);
        (value, exception)
    }

    #[test]
    fn test_booleans_ignore_case() {
        assert_eq!(parse("TRUE", DataType::Boolean).0, Some(Value::Bool(true)));
        assert_eq!(parse("False", DataType::Boolean).0, Some(Value::Bool(false)));

        let (value, exception) = parse("yes", DataType::Boolean);
        assert!(value.is_none());
        assert_eq!(
            exception.flatten(),
            vec!["Expected \"true\" or \"false\". Received: \"yes\"".to_string()]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse("42", DataType::Integer).0, Some(Value::Integer(42)));
        assert_eq!(parse("2.5", DataType::Number).0, Some(Value::Number(2.5)));
        assert_eq!(parse("3", DataType::Number).0, Some(Value::Integer(3)));

        assert!(parse("1.5", DataType::Integer).1.has_exception());
        assert!(parse("NaN", DataType::Number).1.has_exception());
        assert!(parse("abc", DataType::Number).1.has_exception());
    }

    #[test]
    fn test_empty_leaf() {
        assert_eq!(parse("", DataType::String).0, Some(Value::from("")));

        let (value, exception) = parse("", DataType::Integer);
        assert!(value.is_none());
        assert_eq!(exception.flatten(), vec![EMPTY_NOT_ALLOWED.to_string()]);
    }
}
