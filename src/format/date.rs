use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use regex::Regex;

use crate::value::Value;

use super::{FormatCodec, FormatContext};

fn date_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"))
}

fn date_time_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
            .expect("date-time pattern is valid")
    })
}

/// Parses a full-date (`YYYY-MM-DD`).
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    if !date_shape().is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parses an RFC 3339 date-time and normalizes it to UTC.
pub(crate) fn parse_date_time(s: &str) -> Option<DateTime<Utc>> {
    if !date_time_shape().is_match(s) {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Checks an ordered value against the `minimum`/`maximum` literals of the
/// node's string rules, parsed with `parse`.
fn check_bounds<T, P>(ctx: &mut FormatContext<'_>, value: &T, shown: &str, parse: P)
where
    T: PartialOrd,
    P: Fn(&str) -> Option<T>,
{
    let Some(rules) = ctx.schema.string_rules() else {
        return;
    };
    let mut problems = Vec::new();
    if let Some((bound, exclusive)) = rules.minimum() {
        match parse(bound) {
            Some(min) if exclusive && *value <= min => problems.push(format!(
                "Expected date to be after {}. Received: {}",
                bound, shown
            )),
            Some(min) if !exclusive && *value < min => problems.push(format!(
                "Expected date to be on or after {}. Received: {}",
                bound, shown
            )),
            Some(_) => {}
            None => problems.push(format!("Invalid minimum bound: {}", bound)),
        }
    }
    if let Some((bound, exclusive)) = rules.maximum() {
        match parse(bound) {
            Some(max) if exclusive && *value >= max => problems.push(format!(
                "Expected date to be before {}. Received: {}",
                bound, shown
            )),
            Some(max) if !exclusive && *value > max => problems.push(format!(
                "Expected date to be on or before {}. Received: {}",
                bound, shown
            )),
            Some(_) => {}
            None => problems.push(format!("Invalid maximum bound: {}", bound)),
        }
    }
    for problem in problems {
        ctx.error(problem);
    }
}

/// `type: string, format: date`.
///
/// Deserializes `YYYY-MM-DD` strings into [`Value::Date`] and serializes
/// dates back. With coercion, serialize also accepts date-times (their
/// date part) and date strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

impl FormatCodec for DateCodec {
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        let value = ctx.value;
        match value {
            Value::String(s) => match parse_date(s) {
                Some(date) => Some(Value::Date(date)),
                None => ctx.expected("a date string of the form YYYY-MM-DD"),
            },
            Value::Date(date) => Some(Value::Date(*date)),
            _ => ctx.expected("a date string of the form YYYY-MM-DD"),
        }
    }

    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        let value = ctx.value;
        match value {
            Value::Date(date) => Some(Value::String(format_date(date))),
            Value::DateTime(dt) if ctx.coerce => Some(Value::String(format_date(&dt.date_naive()))),
            Value::String(s) if ctx.coerce => match parse_date(s)
                .or_else(|| parse_date_time(s).map(|dt| dt.date_naive()))
            {
                Some(date) => Some(Value::String(format_date(&date))),
                None => ctx.expected("a date"),
            },
            _ => ctx.expected("a date"),
        }
    }

    fn validate(&self, ctx: &mut FormatContext<'_>) {
        let value = ctx.value;
        match value {
            Value::Date(date) => {
                let shown = format_date(date);
                check_bounds(ctx, date, &shown, parse_date);
            }
            _ => {
                ctx.expected("a date");
            }
        }
    }
}

/// `type: string, format: date-time`.
///
/// Deserializes RFC 3339 strings into UTC [`Value::DateTime`] and
/// serializes date-times back in UTC. With coercion, serialize also accepts
/// dates (midnight UTC) and date-time strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCodec;

impl FormatCodec for DateTimeCodec {
    fn deserialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        let value = ctx.value;
        match value {
            Value::String(s) => match parse_date_time(s) {
                Some(dt) => Some(Value::DateTime(dt)),
                None => ctx.expected("an RFC 3339 date-time string"),
            },
            Value::DateTime(dt) => Some(Value::DateTime(*dt)),
            _ => ctx.expected("an RFC 3339 date-time string"),
        }
    }

    fn serialize(&self, ctx: &mut FormatContext<'_>) -> Option<Value> {
        let value = ctx.value;
        match value {
            Value::DateTime(dt) => Some(Value::String(format_date_time(dt))),
            Value::Date(date) if ctx.coerce => {
                let midnight = date.and_time(NaiveTime::MIN).and_utc();
                Some(Value::String(format_date_time(&midnight)))
            }
            Value::String(s) if ctx.coerce => match parse_date_time(s)
                .or_else(|| parse_date(s).map(|d| d.and_time(NaiveTime::MIN).and_utc()))
            {
                Some(dt) => Some(Value::String(format_date_time(&dt))),
                None => ctx.expected("a date-time"),
            },
            _ => ctx.expected("a date-time"),
        }
    }

    fn validate(&self, ctx: &mut FormatContext<'_>) {
        let value = ctx.value;
        match value {
            Value::DateTime(dt) => {
                let shown = format_date_time(dt);
                check_bounds(ctx, dt, &shown, parse_date_time);
            }
            _ => {
                ctx.expected("a date-time");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_is_strict() {
        assert!(parse_date("2020-01-31").is_some());
        assert!(parse_date("2020-1-31").is_none());
        assert!(parse_date("2020-02-30").is_none());
        assert!(parse_date("2020-01-31T00:00:00Z").is_none());
    }

    #[test]
    fn test_parse_date_time_normalizes_to_utc() {
        let dt = parse_date_time("2020-01-01T10:00:00+02:00").unwrap();
        assert_eq!(format_date_time(&dt), "2020-01-01T08:00:00Z");

        let precise = parse_date_time("2020-01-01T10:00:00.250Z").unwrap();
        assert_eq!(format_date_time(&precise), "2020-01-01T10:00:00.250Z");

        assert!(parse_date_time("2020-01-01 10:00:00Z").is_none());
        assert!(parse_date_time("2020-01-01").is_none());
    }
}
