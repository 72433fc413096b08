//! Query string and cookie header splitting.

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

/// Parameter values by name, in the order they first appeared.
///
/// A name present without a value (`?flag`) maps to an empty string.
pub type QueryMap = IndexMap<String, Vec<String>>;

/// Splits a query string (or `application/x-www-form-urlencoded` body).
///
/// A leading `?` is ignored, `+` decodes to a space and percent escapes are
/// decoded in both names and values.
///
/// # Example
///
/// ```rust
/// use enforcer::parameter::parse_query;
///
/// let query = parse_query("?tag=a&tag=b%20c&flag&q=x+y");
/// assert_eq!(query["tag"], vec!["a", "b c"]);
/// assert_eq!(query["flag"], vec![""]);
/// assert_eq!(query["q"], vec!["x y"]);
/// ```
pub fn parse_query(query: &str) -> QueryMap {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut map = QueryMap::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        map.entry(decode_form(name))
            .or_default()
            .push(decode_form(value));
    }
    map
}

/// Splits a `Cookie` header: `name=value` pairs separated by `;`.
pub fn parse_cookie(header: &str) -> QueryMap {
    let mut map = QueryMap::new();
    for pair in header.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        map.entry(name.trim().to_string())
            .or_default()
            .push(decode(value.trim()));
    }
    map
}

/// Percent-decodes one component.
pub(crate) fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn decode_form(raw: &str) -> String {
    decode(&raw.replace('+', " "))
}
