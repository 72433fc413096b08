//! The runtime value model.
//!
//! Values coming off the wire are JSON-like, but deserialized values also
//! carry dates, byte buffers and the empty-parameter marker, and may contain
//! cycles. Containers are shared handles: cloning a [`Value::Array`] or
//! [`Value::Object`] clones the handle, not the contents, and the handle's
//! address is the container's identity.

pub mod attributes;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;

pub use attributes::ValueAttributes;

/// Shared, mutable array storage.
pub type ArrayRef = Arc<RwLock<Vec<Value>>>;

/// Shared, mutable, insertion-ordered object storage.
pub type ObjectRef = Arc<RwLock<IndexMap<String, Value>>>;

/// A runtime value.
///
/// # Example
///
/// ```rust
/// use enforcer::Value;
/// use serde_json::json;
///
/// let value = Value::from(json!({"id": 7, "tags": ["a", "b"]}));
/// assert_eq!(value.get("id"), Some(Value::Integer(7)));
///
/// // Integers and numbers compare by numeric value
/// assert_eq!(Value::Integer(3), Value::Number(3.0));
/// ```
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Bytes(Vec<u8>),
    /// A parameter that was present but carried no value (`?flag`).
    Empty,
    Array(ArrayRef),
    Object(ObjectRef),
}

impl Value {
    /// Creates an array value from its items.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(RwLock::new(items.into_iter().collect())))
    }

    /// Creates an object value from its entries, preserving their order.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Arc::new(RwLock::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for the empty-parameter marker.
    pub fn is_empty_marker(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an integer if it is one, or a number with no
    /// fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns a snapshot of an array's items.
    pub fn items(&self) -> Option<Vec<Value>> {
        self.as_array().map(|items| items.read().clone())
    }

    /// Returns a snapshot of an object's entries.
    pub fn entries(&self) -> Option<Vec<(String, Value)>> {
        self.as_object().map(|map| {
            map.read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
    }

    /// Returns a property of an object value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|map| map.read().get(key).cloned())
    }

    /// Inserts a property into an object value. Returns false for non-objects.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> bool {
        match self.as_object() {
            Some(map) => {
                map.write().insert(key.into(), value);
                true
            }
            None => false,
        }
    }

    /// Appends an item to an array value. Returns false for non-arrays.
    pub fn push(&self, value: Value) -> bool {
        match self.as_array() {
            Some(items) => {
                items.write().push(value);
                true
            }
            None => false,
        }
    }

    /// The identity of a container value: the address of its shared storage.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(Arc::as_ptr(items) as *const () as usize),
            Value::Object(map) => Some(Arc::as_ptr(map) as *const () as usize),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "date-time",
            Value::Bytes(_) => "bytes",
            Value::Empty => "empty",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// A fresh, empty container of the same kind, or None for scalars.
    pub(crate) fn empty_like(&self) -> Option<Value> {
        match self {
            Value::Array(_) => Some(Value::array(Vec::new())),
            Value::Object(_) => Some(Value::object(Vec::<(String, Value)>::new())),
            _ => None,
        }
    }

    /// Replaces the contents of this container with those of `source`.
    ///
    /// Does nothing when the two are not containers of the same kind.
    pub(crate) fn replace_contents(&self, source: &Value) {
        match (self, source) {
            (Value::Array(target), Value::Array(from)) => {
                if !Arc::ptr_eq(target, from) {
                    let items = from.read().clone();
                    *target.write() = items;
                }
            }
            (Value::Object(target), Value::Object(from)) => {
                if !Arc::ptr_eq(target, from) {
                    let entries = from.read().clone();
                    *target.write() = entries;
                }
            }
            _ => {}
        }
    }

    /// Value equality: deep, numeric across integer and number, and safe on
    /// cyclic values.
    pub fn deep_equal(&self, other: &Value) -> bool {
        let mut seen = HashSet::new();
        deep_equal(self, other, &mut seen)
    }

    /// Converts to JSON. Dates become ISO 8601 strings, bytes become
    /// base64, the empty marker becomes `""` and cycles become
    /// `"[Circular]"`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut stack = Vec::new();
        to_json(self, &mut stack)
    }

    /// Short rendering used in messages.
    pub fn describe(&self) -> String {
        self.to_json().to_string()
    }
}

fn deep_equal(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) | (Value::Empty, Value::Empty) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Integer(_) | Value::Number(_), Value::Integer(_) | Value::Number(_)) => {
            a.as_f64() == b.as_f64()
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::DateTime(x), Value::DateTime(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            if Arc::ptr_eq(x, y) || !seen.insert(pair(a, b)) {
                return true;
            }
            let left = x.read().clone();
            let right = y.read().clone();
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right.iter())
                    .all(|(l, r)| deep_equal(l, r, seen))
        }
        (Value::Object(x), Value::Object(y)) => {
            if Arc::ptr_eq(x, y) || !seen.insert(pair(a, b)) {
                return true;
            }
            let left = x.read().clone();
            let right = y.read().clone();
            left.len() == right.len()
                && left.iter().all(|(key, l)| match right.get(key) {
                    Some(r) => deep_equal(l, r, seen),
                    None => false,
                })
        }
        _ => false,
    }
}

fn pair(a: &Value, b: &Value) -> (usize, usize) {
    (a.identity().unwrap_or(0), b.identity().unwrap_or(0))
}

fn to_json(value: &Value, stack: &mut Vec<usize>) -> serde_json::Value {
    use serde_json::Value as Json;

    if let Some(id) = value.identity() {
        if stack.contains(&id) {
            return Json::String("[Circular]".to_string());
        }
    }

    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => Json::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Bytes(bytes) => Json::String(STANDARD.encode(bytes)),
        Value::Empty => Json::String(String::new()),
        Value::Array(items) => {
            stack.push(Arc::as_ptr(items) as *const () as usize);
            let items = items.read().clone();
            let result = Json::Array(items.iter().map(|v| to_json(v, stack)).collect());
            stack.pop();
            result
        }
        Value::Object(map) => {
            stack.push(Arc::as_ptr(map) as *const () as usize);
            let entries = map.read().clone();
            let result = Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), to_json(v, stack)))
                    .collect(),
            );
            stack.pop();
            result
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.deep_equal(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Date(d) => write!(f, "Date({})", d),
            Value::DateTime(dt) => write!(f, "DateTime({})", dt.to_rfc3339()),
            Value::Bytes(bytes) => write!(f, "Bytes({:?})", bytes),
            Value::Empty => write!(f, "Empty"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from)),
            Json::Object(map) => Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v)))),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}
