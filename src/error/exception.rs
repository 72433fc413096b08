//! The hierarchical error/warning accumulator.
//!
//! An [`Exception`] collects every problem found during one engine call.
//! Problems are attached at structural locations ([`Exception::at`]), under
//! explanatory headings ([`Exception::nest`]) or directly as messages
//! ([`Exception::push`]). Aggregate queries are memoized per node.

use std::cell::Cell;
use std::fmt::{self, Display};

use indexmap::IndexMap;
use stillwater::prelude::*;

use crate::path::{PathSegment, ValuePath};

/// A tree of error (or warning) messages.
///
/// Children come in two flavours: keyed children (`at`) for array indexes
/// and object properties, and unkeyed children (`nest`) that group related
/// messages under their own header. Leaf messages live in `message`.
///
/// `has_exception()` and `count()` are computed on first read and cached.
/// Every mutating method clears the cache of the node it is called on, and
/// a descendant can only be reached mutably through `at`/`nest` of its
/// ancestors, which clear theirs on the way down. A cached ancestor can
/// therefore never outlive a write below it.
///
/// # Example
///
/// ```rust
/// use enforcer::Exception;
///
/// let mut exception = Exception::new("Request has one or more errors");
/// exception.at("body").at("name").push("Expected a string. Received: 12");
/// exception.nest("In query parameters").push("Unknown parameter: debug");
///
/// assert!(exception.has_exception());
/// assert_eq!(exception.count(), 2);
/// assert_eq!(
///     exception.flatten()[0],
///     "Request has one or more errors: body.name: Expected a string. Received: 12"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Exception {
    header: String,
    at: IndexMap<PathSegment, Exception>,
    nest: Vec<Exception>,
    message: Vec<String>,
    has_exception: Cell<Option<bool>>,
    count: Cell<Option<usize>>,
}

impl Exception {
    /// Creates an empty tree with the given header line.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Returns the child stored under `key`, creating it if absent.
    pub fn at(&mut self, key: impl Into<PathSegment>) -> &mut Exception {
        self.invalidate();
        self.at.entry(key.into()).or_default()
    }

    /// Creates an unkeyed child with its own header and returns it.
    pub fn nest(&mut self, header: impl Into<String>) -> &mut Exception {
        self.invalidate();
        self.nest.push(Exception::new(header));
        let last = self.nest.len() - 1;
        &mut self.nest[last]
    }

    /// Appends a leaf message.
    pub fn push(&mut self, message: impl Into<String>) -> &mut Self {
        self.invalidate();
        self.message.push(message.into());
        self
    }

    /// Splices a whole tree in as an unkeyed child.
    pub fn push_tree(&mut self, tree: Exception) -> &mut Self {
        self.invalidate();
        self.nest.push(tree);
        self
    }

    /// Unions `other` into this tree.
    ///
    /// Keyed children are merged recursively on key collision; unkeyed
    /// children and messages are appended. The header of `other` is dropped.
    pub fn merge(&mut self, other: Exception) -> &mut Self {
        self.invalidate();
        for (key, child) in other.at {
            match self.at.get_mut(&key) {
                Some(existing) => {
                    existing.merge(child);
                }
                None => {
                    self.at.insert(key, child);
                }
            }
        }
        self.nest.extend(other.nest);
        self.message.extend(other.message);
        self
    }

    /// True when this node or any descendant holds a message.
    pub fn has_exception(&self) -> bool {
        if let Some(cached) = self.has_exception.get() {
            return cached;
        }
        let result = !self.message.is_empty()
            || self.at.values().any(Exception::has_exception)
            || self.nest.iter().any(Exception::has_exception);
        self.has_exception.set(Some(result));
        result
    }

    /// Total number of messages in this subtree.
    pub fn count(&self) -> usize {
        if let Some(cached) = self.count.get() {
            return cached;
        }
        let result = self.message.len()
            + self.at.values().map(Exception::count).sum::<usize>()
            + self.nest.iter().map(Exception::count).sum::<usize>();
        self.count.set(Some(result));
        result
    }

    /// Returns the keyed child for `key` without creating it.
    pub fn get(&self, key: impl Into<PathSegment>) -> Option<&Exception> {
        self.at.get(&key.into())
    }

    pub fn children(&self) -> impl Iterator<Item = (&PathSegment, &Exception)> {
        self.at.iter()
    }

    pub fn nested(&self) -> impl Iterator<Item = &Exception> {
        self.nest.iter()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.message.iter().map(String::as_str)
    }

    /// Renders one line per message: `<headers>: <path>: <message>`.
    ///
    /// Headers of every enclosing node are joined with `": "`; the path part
    /// is omitted for messages attached at the root of a keyed chain.
    pub fn flatten(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut headers = Vec::new();
        self.collect_lines(&mut headers, &ValuePath::root(), &mut lines);
        lines
    }

    fn collect_lines<'a>(
        &'a self,
        headers: &mut Vec<&'a str>,
        path: &ValuePath,
        lines: &mut Vec<String>,
    ) {
        if !self.has_exception() {
            return;
        }
        let pushed = !self.header.is_empty();
        if pushed {
            headers.push(&self.header);
        }

        for (key, child) in &self.at {
            child.collect_lines(headers, &path.push(key.clone()), lines);
        }
        for child in &self.nest {
            child.collect_lines(headers, path, lines);
        }
        for message in &self.message {
            let mut parts: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
            if !path.is_root() {
                parts.push(path.to_string());
            }
            parts.push(message.clone());
            lines.push(parts.join(": "));
        }

        if pushed {
            headers.pop();
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if !self.has_exception() {
            return Ok(());
        }
        let depth = if self.header.is_empty() {
            depth
        } else {
            writeln!(f, "{}{}", indent(depth), self.header)?;
            depth + 1
        };

        for (key, child) in &self.at {
            if child.has_exception() {
                writeln!(f, "{}at: {}", indent(depth), key)?;
                child.render(f, depth + 1)?;
            }
        }
        for child in &self.nest {
            child.render(f, depth)?;
        }
        for message in &self.message {
            writeln!(f, "{}{}", indent(depth), message)?;
        }
        Ok(())
    }

    fn invalidate(&self) {
        self.has_exception.set(None);
        self.count.set(None);
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

impl Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

impl std::error::Error for Exception {}

impl Semigroup for Exception {
    fn combine(mut self, other: Self) -> Self {
        self.merge(other);
        self
    }
}

// Exceptions are created per call and may be handed to another thread.
const _: () = {
    const fn assert_send<T: Send>() {}
    assert_send::<Exception>();
};
