//! Locations inside a value.
//!
//! [`PathSegment`] is the key type of [`Exception::at`](crate::Exception::at):
//! array indexes and object property names. [`ValuePath`] strings segments
//! together when an exception tree is flattened into single-line messages.

use std::fmt::{self, Display};

/// One step into a container value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object property (e.g. `name`).
    Key(String),
    /// An array index (e.g. `[0]`).
    Index(usize),
}

impl PathSegment {
    /// Creates a property segment.
    pub fn key(name: impl Into<String>) -> Self {
        PathSegment::Key(name.into())
    }

    /// Creates an index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Key(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Key(name)
    }
}

impl From<&String> for PathSegment {
    fn from(name: &String) -> Self {
        PathSegment::Key(name.clone())
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(name) => write!(f, "{}", name),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// A path from the root of a value down to one of its descendants.
///
/// ```rust
/// use enforcer::ValuePath;
///
/// let path = ValuePath::root()
///     .push_key("pets")
///     .push_index(0)
///     .push_key("name");
///
/// assert_eq!(path.to_string(), "pets[0].name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ValuePath {
    segments: Vec<PathSegment>,
}

impl ValuePath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path with `segment` appended.
    pub fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Returns a new path with a property segment appended.
    pub fn push_key(&self, name: impl Into<String>) -> Self {
        self.push(PathSegment::Key(name.into()))
    }

    /// Returns a new path with an index segment appended.
    pub fn push_index(&self, index: usize) -> Self {
        self.push(PathSegment::Index(index))
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Returns the last segment, or None at the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_renders_empty() {
        let path = ValuePath::root();
        assert!(path.is_root());
        assert_eq!(path.len(), 0);
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn test_leading_index() {
        let path = ValuePath::root().push_index(2).push_key("id");
        assert_eq!(path.to_string(), "[2].id");
    }

    #[test]
    fn test_push_does_not_mutate_base() {
        let base = ValuePath::root().push_key("items");
        let first = base.push_index(0);
        let second = base.push_index(1);

        assert_eq!(base.to_string(), "items");
        assert_eq!(first.to_string(), "items[0]");
        assert_eq!(second.to_string(), "items[1]");
        assert_eq!(second.last(), Some(&PathSegment::Index(1)));
    }

    #[test]
    fn test_segment_conversions() {
        assert_eq!(PathSegment::from(3), PathSegment::Index(3));
        assert_eq!(PathSegment::from("a"), PathSegment::key("a"));
        assert_eq!(PathSegment::from(String::from("b")).to_string(), "b");
    }
}
