//! Engine configuration.

use std::fmt::{self, Display};
use std::str::FromStr;

/// The OpenAPI major version a document was written against.
///
/// The version decides which parameter encoding rules apply (v2
/// `collectionFormat` versus v3 `style`/`explode`) and how discriminators
/// are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// Swagger 2.0.
    V2,
    /// OpenAPI 3.0.x.
    V3,
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V2 => write!(f, "2.0"),
            Version::V3 => write!(f, "3.0"),
        }
    }
}

/// Error returned when a document version string is not 2.x or 3.x.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unsupported OpenAPI version '{0}'")]
pub struct UnsupportedVersion(pub String);

impl FromStr for Version {
    type Err = UnsupportedVersion;

    /// Parses the `swagger` / `openapi` field of a document (`"2.0"`, `"3.0.3"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let major = s.trim().split('.').next().unwrap_or_default();
        match major {
            "2" => Ok(Version::V2),
            "3" => Ok(Version::V3),
            _ => Err(UnsupportedVersion(s.to_string())),
        }
    }
}

/// Settings shared by every call made through one [`Enforcer`](crate::Enforcer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcerConfig {
    /// Document version.
    pub version: Version,
    /// Maximum number of schema references followed in a row without
    /// stepping into a child value.
    pub max_depth: usize,
}

impl EnforcerConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 100;

    pub fn new(version: Version) -> Self {
        Self {
            version,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self::new(Version::V3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_document_strings() {
        assert_eq!("2.0".parse::<Version>(), Ok(Version::V2));
        assert_eq!("3.0.3".parse::<Version>(), Ok(Version::V3));
        assert_eq!(" 3.1.0 ".parse::<Version>(), Ok(Version::V3));
        assert!("1.2".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = EnforcerConfig::default();
        assert_eq!(config.version, Version::V3);
        assert_eq!(config.max_depth, 100);
    }
}
