//! The outcome of a conversion: a value, an error tree, a warning tree.

use stillwater::Validation;

use crate::error::Exception;

/// The value produced by an engine call together with everything reported
/// along the way.
///
/// Errors and warnings are only exposed when they hold at least one
/// message, so an empty tree reads as `None`.
///
/// # Example
///
/// ```rust
/// use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
/// use serde_json::json;
///
/// let enforcer = Enforcer::new(Version::V3);
/// let schema = Schema::integer().build();
/// let result = enforcer.deserialize(&schema, &Value::from(json!("12")), true);
///
/// assert!(result.is_ok());
/// assert_eq!(result.value(), Some(&Value::Integer(12)));
/// ```
#[derive(Debug, Clone)]
pub struct EnforcerResult<T> {
    value: Option<T>,
    error: Exception,
    warning: Exception,
}

impl<T> EnforcerResult<T> {
    /// Pairs a value with the error tree of the call that produced it.
    ///
    /// When the error tree holds messages the value is dropped.
    pub fn new(value: Option<T>, error: Exception) -> Self {
        let value = if error.has_exception() { None } else { value };
        Self {
            value,
            error,
            warning: Exception::default(),
        }
    }

    /// Attaches a warning tree.
    pub fn with_warning(mut self, warning: Exception) -> Self {
        self.warning = warning;
        self
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&Exception> {
        self.error.has_exception().then_some(&self.error)
    }

    pub fn warning(&self) -> Option<&Exception> {
        self.warning.has_exception().then_some(&self.warning)
    }

    /// True when no error was reported.
    pub fn is_ok(&self) -> bool {
        !self.error.has_exception()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Splits into `(value, error, warning)`.
    pub fn into_parts(self) -> (Option<T>, Option<Exception>, Option<Exception>) {
        let error = self.error.has_exception().then_some(self.error);
        let warning = self.warning.has_exception().then_some(self.warning);
        (self.value, error, warning)
    }

    /// Converts into a plain `Result`, discarding warnings.
    ///
    /// # Errors
    ///
    /// Returns the error tree when it holds messages, or an
    /// `"No value produced"` exception when the call produced neither.
    pub fn into_result(self) -> Result<T, Exception> {
        match (self.value, self.error.has_exception()) {
            (_, true) => Err(self.error),
            (Some(value), false) => Ok(value),
            (None, false) => {
                let mut error = Exception::default();
                error.push("No value produced");
                Err(error)
            }
        }
    }

    /// Converts into an accumulating [`Validation`].
    pub fn into_validation(self) -> Validation<T, Exception> {
        match self.into_result() {
            Ok(value) => Validation::Success(value),
            Err(error) => Validation::Failure(error),
        }
    }

    /// Maps the produced value, keeping both trees.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> EnforcerResult<U> {
        EnforcerResult {
            value: self.value.map(f),
            error: self.error,
            warning: self.warning,
        }
    }
}

impl<T> From<(Option<T>, Exception)> for EnforcerResult<T> {
    fn from((value, error): (Option<T>, Exception)) -> Self {
        Self::new(value, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_drops_value() {
        let mut error = Exception::new("Invalid value");
        error.push("Expected a string. Received: 1");
        let result = EnforcerResult::new(Some(1), error);

        assert!(!result.is_ok());
        assert!(result.value().is_none());
        assert_eq!(result.error().map(Exception::count), Some(1));
    }

    #[test]
    fn test_empty_trees_read_as_none() {
        let result = EnforcerResult::new(Some("x"), Exception::new("header"))
            .with_warning(Exception::new("warnings"));

        assert!(result.is_ok());
        assert!(result.error().is_none());
        assert!(result.warning().is_none());
        assert_eq!(result.into_result().ok(), Some("x"));
    }

    #[test]
    fn test_missing_value_is_an_error() {
        let result: EnforcerResult<i32> = EnforcerResult::new(None, Exception::default());
        let error = result.into_result().unwrap_err();
        assert_eq!(error.flatten(), vec!["No value produced".to_string()]);
    }

    #[test]
    fn test_into_validation() {
        let ok = EnforcerResult::new(Some(2), Exception::default()).map(|n| n * 2);
        assert!(matches!(ok.into_validation(), Validation::Success(4)));

        let mut error = Exception::default();
        error.push("bad");
        let failed: EnforcerResult<i32> = (None, error).into();
        assert!(matches!(failed.into_validation(), Validation::Failure(_)));
    }
}
