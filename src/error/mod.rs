//! Error types.
//!
//! Problems found while processing a value accumulate in an [`Exception`]
//! tree. Problems with the definitions themselves (a parameter whose style
//! cannot encode its schema, a format registered twice) are ordinary
//! `Result` errors raised when the definition is built.

mod definition_error;
mod exception;

pub use definition_error::{DefinitionError, RegistryError};
pub use exception::Exception;
