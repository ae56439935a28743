//! Error types for rich JSON serialization and deserialization.
//!
//! Every failure surfaces to the caller as an [`Error`]; nothing is retried and
//! no partially converted value is ever returned.
//!
//! ## Error Categories
//!
//! - **Graph errors**: a value nested inside itself ([`Error::CircularReference`])
//! - **Annotation errors**: tags or identifiers that nothing can decode
//!   ([`Error::UnknownAnnotation`], [`Error::TypeMismatch`])
//! - **Path errors**: malformed, unsafe or dangling paths
//!   ([`Error::InvalidPath`], [`Error::PrototypePollution`], [`Error::NotFound`],
//!   [`Error::IndexOutOfBounds`])
//! - **Registry errors**: two values claiming one identifier
//!   ([`Error::AmbiguousRegistration`])
//! - **Payload errors**: a `{json, meta}` envelope that is not well formed
//!   ([`Error::InvalidPayload`])
//!
//! Paths in error messages use the same escaped dot notation as the wire format.
//!
//! ## Examples
//!
//! ```rust
//! use serde_richjson::{from_str, Error};
//!
//! let result = from_str(r#"{"json": 1, "meta": {"values": ["nope"]}}"#);
//! assert!(matches!(result, Err(Error::UnknownAnnotation { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while converting rich values.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An object is reachable from inside itself.
    #[error("Circular reference at path '{path}'")]
    CircularReference { path: String },

    /// A tag, class, symbol or transformer name that has no registered handler.
    #[error("Unknown annotation '{identifier}' at path '{path}'")]
    UnknownAnnotation { path: String, identifier: String },

    /// A path segment would reach the prototype or constructor chain.
    #[error("Refusing to access prototype chain through path '{path}'")]
    PrototypePollution { path: String },

    /// A set or map position beyond the collection's snapshot.
    #[error("Index {index} out of bounds (length {len}) at path '{path}'")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// A path segment that does not exist in the tree.
    #[error("Nothing found at path '{path}'")]
    NotFound { path: String },

    /// Two different values registered under the same identifier.
    #[error("Ambiguous registration '{identifier}', provide a unique identifier")]
    AmbiguousRegistration { identifier: String },

    /// The `{json, meta}` envelope is malformed.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A stringified path that cannot be parsed.
    #[error("Invalid path '{path}': {msg}")]
    InvalidPath { path: String, msg: String },

    /// An annotation was applied to a value of the wrong shape.
    #[error("Type mismatch at path '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A value the rule set cannot express on the wire.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a circular reference error for the given stringified path.
    pub fn circular(path: impl Into<String>) -> Self {
        Error::CircularReference { path: path.into() }
    }

    /// Creates an unknown annotation error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_richjson::Error;
    ///
    /// let err = Error::unknown_annotation("a.b", "class:Point");
    /// assert!(err.to_string().contains("class:Point"));
    /// assert!(err.to_string().contains("a.b"));
    /// ```
    pub fn unknown_annotation(path: impl Into<String>, identifier: impl Into<String>) -> Self {
        Error::UnknownAnnotation {
            path: path.into(),
            identifier: identifier.into(),
        }
    }

    pub fn prototype_pollution(path: impl Into<String>) -> Self {
        Error::PrototypePollution { path: path.into() }
    }

    pub fn index_out_of_bounds(path: impl Into<String>, index: usize, len: usize) -> Self {
        Error::IndexOutOfBounds {
            path: path.into(),
            index,
            len,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound { path: path.into() }
    }

    pub fn ambiguous(identifier: impl Into<String>) -> Self {
        Error::AmbiguousRegistration {
            identifier: identifier.into(),
        }
    }

    /// Creates an invalid payload error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_richjson::Error;
    ///
    /// let err = Error::invalid_payload("missing 'json'");
    /// assert_eq!(err.to_string(), "Invalid payload: missing 'json'");
    /// ```
    pub fn invalid_payload<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidPayload(msg.to_string())
    }

    pub fn invalid_path(path: &str, msg: &str) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a type mismatch error when an annotation meets an unexpected value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_richjson::Error;
    ///
    /// let err = Error::type_mismatch("created", "string", "number");
    /// assert!(err.to_string().contains("expected string"));
    /// ```
    pub fn type_mismatch(path: impl Into<String>, expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            path: path.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidPayload(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
