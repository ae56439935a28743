//! Configuration options for rich JSON conversion.
//!
//! This module provides types to customize how values are walked and how the
//! registries react to conflicts:
//!
//! - [`Options`]: Main configuration struct
//! - [`RegistrationPolicy`]: What happens when two values claim one identifier
//! - [`PathSyntax`]: Which escaping rules annotation paths are read with
//!
//! ## Examples
//!
//! ```rust
//! use serde_richjson::{Options, RegistrationPolicy, RichJson};
//!
//! // Replace repeated references by `null` and rely on referential equalities
//! let options = Options::new().with_dedupe(true);
//! let codec = RichJson::with_options(options);
//!
//! // Overwrite colliding registrations with a warning instead of failing
//! let options = Options::new().with_registration_policy(RegistrationPolicy::WarnAndOverwrite);
//! ```

/// What a registry does when a different value is registered under an
/// identifier that is already taken.
///
/// Registering the identical value twice is always a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Fail with [`Error::AmbiguousRegistration`](crate::Error::AmbiguousRegistration).
    #[default]
    Reject,
    /// Log a warning and let the new value replace the old one.
    WarnAndOverwrite,
}

/// Escaping rules used when parsing annotation paths on deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PathSyntax {
    /// `\\` and `\.` are the only escapes; anything else is an error.
    #[default]
    Strict,
    /// Only `\.` is an escape; other backslashes are literal.
    #[cfg(feature = "legacy-paths")]
    Legacy,
}

/// Configuration options for rich JSON conversion.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::Options;
///
/// let options = Options::new();
/// assert!(!options.dedupe);
/// assert!(!options.pretty);
///
/// let options = Options::pretty().with_dedupe(true);
/// assert!(options.pretty && options.dedupe);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Emit `null` for every repeated reference instead of its full encoding.
    pub dedupe: bool,
    pub registration_policy: RegistrationPolicy,
    pub path_syntax: PathSyntax,
    /// Pretty-print JSON text produced by `stringify`.
    pub pretty: bool,
}

impl Options {
    /// Creates default options: no dedupe, strict paths, compact output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for pretty-printed JSON text.
    #[must_use]
    pub fn pretty() -> Self {
        Options {
            pretty: true,
            ..Default::default()
        }
    }

    /// Sets whether repeated references are replaced by `null` placeholders.
    ///
    /// The references are still restored on deserialization through the
    /// referential equalities in `meta`.
    #[must_use]
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    #[must_use]
    pub fn with_registration_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.registration_policy = policy;
        self
    }

    /// Sets the escaping rules for annotation paths read by `deserialize`.
    #[must_use]
    pub fn with_path_syntax(mut self, syntax: PathSyntax) -> Self {
        self.path_syntax = syntax;
        self
    }
}
