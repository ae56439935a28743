//! Paths into a plain value tree and their escaped string form.
//!
//! A [`Path`] is a sequence of [`PathKey`]s. On the wire a path is a single
//! string: segments joined by `.`, with `\` written as `\\` and `.` written as
//! `\.` inside a segment.
//!
//! ```rust
//! use serde_richjson::path::{self, Path};
//!
//! let p = Path::root().child("a.b").child(0);
//! assert_eq!(path::stringify(&p), r"a\.b.0");
//! assert_eq!(path::parse(r"a\.b.0").unwrap(), p);
//! ```

use crate::{Error, Result};
use std::fmt;

/// One segment of a [`Path`].
///
/// Parsed paths only ever contain [`PathKey::Key`]; containers that are
/// addressed by position read numeric keys through [`PathKey::as_index`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathKey {
    Index(usize),
    Key(String),
}

impl PathKey {
    /// Returns the segment as a position, if it is one.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathKey::Index(i) => Some(*i),
            PathKey::Key(k) => {
                // "01" and "+1" are record keys, not positions
                if k == "0" || (!k.starts_with('0') && k.bytes().all(|b| b.is_ascii_digit())) {
                    k.parse().ok()
                } else {
                    None
                }
            }
        }
    }

    #[must_use]
    pub fn is(&self, key: &str) -> bool {
        match self {
            PathKey::Index(_) => false,
            PathKey::Key(k) => k == key,
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Index(i) => write!(f, "{}", i),
            PathKey::Key(k) => f.write_str(k),
        }
    }
}

impl From<usize> for PathKey {
    fn from(value: usize) -> Self {
        PathKey::Index(value)
    }
}

impl From<&str> for PathKey {
    fn from(value: &str) -> Self {
        PathKey::Key(value.to_string())
    }
}

impl From<String> for PathKey {
    fn from(value: String) -> Self {
        PathKey::Key(value)
    }
}

/// An ordered sequence of keys locating a node in a value tree.
///
/// Index and key segments with the same text address the same node once
/// stringified, so equality is decided on the textual form.
#[derive(Clone, Debug, Default, Eq)]
pub struct Path(Vec<PathKey>);

impl Path {
    /// The empty path, addressing the root.
    #[must_use]
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Returns a new path extended by one segment.
    #[must_use]
    pub fn child(&self, key: impl Into<PathKey>) -> Self {
        let mut keys = Vec::with_capacity(self.0.len() + 1);
        keys.extend(self.0.iter().cloned());
        keys.push(key.into());
        Path(keys)
    }

    pub fn push(&mut self, key: impl Into<PathKey>) {
        self.0.push(key.into());
    }

    #[must_use]
    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends every segment of `other`.
    #[must_use]
    pub fn join(&self, other: &Path) -> Self {
        let mut keys = self.0.clone();
        keys.extend(other.0.iter().cloned());
        Path(keys)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| a == b || a.to_string() == b.to_string())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify(self))
    }
}

impl<K: Into<PathKey>> FromIterator<K> for Path {
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<PathKey>> for Path {
    fn from(keys: Vec<PathKey>) -> Self {
        Path(keys)
    }
}

/// Escapes one segment: `\` becomes `\\`, `.` becomes `\.`.
#[must_use]
pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '.' => out.push_str("\\."),
            _ => out.push(ch),
        }
    }
    out
}

/// Joins the escaped segments of `path` with `.`.
#[must_use]
pub fn stringify(path: &Path) -> String {
    path.0
        .iter()
        .map(|key| escape_key(&key.to_string()))
        .collect::<Vec<_>>()
        .join(".")
}

/// Parses a stringified path with the strict escaping rules.
///
/// Every string names at least one segment: `""` is the single empty key. The
/// root has no string form; the wire addresses it structurally.
///
/// # Errors
///
/// Fails with [`Error::InvalidPath`] on a trailing backslash or a backslash
/// followed by anything but `\` or `.`.
pub fn parse(s: &str) -> Result<Path> {
    let mut keys = Vec::new();
    let mut segment = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped @ ('\\' | '.')) => segment.push(escaped),
                Some(_) => return Err(Error::invalid_path(s, "invalid escape sequence")),
                None => return Err(Error::invalid_path(s, "trailing backslash")),
            },
            '.' => keys.push(PathKey::Key(std::mem::take(&mut segment))),
            _ => segment.push(ch),
        }
    }
    keys.push(PathKey::Key(segment));

    Ok(Path(keys))
}

/// Parses a path written with the older dot-only escaping.
///
/// `\.` is a literal dot; every other backslash is kept as-is.
#[cfg(feature = "legacy-paths")]
#[must_use]
pub fn parse_legacy(s: &str) -> Path {
    let mut keys = Vec::new();
    let mut segment = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'.') => {
                chars.next();
                segment.push('.');
            }
            '.' => keys.push(PathKey::Key(std::mem::take(&mut segment))),
            _ => segment.push(ch),
        }
    }
    keys.push(PathKey::Key(segment));

    Path(keys)
}

/// Parses `s` with the escaping rules selected by `syntax`.
pub fn parse_with(s: &str, syntax: crate::PathSyntax) -> Result<Path> {
    match syntax {
        crate::PathSyntax::Strict => parse(s),
        #[cfg(feature = "legacy-paths")]
        crate::PathSyntax::Legacy => Ok(parse_legacy(s)),
    }
}

/// Rejects paths that would reach an object's prototype or constructor chain.
///
/// # Errors
///
/// [`Error::PrototypePollution`] if any segment is `__proto__`, or a
/// `constructor` segment is directly followed by `prototype`.
pub fn check_safe(path: &Path) -> Result<()> {
    let keys = path.keys();
    for (i, key) in keys.iter().enumerate() {
        if key.is("__proto__") {
            return Err(Error::prototype_pollution(stringify(path)));
        }
        if key.is("constructor") && keys.get(i + 1).map_or(false, |next| next.is("prototype")) {
            return Err(Error::prototype_pollution(stringify(path)));
        }
    }
    Ok(())
}
