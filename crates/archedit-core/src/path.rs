//! Slash-separated element paths.
//!
//! A path addresses a `SoftwareSystem` (or `Person`), a `Container` inside a
//! system, or a `Component` inside a container:
//!
//! ```
//! use archedit_core::{kind::ElementKind, path::ElementPath};
//!
//! let path = ElementPath::for_kind(ElementKind::Component, "Bank/API/Auth").unwrap();
//! assert_eq!(path.keys(), ["Bank", "API", "Auth"]);
//! assert_eq!(path.parent().unwrap().to_string(), "Bank/API");
//! ```

use std::fmt;

use thiserror::Error;

use crate::kind::ElementKind;

/// Longest path the model supports (System/Container/Component).
pub const MAX_DEPTH: usize = 3;

/// Malformed path supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("path `{path}` has {len} segments, at most {MAX_DEPTH} are supported")]
    TooDeep { path: String, len: usize },

    #[error("{kind} path `{path}` must have {expected} segment(s), found {len}")]
    WrongLength {
        kind: ElementKind,
        path: String,
        expected: usize,
        len: usize,
    },
}

/// An ordered sequence of one to three element keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPath {
    keys: Vec<String>,
}

impl ElementPath {
    /// Parse a slash-separated path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] for empty input, empty segments or paths
    /// deeper than [`MAX_DEPTH`].
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let keys: Vec<String> = trimmed.split('/').map(|k| k.trim().to_string()).collect();
        if keys.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        if keys.len() > MAX_DEPTH {
            return Err(PathError::TooDeep {
                path: path.to_string(),
                len: keys.len(),
            });
        }

        Ok(Self { keys })
    }

    /// Parse a path and check its length against the element kind.
    pub fn for_kind(kind: ElementKind, path: &str) -> Result<Self, PathError> {
        let parsed = Self::parse(path)?;
        if parsed.len() != kind.path_len() {
            return Err(PathError::WrongLength {
                kind,
                path: path.to_string(),
                expected: kind.path_len(),
                len: parsed.len(),
            });
        }
        Ok(parsed)
    }

    /// Build a path from keys already known to be valid.
    pub fn from_keys<I, S>(keys: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        Self::parse(&keys.join("/"))
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Paths are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key of the addressed element.
    pub fn last(&self) -> &str {
        self.keys.last().map(String::as_str).unwrap_or_default()
    }

    /// Path of the enclosing element, `None` for top-level elements.
    pub fn parent(&self) -> Option<ElementPath> {
        if self.keys.len() < 2 {
            return None;
        }
        Some(Self {
            keys: self.keys[..self.keys.len() - 1].to_vec(),
        })
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_key() {
        let path = ElementPath::parse("Internet Banking System").unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path.last(), "Internet Banking System");
        assert!(path.parent().is_none());
    }

    #[test]
    fn test_parse_trims_segments() {
        let path = ElementPath::parse(" Bank / API ").unwrap();
        assert_eq!(path.keys(), ["Bank", "API"]);
        assert_eq!(path.to_string(), "Bank/API");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ElementPath::parse("  "), Err(PathError::Empty));
        assert_eq!(
            ElementPath::parse("A//B"),
            Err(PathError::EmptySegment("A//B".to_string()))
        );
        assert!(matches!(
            ElementPath::parse("A/B/C/D"),
            Err(PathError::TooDeep { len: 4, .. })
        ));
    }

    #[test]
    fn test_for_kind_checks_length() {
        assert!(ElementPath::for_kind(ElementKind::SoftwareSystem, "A").is_ok());
        assert!(ElementPath::for_kind(ElementKind::Container, "A/B").is_ok());

        let err = ElementPath::for_kind(ElementKind::Container, "A").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Container path `A` must have 2 segment(s), found 1"
        );
        assert!(ElementPath::for_kind(ElementKind::Person, "A/B").is_err());
    }

    #[test]
    fn test_parent_chain() {
        let path = ElementPath::parse("A/B/C").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.keys(), ["A", "B"]);
        assert_eq!(parent.parent().unwrap().keys(), ["A"]);
    }

    #[test]
    fn test_from_keys() {
        let path = ElementPath::from_keys(["A", "B"]).unwrap();
        assert_eq!(path.to_string(), "A/B");
        assert!(ElementPath::from_keys(Vec::<String>::new()).is_err());
    }
}
