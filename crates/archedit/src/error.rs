//! Error types for editing operations.
//!
//! This module provides [`EditError`], returned by every operation of the
//! [`Editor`](crate::Editor).

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use archedit_core::{kind::KindError, path::PathError};
use archedit_parser::ParseError;

use crate::snippet::SnippetError;

/// Where text that failed to parse came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOrigin {
    /// A model file of the package.
    File(PathBuf),
    /// The declaration code passed to an operation.
    Snippet,
}

impl fmt::Display for ParseOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Snippet => f.write_str("declaration code"),
        }
    }
}

/// The main error type for editing operations.
///
/// # Diagnostic Variants
///
/// `Parse` and `Invariant` keep the text that failed to parse next to the
/// [`ParseError`] so callers can render labelled source snippets.
/// `Parse` blames the caller's input or a model file on disk; `Invariant`
/// means an edit produced text that no longer parses, which is a bug in the
/// editor rather than in the input.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("syntax error in {origin}: {err}")]
    Parse {
        origin: ParseOrigin,
        err: ParseError,
        src: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("edit of `{}` produced invalid source: {err}", path.display())]
    Invariant {
        path: PathBuf,
        err: ParseError,
        src: String,
    },

    #[error("`{}` already contains model files", .0.display())]
    AlreadyExists(PathBuf),
}

impl EditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(origin: ParseOrigin, err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            origin,
            err,
            src: src.into(),
        }
    }

    /// The parse error and the text it refers to, for `Parse` and
    /// `Invariant`.
    pub fn diagnostics(&self) -> Option<(&ParseError, &str)> {
        match self {
            Self::Parse { err, src, .. } | Self::Invariant { err, src, .. } => Some((err, src)),
            _ => None,
        }
    }
}

impl From<PathError> for EditError {
    fn from(err: PathError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<SnippetError> for EditError {
    fn from(err: SnippetError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<KindError> for EditError {
    fn from(err: KindError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
