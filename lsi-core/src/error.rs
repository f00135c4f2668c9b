//! Error conditions raised by host adapters.
//!
//! Unsupported capabilities never show up here: adapters answer those with
//! documented defaults. What remains is a declaration its host could not
//! resolve, and host glue wrapping the wrong native shape.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for view queries.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a host could not resolve a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// A type path that no scope entry provides.
    UnknownType(String),
    /// A path that should exist in the host's index but does not.
    MissingReference(String),
    /// The host reports the declaration itself as erroneous (syntax errors,
    /// missing nodes, unparsable files).
    Erroneous(String),
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnresolvedReason::UnknownType(path) => {
                write!(f, "cannot find type `{}` in this scope", path)
            }
            UnresolvedReason::MissingReference(path) => {
                write!(f, "`{}` does not refer to any known declaration", path)
            }
            UnresolvedReason::Erroneous(detail) => write!(f, "erroneous declaration: {}", detail),
        }
    }
}

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum Error {
    #[error("unresolved symbol in `{declaration}`: {reason}")]
    #[diagnostic(
        code(lsi::unresolved_symbol),
        help("skip this declaration or abort the run; the host could not resolve it")
    )]
    Unresolved {
        declaration: String,
        reason: UnresolvedReason,
    },

    #[error("cannot wrap {found} as a {expected} view")]
    #[diagnostic(
        code(lsi::adapter_mismatch),
        help("this is a host integration bug: the glue passed the wrong native declaration")
    )]
    AdapterMismatch {
        expected: &'static str,
        found: String,
    },
}

impl Error {
    /// Create an unresolved-symbol error for a declaration.
    pub fn unresolved(declaration: impl Into<String>, reason: UnresolvedReason) -> Self {
        Error::Unresolved {
            declaration: declaration.into(),
            reason,
        }
    }

    /// Create an adapter-construction mismatch.
    pub fn mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Error::AdapterMismatch {
            expected,
            found: found.into(),
        }
    }

    /// Returns true for unresolved-symbol conditions.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Error::Unresolved { .. })
    }

    /// Returns true if the run must halt. Only adapter mismatches are fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::AdapterMismatch { .. })
    }

    /// The declaration an unresolved-symbol error names.
    pub fn declaration(&self) -> Option<&str> {
        match self {
            Error::Unresolved { declaration, .. } => Some(declaration),
            Error::AdapterMismatch { .. } => None,
        }
    }
}
