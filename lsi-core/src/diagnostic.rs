//! Diagnostic records collected during a run.

use serde::Serialize;

use crate::error::Error;

/// How loud a logged message is. Ordered from quietest to loudest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress information.
    Info,
    /// The run continues.
    Warning,
    /// Must reach the host's failure channel.
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged message, tied to a declaration when it concerns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Qualified declaration, e.g. `crate::model::User.email`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            declaration: None,
        }
    }

    /// What a consumer logs for a view error it does not propagate.
    /// Unresolved declarations are warnings; adapter mismatches are errors.
    pub fn from_error(err: &Error) -> Self {
        let severity = if err.is_fatal() {
            Severity::Error
        } else {
            Severity::Warning
        };
        Self {
            severity,
            message: err.to_string(),
            declaration: err.declaration().map(String::from),
        }
    }

    pub fn about(mut self, declaration: impl Into<String>) -> Self {
        self.declaration = Some(declaration.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnresolvedReason;

    #[test]
    fn test_from_unresolved_error() {
        let err = Error::unresolved(
            "crate::model::User.email",
            UnresolvedReason::UnknownType("Email".into()),
        );
        let diag = Diagnostic::from_error(&err);
        assert!(diag.severity.is_warning());
        assert_eq!(diag.declaration.as_deref(), Some("crate::model::User.email"));
        assert_eq!(
            diag.to_string(),
            "warning: unresolved symbol in `crate::model::User.email`: cannot find type `Email` in this scope"
        );
    }

    #[test]
    fn test_mismatch_is_an_error() {
        let diag = Diagnostic::from_error(&Error::mismatch("class", "function `main`"));
        assert!(diag.severity.is_error());
        assert_eq!(diag.declaration, None);
    }

    #[test]
    fn test_severity_order_and_json() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        let diag = Diagnostic::new(Severity::Info, "indexed 3 files");
        assert_eq!(
            serde_json::to_string(&diag).unwrap(),
            r#"{"severity":"info","message":"indexed 3 files"}"#
        );
        let diag = diag.about("crate");
        assert_eq!(diag.declaration.as_deref(), Some("crate"));
    }
}
