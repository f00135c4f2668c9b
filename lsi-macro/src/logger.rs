use std::cell::RefCell;

use lsi_core::{Logger, Severity};
use proc_macro2::{Span, TokenStream};

/// Logger for a macro expansion.
///
/// Errors are collected and turned into `compile_error!` invocations at the
/// end of the expansion. Stable proc macros cannot emit warnings, so warnings
/// and info go to `tracing`.
pub struct MacroLogger {
    span: Span,
    errors: RefCell<Option<syn::Error>>,
}

impl MacroLogger {
    /// Errors logged without a span point at `span`, usually the span of the
    /// invoking attribute.
    pub fn new(span: Span) -> Self {
        Self {
            span,
            errors: RefCell::new(None),
        }
    }

    /// Record an error at a specific location.
    pub fn error_at(&self, span: Span, message: &str) {
        self.push(syn::Error::new(span, message));
    }

    fn push(&self, error: syn::Error) {
        let Ok(mut errors) = self.errors.try_borrow_mut() else {
            return;
        };
        match errors.as_mut() {
            Some(existing) => existing.combine(error),
            None => *errors = Some(error),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.borrow().is_some()
    }

    /// Take the collected errors, combined into one.
    pub fn take_error(&self) -> Option<syn::Error> {
        self.errors.borrow_mut().take()
    }

    /// `compile_error!` tokens for every collected error, or an empty stream.
    pub fn to_compile_errors(&self) -> TokenStream {
        self.errors
            .borrow()
            .as_ref()
            .map(syn::Error::to_compile_error)
            .unwrap_or_default()
    }
}

impl Logger for MacroLogger {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => self.push(syn::Error::new(self.span, message)),
            Severity::Warning => tracing::warn!(target: "lsi::macro", "{}", message),
            Severity::Info => tracing::info!(target: "lsi::macro", "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_combined() {
        let logger = MacroLogger::new(Span::call_site());
        assert!(!logger.has_errors());
        assert!(logger.to_compile_errors().is_empty());

        logger.error("first");
        logger.warn("ignored by the compiler");
        logger.error_at(Span::call_site(), "second");
        assert!(logger.has_errors());

        let tokens = logger.to_compile_errors().to_string();
        assert!(tokens.contains("first"));
        assert!(tokens.contains("second"));

        let error = logger.take_error().unwrap();
        assert_eq!(error.into_iter().count(), 2);
        assert!(!logger.has_errors());
    }
}
