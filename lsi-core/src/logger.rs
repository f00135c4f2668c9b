//! Diagnostic sinks.
//!
//! A [`Logger`] wraps one host's diagnostic channel. `error` must reach the
//! host's failure channel; `info` and `warn` are advisory. Logging never
//! fails a run: sinks ignore their own I/O errors, and the
//! [`Environment`](crate::Environment) swallows panics from any sink.

use std::{
    cell::RefCell,
    panic::{AssertUnwindSafe, catch_unwind},
    rc::Rc,
};

use crate::{
    diagnostic::{Diagnostic, Severity},
    error::Error,
};

/// A diagnostic sink. Invoked synchronously on the host's processing thread.
pub trait Logger {
    fn log(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    /// Log a structured diagnostic. Plain sinks only see its message.
    fn record(&self, diagnostic: Diagnostic) {
        self.log(diagnostic.severity, &diagnostic.message);
    }

    /// Log a view error the consumer chose not to propagate.
    fn report(&self, err: &Error) {
        self.record(Diagnostic::from_error(err));
    }
}

/// Forwards to `tracing` under the `lsi` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => tracing::error!(target: "lsi", "{}", message),
            Severity::Warning => tracing::warn!(target: "lsi", "{}", message),
            Severity::Info => tracing::info!(target: "lsi", "{}", message),
        }
    }
}

/// Collects diagnostics in memory. Hosts without a dedicated channel (and
/// tests) read them back after the run.
#[derive(Debug, Default)]
pub struct DiagnosticLogger {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().iter().any(|d| d.severity.is_error())
    }

    /// Count the number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }

    /// Count the number of warning diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity.is_warning())
            .count()
    }
}

impl Logger for DiagnosticLogger {
    fn log(&self, severity: Severity, message: &str) {
        if let Ok(mut diagnostics) = self.diagnostics.try_borrow_mut() {
            diagnostics.push(Diagnostic::new(severity, message));
        }
    }

    fn record(&self, diagnostic: Diagnostic) {
        if let Ok(mut diagnostics) = self.diagnostics.try_borrow_mut() {
            diagnostics.push(diagnostic);
        }
    }
}

impl<L: Logger + ?Sized> Logger for Rc<L> {
    fn log(&self, severity: Severity, message: &str) {
        (**self).log(severity, message);
    }

    fn record(&self, diagnostic: Diagnostic) {
        (**self).record(diagnostic);
    }
}

/// The environment's guard around a sink: panics are swallowed.
pub(crate) struct GuardedLogger {
    inner: Rc<dyn Logger>,
}

impl GuardedLogger {
    pub(crate) fn new(inner: Rc<dyn Logger>) -> Self {
        Self { inner }
    }
}

impl Logger for GuardedLogger {
    fn log(&self, severity: Severity, message: &str) {
        let inner = &self.inner;
        let _ = catch_unwind(AssertUnwindSafe(|| inner.log(severity, message)));
    }

    fn record(&self, diagnostic: Diagnostic) {
        let inner = &self.inner;
        let _ = catch_unwind(AssertUnwindSafe(|| inner.record(diagnostic)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingLogger;

    impl Logger for PanickingLogger {
        fn log(&self, _severity: Severity, _message: &str) {
            panic!("sink is broken");
        }
    }

    #[test]
    fn test_diagnostic_logger_collects() {
        let logger = DiagnosticLogger::new();
        logger.info("starting");
        logger.warn("no documentation");
        logger.error("unresolved type");

        assert_eq!(logger.diagnostics().len(), 3);
        assert!(logger.has_errors());
        assert_eq!(logger.error_count(), 1);
        assert_eq!(logger.warning_count(), 1);
    }

    #[test]
    fn test_reported_errors_keep_their_declaration() {
        let shared = Rc::new(DiagnosticLogger::new());
        let guarded = GuardedLogger::new(shared.clone());
        guarded.report(&Error::unresolved(
            "crate::Order.buyer",
            crate::error::UnresolvedReason::UnknownType("Customer".into()),
        ));
        let diagnostics = shared.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].severity.is_warning());
        assert_eq!(
            diagnostics[0].declaration.as_deref(),
            Some("crate::Order.buyer")
        );
    }

    #[test]
    fn test_guarded_logger_swallows_panics() {
        let guarded = GuardedLogger::new(Rc::new(PanickingLogger));
        guarded.error("does not propagate");
        guarded.info("still alive");
    }

    #[test]
    fn test_shared_logger_forwards() {
        let shared = Rc::new(DiagnosticLogger::new());
        let as_sink: Rc<dyn Logger> = shared.clone();
        as_sink.warn("through the rc");
        assert_eq!(shared.warning_count(), 1);
    }
}
