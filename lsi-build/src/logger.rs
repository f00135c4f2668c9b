use std::{cell::RefCell, io::Write};

use lsi_core::{Logger, Severity};

/// Logger for build scripts.
///
/// Warnings and errors are written as cargo directives, so cargo shows them
/// to the user and fails the build on errors. Info messages go to `tracing`,
/// since cargo hides build-script stdout.
pub struct CargoLogger<W: Write = std::io::Stdout> {
    out: RefCell<W>,
}

impl CargoLogger {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> CargoLogger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> Logger for CargoLogger<W> {
    fn log(&self, severity: Severity, message: &str) {
        let directive = match severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => {
                tracing::info!(target: "lsi::build", "{}", message);
                return;
            }
        };
        let Ok(mut out) = self.out.try_borrow_mut() else {
            return;
        };
        // Directives are line based, so each line of a message gets its own.
        for line in message.lines() {
            let _ = writeln!(out, "cargo::{}={}", directive, line);
        }
    }
}
