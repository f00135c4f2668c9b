//! The consumer boundary.
//!
//! A [`Generator`] is a code-generation strategy written once against the
//! views. Host glue drives it with [`run`], which hands it the run's
//! declarations, the environment and a host-specific [`Sink`].

use eyre::Result;

use crate::{element::Element, environment::Environment, host::Host};

/// A generated artifact handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Sink-relative path or name (e.g., "ddl/sys_user.sql").
    pub path: String,
    /// Generated text.
    pub content: String,
}

impl Artifact {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Where a host delivers artifacts (files in `OUT_DIR`, tokens returned from a
/// macro, an editor preview pane).
pub trait Sink {
    fn emit(&mut self, artifact: Artifact) -> Result<()>;
}

/// Collects artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Vec<Artifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Get a specific artifact by path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|a| a.path == path)
            .map(|a| a.content.as_str())
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }
}

impl Sink for MemorySink {
    fn emit(&mut self, artifact: Artifact) -> Result<()> {
        self.artifacts.push(artifact);
        Ok(())
    }
}

/// A host-independent code-generation strategy.
pub trait Generator {
    /// Generator identifier (e.g., "ddl", "dict", "routes").
    fn name(&self) -> &'static str;

    /// Generate artifacts for the run's declarations.
    ///
    /// Unresolved declarations are the generator's call: skip them (and log)
    /// or return the error to abort the run.
    fn generate(
        &self,
        declarations: &[&dyn Element],
        env: &Environment,
        sink: &mut dyn Sink,
    ) -> Result<()>;
}

/// Drive one generator over one host's declarations.
///
/// # Errors
///
/// Returns an error if the host cannot list its declarations or the
/// generator aborts the run.
pub fn run(
    host: &dyn Host,
    env: &Environment,
    generator: &dyn Generator,
    sink: &mut dyn Sink,
) -> Result<()> {
    let declarations = host.declarations()?;
    env.logger().info(&format!(
        "{}: running `{}` over {} declarations",
        host.name(),
        generator.name(),
        declarations.len()
    ));

    generator.generate(&declarations, env, sink).map_err(|err| {
        env.logger()
            .error(&format!("{}: `{}` failed: {}", host.name(), generator.name(), err));
        err
    })?;

    env.logger()
        .info(&format!("{}: `{}` finished", host.name(), generator.name()));
    Ok(())
}
