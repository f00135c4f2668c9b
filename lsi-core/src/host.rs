//! The face a host session shows to the run driver and the conformance suite.

use crate::{
    element::{Class, Element},
    error::Result,
};

/// One host's view of the declarations visited in a run.
///
/// Implementations construct each adapter at most once per run and hand out
/// references to it, so every consumer in the run observes the same instance.
pub trait Host {
    /// Host identifier (e.g., "macro", "build", "editor").
    fn name(&self) -> &'static str;

    /// The class-like declarations of the run, in visitation order.
    fn declarations(&self) -> Result<Vec<&dyn Element>>;

    /// Look up a class by qualified name. Raises the unresolved-symbol
    /// condition when the host cannot find it.
    fn find_class(&self, qualified_name: &str) -> Result<&dyn Class>;

    /// All class views of the run.
    fn classes(&self) -> Result<Vec<&dyn Class>> {
        Ok(self
            .declarations()?
            .into_iter()
            .filter_map(|d| d.as_class())
            .collect())
    }
}
