//! Hosts built over the same source.

use eyre::{Result, WrapErr};
use lsi_build::{BuildHost, SymbolIndex};
use lsi_core::{Environment, Host};
use lsi_editor::{EditorDocument, EditorHost};
use lsi_macro::MacroHost;

/// Run `check` against the macro, build and editor hosts, each with a fresh
/// default environment.
pub fn each_host(source: &str, check: impl FnMut(&dyn Host, &Environment) -> Result<()>) -> Result<()> {
    each_host_in(source, Environment::new, check)
}

/// Run `check` against every host, giving each its own environment from
/// `make_env`.
///
/// The source stands for the crate root: the macro host sees it as a parsed
/// file, the build host as `lib.rs` of an index, the editor host as an open
/// document.
pub fn each_host_in(
    source: &str,
    make_env: impl Fn() -> Environment,
    mut check: impl FnMut(&dyn Host, &Environment) -> Result<()>,
) -> Result<()> {
    let file = syn::parse_file(source).wrap_err("fixture is not valid Rust")?;
    let env = make_env();
    check(&MacroHost::new(&file), &env).wrap_err("macro host")?;

    let mut index = SymbolIndex::new();
    index.add_source("lib.rs", source);
    let env = make_env();
    check(&BuildHost::new(&index, &env), &env).wrap_err("build host")?;

    let doc = EditorDocument::open(source)?;
    let env = make_env();
    check(&EditorHost::new(&doc).with_environment(&env), &env).wrap_err("editor host")?;
    Ok(())
}
