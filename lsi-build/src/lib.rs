//! Build-script host for lsi.
//!
//! A build script can read every source file of its crate before the crate is
//! compiled. [`SymbolIndex`] collects those files, [`BuildHost`] exposes the
//! structs and enums they declare through the common views.
//!
//! ```ignore
//! fn main() -> miette::Result<()> {
//!     let src = Path::new(&env::var("CARGO_MANIFEST_DIR").into_diagnostic()?).join("src");
//!     println!("cargo::rerun-if-changed={}", src.display());
//!     let index = SymbolIndex::from_src_dir(&src)?;
//!     let manifest = fs::read_to_string("Cargo.toml").into_diagnostic()?;
//!     let env = Environment::builder()
//!         .options(options_from_manifest(&manifest)?)
//!         .logger(Rc::new(CargoLogger::stdout()))
//!         .build();
//!     let host = BuildHost::new(&index, &env);
//!     let mut sink = MemorySink::new();
//!     lsi_core::run(&host, &env, &MyGenerator, &mut sink)?;
//!     Ok(())
//! }
//! ```

mod class;
mod error;
mod host;
mod index;
mod logger;
mod manifest;
mod resolve;

pub use class::{BuildClass, BuildField, BuildMethod};
pub use error::{BuildError, Result};
pub use host::BuildHost;
pub use index::{SourceFile, SymbolIndex, module_path_for};
pub use logger::CargoLogger;
pub use manifest::options_from_manifest;
