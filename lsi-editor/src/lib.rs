//! Editor host for lsi.
//!
//! An editor holds documents that change on every keystroke and are often
//! syntactically incomplete. [`EditorDocument`] keeps a tree-sitter tree in
//! step with the text; [`EditorHost`] exposes the structs and enums of the
//! current revision through the common views in [`lsi_core`].
//!
//! ```ignore
//! let mut doc = EditorDocument::open(text)?;
//! doc.edit(range, "pub id: u64,")?;
//! let logger = Rc::new(DiagnosticLogger::new());
//! let env = Environment::builder().logger(logger.clone()).build();
//! let host = EditorHost::new(&doc).with_root("crate::model");
//! let mut sink = MemorySink::new();
//! lsi_core::run(&host, &env, &MyGenerator, &mut sink)?;
//! publish(logger.diagnostics());
//! ```

mod class;
mod document;
mod host;
mod outline;
mod syntax;

pub use class::{EditorClass, EditorField, EditorMethod};
pub use document::{DocumentError, EditorDocument};
pub use host::EditorHost;
