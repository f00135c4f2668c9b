//! Host-independent declaration views for Rust code generators.
//!
//! A generator written against this crate runs unmodified inside a procedural
//! macro, a build script, or an editor integration. Each of those hosts has
//! its own adapter crate translating its native declarations into the views
//! defined here.
//!
//! # Module Organization
//!
//! - [`element`] - The capability surface (Element, Field, Class, Method)
//! - [`host`] - Host sessions as seen by the run driver
//! - [`types`] / [`annotation`] - Type descriptors and annotation occurrences
//! - [`scope`] - Path qualification shared by all hosts
//! - [`environment`] / [`logger`] - Per-run context and diagnostic sinks
//! - [`generator`] - The consumer boundary and run driver

pub mod annotation;
pub mod diagnostic;
pub mod element;
pub mod environment;
pub mod error;
pub mod generator;
pub mod host;
pub mod logger;
pub mod scope;
pub mod types;
pub mod utils;

pub use annotation::{Annotation, AnnotationArg, Annotations, parse_arguments};
pub use diagnostic::{Diagnostic, Severity};
pub use element::{Class, ClassKind, Element, Field, Method, Parameter, Receiver, Visibility};
pub use environment::{Environment, EnvironmentBuilder, RunMemo};
pub use error::{Error, Result, UnresolvedReason};
pub use generator::{Artifact, Generator, MemorySink, Sink, run};
pub use host::Host;
pub use logger::{DiagnosticLogger, Logger, TracingLogger};
pub use scope::{CRATE_ROOT, PathResolver, Resolved, Scope};
pub use types::TypeRef;
