use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for index and manifest operations.
pub type Result<T> = std::result::Result<T, Box<BuildError>>;

/// Failures while collecting the sources a build script analyses.
///
/// These are setup failures. Problems inside a declaration are reported
/// through the views as unresolved symbols instead.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("failed to read '{path}'")]
    #[diagnostic(code(lsi::build::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk '{root}'")]
    #[diagnostic(
        code(lsi::build::walk),
        help("the source directory is usually `$CARGO_MANIFEST_DIR/src`")
    )]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to parse Cargo.toml")]
    #[diagnostic(code(lsi::build::manifest))]
    Manifest {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Box<Self> {
        Box::new(BuildError::Io {
            path: path.into(),
            source,
        })
    }

    pub(crate) fn manifest(text: &str, source: toml::de::Error) -> Box<Self> {
        let span = source.span().map(SourceSpan::from);
        Box::new(BuildError::Manifest {
            src: NamedSource::new("Cargo.toml", text.to_string()),
            span,
            source,
        })
    }
}
