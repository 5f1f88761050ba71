//! Setup-time errors.
//!
//! Every variant is fatal: the pipeline stops at the first one and the
//! server never binds. Messages carry the handler name and source path so
//! the operator can fix the offending annotation directly.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Fatal error raised while discovering, resolving or validating routes.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid HTTP verb `{verb}` on handler `{handler}` in {}", file.display())]
    InvalidVerb {
        verb: String,
        handler: String,
        file: PathBuf,
    },

    #[error(
        "route conflict on {verb} {path}: `{first_handler}` in {} and `{second_handler}` in {}",
        first.display(),
        second.display()
    )]
    RouteConflict {
        path: String,
        verb: String,
        first: PathBuf,
        first_handler: String,
        second: PathBuf,
        second_handler: String,
    },

    #[error("invalid route path {path} on handler `{handler}` in {}: {detail}", file.display())]
    InvalidPath {
        path: String,
        detail: String,
        handler: String,
        file: PathBuf,
    },

    #[error("unsupported export shape in {}: {detail}", file.display())]
    UnsupportedExport { file: PathBuf, detail: String },

    #[error(
        "handler `{handler}` in {} declares a file upload but accepts no body-capable verb",
        file.display()
    )]
    UploadWithoutBodyVerb { handler: String, file: PathBuf },

    #[error("handler `{handler}` in {} declares a file upload but uploads are disabled", file.display())]
    UploadsDisabled { handler: String, file: PathBuf },

    #[error("no route module registered for {}", file.display())]
    ModuleNotRegistered { file: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SetupError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}
