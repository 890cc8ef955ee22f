//! Error taxonomy for the completion engine
//!
//! Every variant is recoverable. Internal steps propagate these with `?`, and the
//! session entry points absorb them (logging at debug level) so the editing host
//! only ever sees an empty candidate list.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// A class, member, or delimiter could not be located
    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    /// Source text did not match the expected declaration grammar
    #[error("malformed source in {origin}: {reason}")]
    MalformedSource { origin: String, reason: String },

    /// The bundled source archive could not be located or opened
    #[error("source archive unavailable: {0}")]
    BackendUnavailable(String),

    /// A cached model no longer matches its backing file
    #[error("cached model for {0} is stale")]
    StaleCache(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read archive '{path}': {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CompletionError {
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only means "nothing to offer here"
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::MalformedSource { .. } | Self::StaleCache(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CompletionError>;
