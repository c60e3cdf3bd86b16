//! Error types for refspec sources and collections.

use std::sync::Arc;

use gref_spec::{Direction, RefSpecError};
use thiserror::Error;

/// Errors that can occur while loading or querying a remote's refspecs.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The source has no remote by this name. The collection stays unloaded
    /// and a later access tries again.
    #[error("remote not found: {name}")]
    RemoteNotFound { name: String },

    /// Reading the refspec list failed part way. Nothing was retained. The
    /// cause is shared with the collection's failed state.
    #[error("failed to load refspecs of remote {remote}: {source}")]
    Load {
        remote: String,
        source: Arc<RemoteError>,
    },

    /// No refspec of the requested direction matches the name.
    #[error("no {direction} refspec of remote {remote} matches {name}")]
    NotFound {
        remote: String,
        name: String,
        direction: Direction,
    },

    /// The collection was accessed from inside its own load.
    #[error("refspecs of remote {remote} are already being loaded")]
    LoadInProgress { remote: String },

    /// The load was interrupted by a panic in the source. The next access
    /// retries.
    #[error("refspec load of remote {remote} was interrupted")]
    LoadAborted { remote: String },

    /// A handle was asked for an index past its refspec count.
    #[error("refspec index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// The underlying store failed to produce a value.
    #[error("native source error: {0}")]
    Native(String),

    /// The remote configuration document is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A stored refspec failed to parse.
    #[error(transparent)]
    RefSpec(#[from] RefSpecError),

    /// libgit2 failure.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    /// Returns `true` for errors that leave the collection able to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::RemoteNotFound { .. }
                | RemoteError::Load { .. }
                | RemoteError::LoadAborted { .. }
        )
    }
}

/// Convenience type alias for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
