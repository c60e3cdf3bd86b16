//! Error types for refspec parsing and matching.

use thiserror::Error;

/// Errors produced while parsing or applying a refspec.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RefSpecError {
    /// The refspec string has an invalid shape. Not retryable: the
    /// configuration that produced it must be fixed.
    #[error("malformed refspec {spec:?}: {reason}")]
    Malformed { spec: String, reason: String },

    /// A reference name was transformed through a refspec it does not match.
    #[error("refspec {spec:?} does not match {name:?}")]
    NoMatch { spec: String, name: String },
}

impl RefSpecError {
    pub(crate) fn malformed(spec: &str, reason: impl Into<String>) -> Self {
        RefSpecError::Malformed {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for refspec operations.
pub type Result<T> = std::result::Result<T, RefSpecError>;
