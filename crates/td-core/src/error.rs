//! Core error types for the td system.

/// Core error type for all td operations.
///
/// Expected business outcomes (a task id that does not exist, a rename that
/// collides with a sibling, a refused editing lock) are modeled as ordinary
/// return values by their operations, not as variants here; this type covers
/// input validation and data-format faults.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("context names cannot contain '.': {name}")]
    IllegalContextName { name: String },

    #[error("context names cannot be empty")]
    EmptyContextName,

    #[error("the root context cannot be renamed")]
    RenameRoot,

    #[error("invalid moment: {input} (expected YYYY-MM-DD, YYYY-MM-DD HH:MM:SS or a delay such as 2w)")]
    InvalidMoment { input: String },

    #[error("invalid period: {input} (expected [0-9]+[mwdh])")]
    InvalidPeriod { input: String },

    #[error("malformed stored datetime: {value}")]
    MalformedDatetime { value: String },

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    /// Create a new generic error.
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }
}
