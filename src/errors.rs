use serde::Serialize;

/// Error taxonomy shared by every service in the core.
///
/// Callers branch on the variant; bulk reports carry the `Display` text
/// verbatim per item.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum ServiceError {
    /// Malformed or missing input; not recoverable without caller correction.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A referenced identifier does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation violates a state invariant (double clock-in, missing
    /// evidence, deleting a job with live time entries, schedule overlap).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The requested transition is not legal from the entity's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The actor's role does not permit the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An event could not be dispatched.
    #[error("Event error: {0}")]
    EventError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Stable machine-readable kind, used by bulk reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::InvalidState(_) => "invalid_state",
            Self::Forbidden(_) => "forbidden",
            Self::EventError(_) => "event_error",
        }
    }
}
