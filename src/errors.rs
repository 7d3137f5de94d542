use serde::Serialize;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Shorthand for the not-found case raised by every id lookup.
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {} not found", kind, id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Only backend failures are worth retrying with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Returns the error message suitable for showing to the shopper.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "The item you selected no longer exists".to_string(),
            Self::Persistence(_) => "Could not save your changes, please try again".to_string(),
            Self::EventError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Something went wrong".to_string()
            }
            Self::ValidationError(msg) | Self::InvalidOperation(msg) => msg.clone(),
        }
    }
}
