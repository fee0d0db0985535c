use thiserror::Error;

pub type MortgageResult<T> = Result<T, MortgageError>;

#[derive(Debug, Error)]
pub enum MortgageError {
    #[error("invalid input: {field} {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl MortgageError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MortgageError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
