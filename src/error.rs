// src/error.rs
use thiserror::Error;

/// Run-level failures. Anything recovered per source or per candidate never
/// reaches this type; it is logged and counted where it happens.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),

    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IngestError {
    /// Configuration errors abort a run before any source is touched
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey(_) | Self::UnknownCountry(_))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingApiKey(_) => "CONFIGURATION_ERROR",
            Self::UnknownCountry(_) => "UNKNOWN_COUNTRY",
            Self::InvalidRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingApiKey(key) => vec![
                format!("Set {} in the server environment", key),
                "Restart the server after updating the environment".to_string(),
            ],
            Self::UnknownCountry(_) => {
                vec!["Use one of the configured country codes, e.g. ZA".to_string()]
            }
            Self::InvalidRequest(_) => vec!["Check your request JSON format".to_string()],
            Self::NotFound(_) => vec!["Verify the identifier is correct".to_string()],
            Self::Database(_) | Self::Internal(_) => vec![
                "Try again in a few moments".to_string(),
                "Check the server logs for details".to_string(),
            ],
        }
    }
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
