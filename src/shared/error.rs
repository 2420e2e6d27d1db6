use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Calculation Error: {0}")]
    Calculation(String),

    #[error("Validation Error: {0}")]
    Validation(String),

    /// An aggregate was requested over an empty set of records.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Plain-message rejection, shown to the user as-is.
    #[error("{0}")]
    Rejected(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Unknown Error: {0}")]
    Unknown(String),
}

impl AppError {
    /// The message without the variant prefix, as surfaced to notifications.
    pub fn message(&self) -> &str {
        match self {
            AppError::Io(msg)
            | AppError::Network(msg)
            | AppError::Storage(msg)
            | AppError::Calculation(msg)
            | AppError::Validation(msg)
            | AppError::EmptyInput(msg)
            | AppError::Rejected(msg)
            | AppError::Config(msg)
            | AppError::Unknown(msg) => msg,
        }
    }
}

// Implement conversion from standard errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Serialization error: {}", err))
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Unknown(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Unknown(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
