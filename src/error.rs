use thiserror::Error;

pub type Result<T> = std::result::Result<T, TemplateCopyError>;

#[derive(Debug, Error)]
pub enum TemplateCopyError {
    #[error("Failed to load folder: {message}")]
    FetchFailed { message: String },

    #[error("Failed to create document: {message}")]
    CopyFailed { message: String },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Not a folder: {0}")]
    NotAContainer(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(#[from] crate::file_name::FileNameError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Generic(String),
}

/// Failures reported by a [`crate::repository::Repository`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<String> for TemplateCopyError {
    fn from(error: String) -> Self {
        TemplateCopyError::Generic(error)
    }
}

impl From<&str> for TemplateCopyError {
    fn from(error: &str) -> Self {
        TemplateCopyError::Generic(error.to_string())
    }
}

impl From<Box<dyn std::error::Error>> for TemplateCopyError {
    fn from(error: Box<dyn std::error::Error>) -> Self {
        TemplateCopyError::Generic(error.to_string())
    }
}
