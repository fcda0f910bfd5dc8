use thiserror::Error;

#[derive(Debug, Error)]
pub enum LanesError {
    #[error("Malformed board data: {0}")]
    MalformedData(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Card text must not be empty")]
    EmptyCardText,

    #[error("Render failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LanesError>;
