use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("API key is required but none was provided")]
    MissingCredential,

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
