use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("graphql errors: {}", .0.join("; "))]
    Graphql(Vec<String>),

    #[error("response is missing {0}")]
    MissingData(&'static str),

    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("image {0} already exists")]
    Duplicate(String),

    #[error("image {0} not found")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T, E = GalleryError> = std::result::Result<T, E>;
