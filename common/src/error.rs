use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unrecognized event type: '{0}'")]
    UnrecognizedEventType(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("Failed to compress records: {0}")]
    Compress(#[from] std::io::Error),

    #[error("Failed to store {key}: {reason}")]
    Store { key: String, reason: String },

    #[error("Failed to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidPayload(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::InvalidPayload(err.to_string())
    }
}
