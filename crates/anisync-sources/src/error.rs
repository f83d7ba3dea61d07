use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {service} response: {message}")]
    Decode { service: String, message: String },

    #[error("Not authenticated with {0}")]
    NotAuthenticated(String),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        SourceError::Other(message.into())
    }

    pub fn decode(service: &str, err: impl std::fmt::Display) -> Self {
        SourceError::Decode {
            service: service.to_string(),
            message: err.to_string(),
        }
    }
}
