use anisync_sources::SourceError;
use thiserror::Error;

/// Why one sync step produced no update
///
/// None of these abort a run: they are logged and recorded in the
/// per-service outcome.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Mapping data is ambiguous: {0}")]
    ResolutionAmbiguous(String),

    #[error("Could not resolve {0}")]
    ResolutionNotFound(String),

    #[error("{service} call failed: {source}")]
    ExternalCallFailed {
        service: String,
        #[source]
        source: SourceError,
    },

    #[error("Not configured: {0}")]
    ConfigurationMissing(String),

    #[error("Season traversal stopped: {0}")]
    TraversalDeadEnd(String),

    #[error("Sync run exceeded {0} seconds")]
    Timeout(u64),
}

impl SyncError {
    pub fn external(service: &str, source: SourceError) -> Self {
        SyncError::ExternalCallFailed {
            service: service.to_string(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Malformed anime list XML: {0}")]
    Xml(String),

    #[error("Mapping file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mapping download failed: {0}")]
    Download(#[from] SourceError),
}
