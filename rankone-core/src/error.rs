use rankone_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Encoding probe failed: {0}")]
    ProbeFailure(String),

    #[error(
        "Stored report{} could not be decoded: {message}",
        .node_id.map(|id| format!(" for node {}", id)).unwrap_or_default()
    )]
    SerializationFailure { node_id: Option<i64>, message: String },

    #[error("Report store error: {0}")]
    StoreError(#[from] rusqlite::Error),

    #[error("Report store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Retrieval failed: {0}")]
    ScanError(#[from] ScanError),

    #[error("Analysis failed: {0}")]
    AnalysisFailure(String),
}

impl EngineError {
    pub fn serialization(message: impl Into<String>) -> Self {
        EngineError::SerializationFailure {
            node_id: None,
            message: message.into(),
        }
    }

    /// Attaches the node whose record failed to decode.
    pub fn for_node(self, id: i64) -> Self {
        match self {
            EngineError::SerializationFailure { message, .. } => {
                EngineError::SerializationFailure {
                    node_id: Some(id),
                    message,
                }
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
