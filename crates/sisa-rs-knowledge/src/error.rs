//! Error types for similarity-search operations.

/// Errors returned by knowledge providers.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// The remote index rejected or failed the query.
    #[error("remote index error: {0}")]
    Remote(String),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
