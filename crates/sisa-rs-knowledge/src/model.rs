//! Snippet model returned by knowledge providers.

use serde::{Deserialize, Serialize};

/// One ranked text snippet returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    /// Stable identifier within the index.
    pub id: String,
    /// Snippet text surfaced to prompt scaffolding.
    pub content: String,
    /// Similarity score in [0, 1], higher is closer.
    pub score: f64,
    /// Source metadata (origin, category, destination).
    pub metadata: serde_json::Value,
}
