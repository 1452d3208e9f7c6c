//! Knowledge service with degraded-mode fallback.

use crate::error::KnowledgeError;
use crate::model::Snippet;
use crate::provider::{KnowledgeProvider, StaticKnowledge};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

/// Front door for similarity search: prefers the remote index when one is
/// configured, and answers from the static index when the remote is absent
/// or failing. A degraded search never fails the caller's turn.
pub struct KnowledgeService {
    remote: Option<Arc<dyn KnowledgeProvider>>,
    fallback: StaticKnowledge,
    default_top_k: usize,
}

impl KnowledgeService {
    /// Build a service backed only by the static index.
    pub fn static_only(default_top_k: usize) -> Self {
        Self {
            remote: None,
            fallback: StaticKnowledge::new(),
            default_top_k,
        }
    }

    /// Build a service preferring the given remote index.
    pub fn with_remote(remote: Arc<dyn KnowledgeProvider>, default_top_k: usize) -> Self {
        Self {
            remote: Some(remote),
            fallback: StaticKnowledge::new(),
            default_top_k,
        }
    }

    /// Default number of snippets returned when callers do not override.
    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }
}

#[async_trait]
impl KnowledgeProvider for KnowledgeService {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>, KnowledgeError> {
        if let Some(remote) = &self.remote {
            match remote.search(query, top_k).await {
                Ok(snippets) => return Ok(snippets),
                Err(err) => {
                    warn!("remote knowledge search failed, using static fallback: {err}");
                }
            }
        }
        self.fallback.search(query, top_k).await
    }
}
