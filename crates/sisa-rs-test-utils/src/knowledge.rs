//! Mock knowledge provider.

use async_trait::async_trait;
use sisa_rs_knowledge::{KnowledgeError, KnowledgeProvider, Snippet};

/// Knowledge provider that returns a fixed snippet list.
#[derive(Debug, Clone, Default)]
pub struct StubKnowledge {
    snippets: Vec<Snippet>,
}

impl StubKnowledge {
    pub fn new(snippets: Vec<Snippet>) -> Self {
        Self { snippets }
    }

    /// Provider that returns nothing, for tests that ignore retrieval.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeProvider for StubKnowledge {
    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<Snippet>, KnowledgeError> {
        let mut snippets = self.snippets.clone();
        snippets.truncate(top_k);
        Ok(snippets)
    }
}
