//! Knowledge provider implementations.

use crate::error::KnowledgeError;
use crate::model::Snippet;
use async_trait::async_trait;
use log::debug;
use serde_json::json;

#[async_trait]
/// Similarity-search abstraction used by the agent handlers.
pub trait KnowledgeProvider: Send + Sync {
    /// Return up to `top_k` snippets ranked by descending score.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>, KnowledgeError>;
}

/// Deterministic in-process index used when no remote index is configured.
///
/// Matching is a naive lower-cased substring test against trigger words,
/// not a real vector search; scores are fixed per entry so results are
/// reproducible across runs.
#[derive(Debug, Clone)]
pub struct StaticKnowledge {
    entries: Vec<StaticEntry>,
}

#[derive(Debug, Clone)]
struct StaticEntry {
    id: &'static str,
    triggers: &'static [&'static str],
    content: &'static str,
    score: f64,
    category: &'static str,
}

impl StaticKnowledge {
    /// Build the canned snippet index.
    pub fn new() -> Self {
        Self {
            entries: vec![
                StaticEntry {
                    id: "dest-japan",
                    triggers: &["japan", "japón", "japon", "tokio", "tokyo"],
                    content: "Japón en primavera: los cerezos florecen entre finales de marzo \
                              y principios de abril. Kioto y Tokio concentran los mejores \
                              festivales hanami; reserva alojamiento con meses de antelación.",
                    score: 0.95,
                    category: "destination",
                },
                StaticEntry {
                    id: "dest-beach",
                    triggers: &["beach", "playa", "costa", "caribe"],
                    content: "Destinos de playa: el Caribe ofrece aguas cálidas todo el año; \
                              en Ecuador, Montañita y Salinas son las playas más visitadas, \
                              con temporada alta de diciembre a abril.",
                    score: 0.89,
                    category: "destination",
                },
                StaticEntry {
                    id: "tips-budget",
                    triggers: &["budget", "presupuesto", "barato", "cheap", "económico", "economico"],
                    content: "Viajar con poco presupuesto: usa transporte público, hospédate \
                              en hostales con cocina compartida y come en mercados locales. \
                              Reservar buses con anticipación reduce el costo hasta un 30%.",
                    score: 0.87,
                    category: "tips",
                },
                StaticEntry {
                    id: "tips-seasonal",
                    triggers: &["clima", "temporada", "season", "weather", "cuándo", "cuando"],
                    content: "Temporadas en Ecuador: la sierra es templada todo el año; la \
                              costa tiene su estación seca de junio a noviembre; Galápagos se \
                              visita mejor entre diciembre y mayo.",
                    score: 0.82,
                    category: "tips",
                },
            ],
        }
    }
}

impl Default for StaticKnowledge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeProvider for StaticKnowledge {
    /// Match trigger words against the query; never fails.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>, KnowledgeError> {
        let query = query.to_lowercase();
        let mut snippets: Vec<Snippet> = self
            .entries
            .iter()
            .filter(|entry| entry.triggers.iter().any(|trigger| query.contains(trigger)))
            .map(|entry| Snippet {
                id: entry.id.to_string(),
                content: entry.content.to_string(),
                score: entry.score,
                metadata: json!({ "source": "static", "category": entry.category }),
            })
            .collect();
        snippets.sort_by(|a, b| b.score.total_cmp(&a.score));
        snippets.truncate(top_k);
        debug!(
            "static knowledge search (query_len={}, returned={})",
            query.len(),
            snippets.len()
        );
        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn static_search_matches_substring_triggers() {
        let index = StaticKnowledge::new();
        let snippets = index
            .search("busca destinos de playa con presupuesto bajo", 3)
            .await
            .expect("search");
        let ids: Vec<&str> = snippets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["dest-beach", "tips-budget"]);
    }

    #[tokio::test]
    async fn static_search_is_deterministic_and_ranked() {
        let index = StaticKnowledge::new();
        let first = index.search("playa barata en el caribe", 10).await.expect("a");
        let second = index.search("playa barata en el caribe", 10).await.expect("b");
        assert_eq!(first, second);
        assert!(first.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[tokio::test]
    async fn static_search_honors_top_k() {
        let index = StaticKnowledge::new();
        let snippets = index
            .search("playa con buen clima y presupuesto bajo", 1)
            .await
            .expect("search");
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].id, "dest-beach");
    }

    #[tokio::test]
    async fn unmatched_query_returns_empty() {
        let index = StaticKnowledge::new();
        let snippets = index.search("xyzzy", 3).await.expect("search");
        assert!(snippets.is_empty());
    }
}
