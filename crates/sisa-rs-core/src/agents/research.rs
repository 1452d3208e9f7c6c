//! Destination research handler.

use super::{AgentHandler, TurnInput};
use crate::completion::{parse_json_completion, CompletionClient, ResponseMode};
use crate::error::SisaCoreError;
use crate::prompt;
use crate::types::{AgentResponse, TravelSearchDraft};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sisa_rs_knowledge::KnowledgeProvider;
use sisa_rs_protocol::{AgentKind, Handoff};
use std::fmt::Write as _;
use std::sync::Arc;

/// Structured research output requested from the completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    /// Candidate destinations.
    pub destinations: Vec<DestinationSummary>,
    /// Free-form insights about the query.
    #[serde(default)]
    pub insights: Vec<String>,
    /// Source labels.
    #[serde(default)]
    pub sources: Vec<String>,
}

/// One destination proposal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSummary {
    /// Destination name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Highlight bullet points.
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Best season to visit.
    #[serde(default)]
    pub best_time: Option<String>,
    /// Rough cost estimate text.
    #[serde(default)]
    pub estimated_cost: Option<String>,
}

/// Handler that researches destinations and hands off to the planner.
pub struct ResearchAgent {
    completion: Arc<dyn CompletionClient>,
    knowledge: Arc<dyn KnowledgeProvider>,
    knowledge_top_k: usize,
}

impl ResearchAgent {
    /// Build a research handler.
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        knowledge: Arc<dyn KnowledgeProvider>,
        knowledge_top_k: usize,
    ) -> Self {
        Self {
            completion,
            knowledge,
            knowledge_top_k,
        }
    }
}

#[async_trait]
impl AgentHandler for ResearchAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Research
    }

    async fn handle(&self, turn: TurnInput<'_>) -> Result<AgentResponse, SisaCoreError> {
        let snippets = self
            .knowledge
            .search(turn.message, self.knowledge_top_k)
            .await?;
        log::debug!(
            "research context retrieved (conversation_id={}, snippets={})",
            turn.conversation_id,
            snippets.len()
        );

        let system = prompt::research_system();
        let user = prompt::research_user(turn.message, turn.travel, &snippets);
        let raw = self
            .completion
            .complete(&system, &user, ResponseMode::Json)
            .await
            .map_err(SisaCoreError::Completion)?;
        let result: ResearchResult = parse_json_completion(&raw).map_err(SisaCoreError::Completion)?;

        let metadata = serde_json::to_value(&result)
            .map_err(|err| SisaCoreError::Parse(err.to_string()))?;
        let search = TravelSearchDraft {
            query: turn.message.to_string(),
            destination: turn.travel.destination_name().map(str::to_string),
            budget: turn.travel.budget_value(),
            duration_days: turn.travel.duration_days_value(),
            preferences: json!(turn.travel.interests),
            results: metadata.clone(),
        };

        Ok(AgentResponse {
            content: format_research(&result),
            handoff: Handoff::Suggest(AgentKind::Planner),
            metadata: Some(metadata),
            search: Some(search),
        })
    }
}

fn format_research(result: &ResearchResult) -> String {
    let mut out = String::from("## Destinos encontrados\n\n");
    for destination in &result.destinations {
        let _ = writeln!(out, "### {}", destination.name);
        let _ = writeln!(out, "{}", destination.description);
        if !destination.highlights.is_empty() {
            for highlight in &destination.highlights {
                let _ = writeln!(out, "- {highlight}");
            }
        }
        if let Some(best_time) = &destination.best_time {
            let _ = writeln!(out, "*Mejor época:* {best_time}");
        }
        if let Some(cost) = &destination.estimated_cost {
            let _ = writeln!(out, "*Costo estimado:* {cost}");
        }
        out.push('\n');
    }
    if !result.insights.is_empty() {
        out.push_str("**Datos útiles:**\n");
        for insight in &result.insights {
            let _ = writeln!(out, "- {insight}");
        }
        out.push('\n');
    }
    out.push_str("¿Quieres que planifique un itinerario para alguno de estos destinos?");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TravelContext;
    use pretty_assertions::assert_eq;
    use sisa_rs_knowledge::StaticKnowledge;
    use crate::testing::FixedCompletion;
    use uuid::Uuid;

    fn turn<'a>(message: &'a str, travel: &'a TravelContext) -> TurnInput<'a> {
        TurnInput {
            conversation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            profile: None,
            message,
            travel,
            history: &[],
        }
    }

    #[tokio::test]
    async fn formats_destinations_and_suggests_the_planner() {
        let canned = serde_json::json!({
            "destinations": [{
                "name": "Montañita",
                "description": "Pueblo costero con ambiente surfista.",
                "highlights": ["Surf", "Vida nocturna"],
                "bestTime": "Diciembre a mayo",
                "estimatedCost": "$65 por día"
            }],
            "insights": ["La costa es más barata que Galápagos."],
            "sources": ["guía local"]
        });
        let agent = ResearchAgent::new(
            Arc::new(FixedCompletion::new(canned.to_string())),
            Arc::new(StaticKnowledge::new()),
            3,
        );
        let travel = TravelContext::default();
        let response = agent
            .handle(turn("busca destinos de playa con presupuesto bajo", &travel))
            .await
            .expect("handle");

        assert_eq!(response.handoff, Handoff::Suggest(AgentKind::Planner));
        assert!(response.content.contains("### Montañita"));
        assert!(response.content.contains("Mejor época"));
        assert!(response.content.contains("La costa es más barata"));
        let search = response.search.expect("search recorded");
        assert_eq!(search.query, "busca destinos de playa con presupuesto bajo");
    }

    #[tokio::test]
    async fn malformed_completion_output_is_an_error() {
        let agent = ResearchAgent::new(
            Arc::new(FixedCompletion::new("no soy json")),
            Arc::new(StaticKnowledge::new()),
            3,
        );
        let travel = TravelContext::default();
        let err = agent
            .handle(turn("busca destinos", &travel))
            .await
            .expect_err("must fail");
        assert!(matches!(err, SisaCoreError::Completion(_)));
    }
}
