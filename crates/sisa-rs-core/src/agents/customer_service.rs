//! Customer-service handler.
//!
//! Classification is local keyword matching; only the reply text is
//! delegated to the completion service. This handler never proposes a
//! next agent, so it ends the automatic hand-off chain.

use super::{AgentHandler, TurnInput};
use crate::completion::{CompletionClient, ResponseMode};
use crate::error::SisaCoreError;
use crate::prompt;
use crate::types::AgentResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sisa_rs_config::SupportConfig;
use sisa_rs_knowledge::KnowledgeProvider;
use sisa_rs_protocol::{AgentKind, Handoff};
use std::sync::Arc;

/// Urgency derived from the message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportUrgency {
    Medium,
    High,
}

impl SupportUrgency {
    /// Spanish display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportUrgency::Medium => "media",
            SupportUrgency::High => "alta",
        }
    }
}

/// Outcome of classifying a support query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportClassification {
    /// Matched category name.
    pub category: String,
    /// Derived urgency.
    pub urgency: SupportUrgency,
    /// Confidence in the category match, capped below 1.0.
    pub confidence: f64,
    /// Whether this handler expects to resolve the issue itself.
    pub can_resolve: bool,
}

/// Classify a support query against the configured category rules.
///
/// Categories are tested in configuration order; the first rule with a
/// keyword match wins, and an empty-keyword rule acts as the catch-all.
pub fn classify(config: &SupportConfig, message: &str) -> SupportClassification {
    let lowered = message.to_lowercase();
    let mut category = None;
    let mut matches = 0usize;
    for rule in &config.categories {
        if rule.keywords.is_empty() {
            category.get_or_insert_with(|| (rule.category.clone(), 0usize));
            continue;
        }
        let hits = rule
            .keywords
            .iter()
            .filter(|keyword| lowered.contains(keyword.as_str()))
            .count();
        if hits > 0 {
            category = Some((rule.category.clone(), hits));
            matches = hits;
            break;
        }
    }
    let (category, _) = category.unwrap_or_else(|| ("general".to_string(), 0));

    let urgency = if config
        .urgency_keywords
        .iter()
        .any(|keyword| lowered.contains(keyword.as_str()))
    {
        SupportUrgency::High
    } else {
        SupportUrgency::Medium
    };

    let confidence = (config.confidence_base + config.confidence_step * matches as f64)
        .min(config.confidence_cap);
    let can_resolve = category != "complaint" && confidence > config.resolve_threshold;

    SupportClassification {
        category,
        urgency,
        confidence,
        can_resolve,
    }
}

/// Suggested follow-up actions for a category.
pub fn follow_up_actions(category: &str) -> Vec<&'static str> {
    let mut actions = match category {
        "booking" => vec!["check_booking"],
        "technical" => vec!["system_status"],
        "complaint" => vec!["escalate"],
        _ => Vec::new(),
    };
    actions.push("contact_support");
    actions
}

/// Handler for support queries; terminal in the hand-off chain.
pub struct CustomerServiceAgent {
    completion: Arc<dyn CompletionClient>,
    knowledge: Arc<dyn KnowledgeProvider>,
    knowledge_top_k: usize,
    config: SupportConfig,
}

impl CustomerServiceAgent {
    /// Build a customer-service handler.
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        knowledge: Arc<dyn KnowledgeProvider>,
        knowledge_top_k: usize,
        config: SupportConfig,
    ) -> Self {
        Self {
            completion,
            knowledge,
            knowledge_top_k,
            config,
        }
    }
}

#[async_trait]
impl AgentHandler for CustomerServiceAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::CustomerService
    }

    async fn handle(&self, turn: TurnInput<'_>) -> Result<AgentResponse, SisaCoreError> {
        let classification = classify(&self.config, turn.message);
        log::info!(
            "support query classified (conversation_id={}, category={}, urgency={}, confidence={:.1})",
            turn.conversation_id,
            classification.category,
            classification.urgency.as_str(),
            classification.confidence
        );

        let snippets = self
            .knowledge
            .search(turn.message, self.knowledge_top_k)
            .await?;
        let window_start = turn
            .history
            .len()
            .saturating_sub(self.config.history_window);
        let system = prompt::support_system(
            &classification.category,
            classification.urgency.as_str(),
            &snippets,
        );
        let user = prompt::support_user(turn.message, &turn.history[window_start..]);
        let content = self
            .completion
            .complete(&system, &user, ResponseMode::Text)
            .await
            .map_err(SisaCoreError::Completion)?;

        let actions = follow_up_actions(&classification.category);
        let metadata = json!({
            "classification": classification,
            "suggestedActions": actions,
        });
        Ok(AgentResponse {
            content,
            handoff: Handoff::Continue,
            metadata: Some(metadata),
            search: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TravelContext;
    use pretty_assertions::assert_eq;
    use sisa_rs_knowledge::StaticKnowledge;
    use crate::testing::FixedCompletion;
    use uuid::Uuid;

    fn config() -> SupportConfig {
        SupportConfig::default()
    }

    #[test]
    fn booking_keywords_classify_as_booking() {
        let classification = classify(&config(), "necesito cancelar mi reserva");
        assert_eq!(classification.category, "booking");
        assert_eq!(classification.urgency, SupportUrgency::Medium);
        // Multiple keyword hits, capped at the configured ceiling.
        assert_eq!(classification.confidence, 0.9);
        assert!(classification.can_resolve);
    }

    #[test]
    fn urgency_keywords_raise_the_urgency() {
        let classification = classify(&config(), "urgente: la página da error");
        assert_eq!(classification.category, "technical");
        assert_eq!(classification.urgency, SupportUrgency::High);
    }

    #[test]
    fn complaints_are_never_self_resolved() {
        let classification = classify(&config(), "tengo una queja, el servicio fue terrible");
        assert_eq!(classification.category, "complaint");
        assert!(!classification.can_resolve);
    }

    #[test]
    fn unmatched_queries_fall_through_to_general() {
        let classification = classify(&config(), "hola, una pregunta");
        assert_eq!(classification.category, "general");
        assert_eq!(classification.confidence, 0.5);
        assert!(!classification.can_resolve);
    }

    #[test]
    fn follow_up_actions_are_category_specific() {
        assert_eq!(follow_up_actions("booking"), vec!["check_booking", "contact_support"]);
        assert_eq!(follow_up_actions("technical"), vec!["system_status", "contact_support"]);
        assert_eq!(follow_up_actions("complaint"), vec!["escalate", "contact_support"]);
        assert_eq!(follow_up_actions("general"), vec!["contact_support"]);
    }

    #[tokio::test]
    async fn handler_replies_without_proposing_a_next_agent() {
        let agent = CustomerServiceAgent::new(
            Arc::new(FixedCompletion::new(
                "Puedo ayudarte a revisar tu reserva.",
            )),
            Arc::new(StaticKnowledge::new()),
            3,
            config(),
        );
        let travel = TravelContext::default();
        let response = agent
            .handle(TurnInput {
                conversation_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                profile: None,
                message: "quiero cambiar mi reserva",
                travel: &travel,
                history: &[],
            })
            .await
            .expect("handle");

        assert_eq!(response.handoff, Handoff::Continue);
        assert_eq!(response.handoff.suggestion(), None);
        let metadata = response.metadata.expect("metadata");
        assert_eq!(metadata["classification"]["category"], "booking");
        assert_eq!(
            metadata["suggestedActions"],
            serde_json::json!(["check_booking", "contact_support"])
        );
    }
}
