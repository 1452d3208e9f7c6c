//! Handler dispatch table.

use crate::agents::{
    AgentHandler, CustomerServiceAgent, PlannerAgent, RecommendationsAgent, ResearchAgent,
};
use crate::completion::CompletionClient;
use sisa_rs_config::SisaConfig;
use sisa_rs_knowledge::KnowledgeProvider;
use sisa_rs_protocol::AgentKind;
use std::sync::Arc;

/// Fixed table of the four intent handlers.
pub struct Dispatcher {
    research: ResearchAgent,
    planner: PlannerAgent,
    recommendations: RecommendationsAgent,
    customer_service: CustomerServiceAgent,
}

impl Dispatcher {
    /// Build all handlers from configuration and shared collaborators.
    pub fn new(
        config: &SisaConfig,
        completion: Arc<dyn CompletionClient>,
        knowledge: Arc<dyn KnowledgeProvider>,
    ) -> Self {
        let top_k = config.knowledge.top_k;
        Self {
            research: ResearchAgent::new(completion.clone(), knowledge.clone(), top_k),
            planner: PlannerAgent::new(completion.clone(), config.planner.clone()),
            recommendations: RecommendationsAgent::new(
                completion.clone(),
                config.recommendations.clone(),
            ),
            customer_service: CustomerServiceAgent::new(
                completion,
                knowledge,
                top_k,
                config.support.clone(),
            ),
        }
    }

    /// Resolve the handler for an agent tag. Total over [`AgentKind`].
    pub fn resolve(&self, kind: AgentKind) -> &dyn AgentHandler {
        match kind {
            AgentKind::Research => &self.research,
            AgentKind::Planner => &self.planner,
            AgentKind::Recommendations => &self.recommendations,
            AgentKind::CustomerService => &self.customer_service,
        }
    }
}
