//! Agent handlers.
//!
//! One handler per intent: destination research, itinerary planning,
//! personalized recommendations, and customer service. Handlers are
//! stateless; all conversation state arrives through [`TurnInput`].

mod customer_service;
mod planner;
mod recommendations;
mod research;

pub use customer_service::{CustomerServiceAgent, SupportClassification, SupportUrgency};
pub use planner::{estimate_budget, PlannerAgent};
pub use recommendations::RecommendationsAgent;
pub use research::ResearchAgent;

use crate::context::TravelContext;
use crate::error::SisaCoreError;
use crate::types::{AgentResponse, UserProfile};
use async_trait::async_trait;
use sisa_rs_protocol::{AgentKind, ConversationId, HistoryEntry, UserId};

/// Everything a handler may consult for one turn.
pub struct TurnInput<'a> {
    /// Conversation being processed.
    pub conversation_id: ConversationId,
    /// Requesting user.
    pub user_id: UserId,
    /// Stored profile, when one exists.
    pub profile: Option<&'a UserProfile>,
    /// The message being processed.
    pub message: &'a str,
    /// Accumulated travel context including this turn's extraction.
    pub travel: &'a TravelContext,
    /// Recent transcript window, oldest first.
    pub history: &'a [HistoryEntry],
}

/// A single intent handler.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Tag this handler answers to.
    fn kind(&self) -> AgentKind;

    /// Process one turn.
    async fn handle(&self, turn: TurnInput<'_>) -> Result<AgentResponse, SisaCoreError>;
}

/// User-facing apology emitted when a handler fails irrecoverably.
pub fn apology(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Research => {
            "Lo siento, tuve un problema al buscar destinos. Por favor, intenta de nuevo."
        }
        AgentKind::Planner => {
            "Tuve dificultades para crear tu itinerario. ¿Podrías intentar de nuevo?"
        }
        AgentKind::Recommendations => {
            "No pude generar recomendaciones en este momento. Intenta de nuevo, por favor."
        }
        AgentKind::CustomerService => {
            "Disculpa, tengo problemas técnicos. Por favor contacta a nuestro equipo de soporte directamente."
        }
    }
}
