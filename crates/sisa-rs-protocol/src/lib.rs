//! Wire protocol types shared by the Sisa routing engine and its HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a conversation.
pub type ConversationId = Uuid;
/// Unique identifier for a message.
pub type MessageId = Uuid;
/// Unique identifier for a user.
pub type UserId = Uuid;

/// Errors raised while parsing wire tags.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// An agent tag that no handler is registered for.
    #[error("unknown agent tag: {0}")]
    UnknownAgent(String),
    /// A role string outside user/assistant/system.
    #[error("unknown message role: {0}")]
    UnknownRole(String),
}

/// The four fixed agent specializations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    /// Destination research and discovery.
    Research,
    /// Itinerary planning and budget estimation.
    Planner,
    /// Personalized hotel/restaurant/activity suggestions.
    Recommendations,
    /// Support, bookings, and issue triage.
    CustomerService,
}

impl AgentKind {
    /// All agents in router priority order.
    pub const ALL: [AgentKind; 4] = [
        AgentKind::Research,
        AgentKind::Planner,
        AgentKind::Recommendations,
        AgentKind::CustomerService,
    ];

    /// Wire tag for this agent.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Research => "research",
            AgentKind::Planner => "planner",
            AgentKind::Recommendations => "recommendations",
            AgentKind::CustomerService => "customer-service",
        }
    }

    /// Parse a wire tag. Unknown tags are a caller contract violation.
    pub fn parse(tag: &str) -> Result<Self, ProtocolError> {
        match tag {
            "research" => Ok(AgentKind::Research),
            "planner" => Ok(AgentKind::Planner),
            "recommendations" => Ok(AgentKind::Recommendations),
            "customer-service" | "customer_service" => Ok(AgentKind::CustomerService),
            other => Err(ProtocolError::UnknownAgent(other.to_string())),
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author role of a stored message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Human participant.
    User,
    /// Agent reply.
    Assistant,
    /// System notice injected into the transcript.
    System,
}

impl Role {
    /// Wire tag for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse a wire tag.
    pub fn parse(tag: &str) -> Result<Self, ProtocolError> {
        match tag {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(ProtocolError::UnknownRole(other.to_string())),
        }
    }
}

/// Severity of a system-log record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Routine audit entry.
    Info,
    /// Degraded but recoverable condition.
    Warning,
    /// Handler or collaborator failure.
    Error,
}

/// A handler's hand-off signal for the next turn.
///
/// `Suggest` is a suggestion, not a transition: only the state-advance step
/// in the turn engine may turn it into an `active_agent` update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "agent")]
pub enum Handoff {
    /// Stay on the current agent and keep the conversation open.
    Continue,
    /// Suggest that the named agent handle the next turn.
    Suggest(AgentKind),
    /// Stop the automatic hand-off chain (irrecoverable handler error).
    End,
}

impl Handoff {
    /// The suggested next agent, if any.
    pub fn suggestion(&self) -> Option<AgentKind> {
        match self {
            Handoff::Suggest(agent) => Some(*agent),
            _ => None,
        }
    }

    /// Whether this hand-off terminates the chain.
    pub fn ends_chain(&self) -> bool {
        matches!(self, Handoff::End)
    }
}

/// Inbound body of `POST /chat/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message for this turn.
    pub message: String,
    /// Conversation to route the turn into; omitted on the first turn.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    /// Explicit agent tag overriding the router.
    #[serde(default)]
    pub agent_type: Option<String>,
}

/// Outbound body of `POST /chat/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Formatted reply for the user.
    pub response: String,
    /// Conversation the turn was recorded in.
    pub conversation_id: ConversationId,
    /// Agent that produced the reply.
    pub agent_type: AgentKind,
    /// Suggested agent for the next turn, if the handler proposed one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_agent: Option<AgentKind>,
    /// Raw structured handler output, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// True when the hand-off chain must stop.
    pub should_end: bool,
}

/// One prior turn surfaced to a handler as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Agent tag for assistant entries produced by routing.
    #[serde(default)]
    pub agent_type: Option<AgentKind>,
    /// Creation time, used for ordering.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn agent_tags_round_trip() {
        for agent in AgentKind::ALL {
            assert_eq!(AgentKind::parse(agent.as_str()), Ok(agent));
        }
        assert_eq!(
            AgentKind::parse("customer_service"),
            Ok(AgentKind::CustomerService)
        );
        assert_eq!(
            AgentKind::parse("concierge"),
            Err(ProtocolError::UnknownAgent("concierge".to_string()))
        );
    }

    #[test]
    fn agent_kind_serializes_as_kebab_tag() {
        let value = serde_json::to_value(AgentKind::CustomerService).unwrap();
        assert_eq!(value, json!("customer-service"));
    }

    #[test]
    fn chat_request_accepts_minimal_body() {
        let request: ChatRequest =
            serde_json::from_value(json!({ "message": "hola" })).unwrap();
        assert_eq!(request.message, "hola");
        assert_eq!(request.conversation_id, None);
        assert_eq!(request.agent_type, None);
    }

    #[test]
    fn chat_response_omits_empty_optionals() {
        let response = ChatResponse {
            response: "listo".to_string(),
            conversation_id: Uuid::new_v4(),
            agent_type: AgentKind::Research,
            next_agent: None,
            metadata: None,
            should_end: false,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("nextAgent").is_none());
        assert!(value.get("metadata").is_none());
        assert_eq!(value["shouldEnd"], json!(false));
    }

    #[test]
    fn handoff_suggestion_surfaces_agent() {
        assert_eq!(
            Handoff::Suggest(AgentKind::Planner).suggestion(),
            Some(AgentKind::Planner)
        );
        assert_eq!(Handoff::Continue.suggestion(), None);
        assert!(Handoff::End.ends_chain());
        assert!(!Handoff::Continue.ends_chain());
    }
}
