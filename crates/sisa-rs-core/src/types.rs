//! Core data types shared across the engine API.

use crate::context::TravelContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sisa_rs_protocol::{AgentKind, ConversationId, Handoff, HistoryEntry, MessageId, Role, UserId};
use uuid::Uuid;

/// Message stored in a conversation transcript.
///
/// Append-only; every assistant message produced by routing carries the
/// `agent_type` of the handler that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Handler tag for routed assistant messages.
    pub agent_type: Option<AgentKind>,
    /// Opaque structured handler output.
    pub metadata: Option<Value>,
    /// Timestamp for the message.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a user message for the current turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            agent_type: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Build an assistant message tagged with the producing handler.
    pub fn assistant(content: impl Into<String>, agent: AgentKind, metadata: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            agent_type: Some(agent),
            metadata,
            created_at: Utc::now(),
        }
    }

    /// View this message as handler history context.
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.role,
            content: self.content.clone(),
            agent_type: self.agent_type,
            created_at: self.created_at,
        }
    }
}

/// Full conversation with its transcript and accumulated travel context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Owning user.
    pub user_id: UserId,
    /// Human-readable title, derived from the first message.
    pub title: String,
    /// Agent that will handle the next keyword-less turn.
    pub active_agent: AgentKind,
    /// Extracted travel parameters carried across turns.
    pub travel: TravelContext,
    /// Ordered transcript.
    pub messages: Vec<Message>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last turn.
    pub updated_at: DateTime<Utc>,
}

/// Summary view of a conversation for listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Owning user.
    pub user_id: UserId,
    /// Human-readable title.
    pub title: String,
    /// Active agent tag.
    pub active_agent: AgentKind,
    /// Count of messages stored.
    pub message_count: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last turn.
    pub updated_at: DateTime<Utc>,
}

/// Stored user profile consulted for prompt personalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Free-form travel preferences.
    pub preferences: Option<Value>,
}

/// Denormalized record of one research/planning invocation.
///
/// Used only for later display ("recent searches"), never consulted for
/// routing correctness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TravelSearch {
    /// Record identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: UserId,
    /// Free-text query that triggered the search.
    pub query: String,
    /// Destination when one was resolved.
    pub destination: Option<String>,
    /// Budget when one was resolved.
    pub budget: Option<f64>,
    /// Duration in days when one was resolved.
    pub duration_days: Option<u32>,
    /// Preferences blob.
    pub preferences: Value,
    /// Raw handler output.
    pub results: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A search row proposed by a handler; the engine stamps identity fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelSearchDraft {
    /// Free-text query that triggered the search.
    pub query: String,
    /// Destination when one was resolved.
    pub destination: Option<String>,
    /// Budget when one was resolved.
    pub budget: Option<f64>,
    /// Duration in days when one was resolved.
    pub duration_days: Option<u32>,
    /// Preferences blob.
    pub preferences: Value,
    /// Raw handler output.
    pub results: Value,
}

impl TravelSearchDraft {
    /// Stamp identity fields to produce a persistable record.
    pub fn into_search(self, user_id: UserId) -> TravelSearch {
        TravelSearch {
            id: Uuid::new_v4(),
            user_id,
            query: self.query,
            destination: self.destination,
            budget: self.budget,
            duration_days: self.duration_days,
            preferences: self.preferences,
            results: self.results,
            created_at: Utc::now(),
        }
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemLogEntry {
    /// Severity level.
    pub level: sisa_rs_protocol::LogLevel,
    /// Log message.
    pub message: String,
    /// Agent tag when the entry is handler-scoped.
    pub agent: Option<AgentKind>,
    /// User id when the entry is user-scoped.
    pub user_id: Option<UserId>,
    /// Free-form metadata.
    pub metadata: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Structured response emitted by one agent handler.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    /// Formatted reply for the user.
    pub content: String,
    /// Hand-off signal consumed by the state-advance step.
    pub handoff: Handoff,
    /// Raw structured handler output.
    pub metadata: Option<Value>,
    /// Search row to persist as a side effect, if any.
    pub search: Option<TravelSearchDraft>,
}

impl AgentResponse {
    /// Build a plain reply with no hand-off or side effects.
    pub fn reply(content: impl Into<String>, handoff: Handoff) -> Self {
        Self {
            content: content.into(),
            handoff,
            metadata: None,
            search: None,
        }
    }
}
