//! In-memory conversation registry with optional persistence.
//!
//! Conversations live in a `RwLock<HashMap>` cache; when a state store
//! is attached, every mutation is mirrored to it. Persistence failures
//! on side tables are logged and swallowed so a disk problem never
//! fails a turn; only conversation lookups surface errors.

use crate::error::SisaCoreError;
use crate::state::{ConversationRecord, StateStore};
use crate::types::{
    Conversation, ConversationSummary, Message, SystemLogEntry, TravelSearch, UserProfile,
};
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use sisa_rs_protocol::{AgentKind, ConversationId, LogLevel, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const TITLE_MAX_CHARS: usize = 60;

/// Registry of live conversations.
pub struct ConversationStore {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
    state_store: Option<Arc<dyn StateStore>>,
}

impl ConversationStore {
    /// Create a store without persistence.
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            state_store: None,
        }
    }

    /// Create a store that mirrors mutations to a state store.
    pub fn with_state_store(state_store: Arc<dyn StateStore>) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            state_store: Some(state_store),
        }
    }

    /// Create a new conversation starting on the given agent.
    pub fn create(
        &self,
        user_id: UserId,
        first_message: &str,
        active_agent: AgentKind,
    ) -> Conversation {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id,
            title: derive_title(first_message),
            active_agent,
            travel: Default::default(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        info!(
            "creating conversation (conversation_id={}, user_id={}, active_agent={})",
            conversation.id, user_id, active_agent
        );
        if let Some(store) = &self.state_store {
            if let Err(err) = store.record_conversation(
                conversation.id,
                user_id,
                &conversation.title,
                active_agent,
                now,
            ) {
                warn!(
                    "failed to persist conversation creation (conversation_id={}): {err}",
                    conversation.id
                );
            }
        }
        self.conversations
            .write()
            .insert(conversation.id, conversation.clone());
        conversation
    }

    /// Fetch a conversation, falling back to the state store when it is
    /// not cached (e.g. after a restart).
    pub fn resume(&self, conversation_id: ConversationId) -> Result<Conversation, SisaCoreError> {
        if let Some(conversation) = self.conversations.read().get(&conversation_id) {
            return Ok(conversation.clone());
        }
        if let Some(store) = &self.state_store {
            if let Some(record) = store
                .load_conversation(conversation_id)
                .map_err(|err| SisaCoreError::State(err.to_string()))?
            {
                debug!(
                    "resumed conversation from state store (conversation_id={}, messages={})",
                    conversation_id,
                    record.messages.len()
                );
                let conversation = conversation_from_record(record);
                self.conversations
                    .write()
                    .insert(conversation_id, conversation.clone());
                return Ok(conversation);
            }
        }
        Err(SisaCoreError::UnknownConversation(conversation_id))
    }

    /// Append a message to a conversation.
    pub fn append_message(
        &self,
        conversation_id: ConversationId,
        message: Message,
    ) -> Result<(), SisaCoreError> {
        {
            let mut conversations = self.conversations.write();
            let conversation = conversations
                .get_mut(&conversation_id)
                .ok_or(SisaCoreError::UnknownConversation(conversation_id))?;
            conversation.messages.push(message.clone());
            conversation.updated_at = message.created_at;
        }
        if let Some(store) = &self.state_store {
            if let Err(err) = store.append_message(conversation_id, &message) {
                warn!(
                    "failed to persist message (conversation_id={}): {err}",
                    conversation_id
                );
            }
        }
        Ok(())
    }

    /// Advance the stored active agent for the next turn.
    pub fn set_active_agent(
        &self,
        conversation_id: ConversationId,
        agent: AgentKind,
    ) -> Result<(), SisaCoreError> {
        {
            let mut conversations = self.conversations.write();
            let conversation = conversations
                .get_mut(&conversation_id)
                .ok_or(SisaCoreError::UnknownConversation(conversation_id))?;
            if conversation.active_agent == agent {
                return Ok(());
            }
            conversation.active_agent = agent;
        }
        info!(
            "advancing active agent (conversation_id={}, agent={})",
            conversation_id, agent
        );
        if let Some(store) = &self.state_store {
            if let Err(err) = store.record_agent_change(conversation_id, agent) {
                warn!(
                    "failed to persist agent change (conversation_id={}): {err}",
                    conversation_id
                );
            }
        }
        Ok(())
    }

    /// Replace the stored travel context after a turn.
    pub fn update_travel(
        &self,
        conversation_id: ConversationId,
        travel: crate::context::TravelContext,
    ) -> Result<(), SisaCoreError> {
        {
            let mut conversations = self.conversations.write();
            let conversation = conversations
                .get_mut(&conversation_id)
                .ok_or(SisaCoreError::UnknownConversation(conversation_id))?;
            conversation.travel = travel.clone();
        }
        if let Some(store) = &self.state_store {
            if let Err(err) = store.record_travel_context(conversation_id, &travel) {
                warn!(
                    "failed to persist travel context (conversation_id={}): {err}",
                    conversation_id
                );
            }
        }
        Ok(())
    }

    /// List conversations for one user, most recently updated first.
    pub fn list_for_user(&self, user_id: UserId) -> Vec<ConversationSummary> {
        let mut summaries: Vec<_> = self
            .conversations
            .read()
            .values()
            .filter(|conversation| conversation.user_id == user_id)
            .map(|conversation| ConversationSummary {
                id: conversation.id,
                user_id: conversation.user_id,
                title: conversation.title.clone(),
                active_agent: conversation.active_agent,
                message_count: conversation.messages.len(),
                created_at: conversation.created_at,
                updated_at: conversation.updated_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    /// Persist a travel search. Fire-and-forget.
    pub fn record_search(&self, search: TravelSearch) {
        if let Some(store) = &self.state_store {
            if let Err(err) = store.record_search(&search) {
                warn!("failed to persist travel search (user_id={}): {err}", search.user_id);
            }
        }
    }

    /// List persisted travel searches for a user.
    pub fn list_searches(&self, user_id: UserId) -> Vec<TravelSearch> {
        match &self.state_store {
            Some(store) => match store.list_searches(user_id) {
                Ok(searches) => searches,
                Err(err) => {
                    warn!("failed to list travel searches (user_id={user_id}): {err}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// Append an audit entry. Fire-and-forget.
    pub fn log_system(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        agent: Option<AgentKind>,
        user_id: Option<UserId>,
        metadata: Option<Value>,
    ) {
        let entry = SystemLogEntry {
            level,
            message: message.into(),
            agent,
            user_id,
            metadata,
            created_at: Utc::now(),
        };
        if let Some(store) = &self.state_store {
            if let Err(err) = store.record_log(&entry) {
                warn!("failed to persist system log entry: {err}");
            }
        }
    }

    /// Fetch a user profile from the state store.
    pub fn get_user(&self, user_id: UserId) -> Option<UserProfile> {
        let store = self.state_store.as_ref()?;
        match store.load_user(user_id) {
            Ok(profile) => profile,
            Err(err) => {
                warn!("failed to load user profile (user_id={user_id}): {err}");
                None
            }
        }
    }

    /// Insert or replace a user profile.
    pub fn put_user(&self, profile: &UserProfile) {
        if let Some(store) = &self.state_store {
            if let Err(err) = store.put_user(profile) {
                warn!("failed to persist user profile (user_id={}): {err}", profile.id);
            }
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn conversation_from_record(record: ConversationRecord) -> Conversation {
    let updated_at = record
        .messages
        .last()
        .map(|message| message.created_at)
        .unwrap_or(record.created_at);
    Conversation {
        id: record.id,
        user_id: record.user_id,
        title: record.title,
        active_agent: record.active_agent,
        travel: record.travel,
        messages: record.messages,
        created_at: record.created_at,
        updated_at,
    }
}

/// Derive a short title from the first message.
fn derive_title(first_message: &str) -> String {
    let trimmed = first_message.trim();
    if trimmed.is_empty() {
        return "Nueva conversación".to_string();
    }
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return trimmed.to_string();
    }
    let truncated: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    format!("{}…", truncated.trim_end())
}
