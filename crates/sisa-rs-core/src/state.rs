//! Conversation persistence using JSONL rollouts.
//!
//! Each conversation gets one `{id}.jsonl` rollout; travel searches and
//! the system log each get a shared append-only file, and user profiles
//! live in a small `users.json` map.

use crate::context::TravelContext;
use crate::types::{Message, SystemLogEntry, TravelSearch, UserProfile};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sisa_rs_protocol::{AgentKind, ConversationId, UserId};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

const SEARCHES_FILE: &str = "searches.jsonl";
const SYSTEM_LOG_FILE: &str = "system_log.jsonl";
const USERS_FILE: &str = "users.json";

/// Persisted conversation record reconstructed from a rollout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationRecord {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Owning user.
    pub user_id: UserId,
    /// Conversation title.
    pub title: String,
    /// Agent tag after the last recorded change.
    pub active_agent: AgentKind,
    /// Travel context after the last recorded update.
    pub travel: TravelContext,
    /// Conversation creation timestamp.
    pub created_at: DateTime<Utc>,
    /// All messages in the conversation.
    pub messages: Vec<Message>,
}

/// Summary record used for listing conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummaryRecord {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Owning user.
    pub user_id: UserId,
    /// Conversation title.
    pub title: String,
    /// Active agent tag.
    pub active_agent: AgentKind,
    /// Total number of messages.
    pub message_count: usize,
    /// Conversation creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent message.
    pub updated_at: DateTime<Utc>,
}

/// Persistent store abstraction for conversations and their side tables.
pub trait StateStore: Send + Sync {
    /// Record a new conversation creation.
    fn record_conversation(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        title: &str,
        active_agent: AgentKind,
        created_at: DateTime<Utc>,
    ) -> Result<(), StateError>;
    /// Append a message to a conversation rollout.
    fn append_message(
        &self,
        conversation_id: ConversationId,
        message: &Message,
    ) -> Result<(), StateError>;
    /// Record an active-agent change.
    fn record_agent_change(
        &self,
        conversation_id: ConversationId,
        agent: AgentKind,
    ) -> Result<(), StateError>;
    /// Record the travel context after a turn.
    fn record_travel_context(
        &self,
        conversation_id: ConversationId,
        travel: &TravelContext,
    ) -> Result<(), StateError>;
    /// Load a conversation by id.
    fn load_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationRecord>, StateError>;
    /// List all conversation summaries.
    fn list_conversations(&self) -> Result<Vec<ConversationSummaryRecord>, StateError>;
    /// Append a travel-search row.
    fn record_search(&self, search: &TravelSearch) -> Result<(), StateError>;
    /// List travel searches for one user, most recent first.
    fn list_searches(&self, user_id: UserId) -> Result<Vec<TravelSearch>, StateError>;
    /// Append a system-log row.
    fn record_log(&self, entry: &SystemLogEntry) -> Result<(), StateError>;
    /// Load a user profile.
    fn load_user(&self, user_id: UserId) -> Result<Option<UserProfile>, StateError>;
    /// Insert or replace a user profile.
    fn put_user(&self, profile: &UserProfile) -> Result<(), StateError>;
}

/// Errors returned by the state store.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(u32),
    #[error("missing conversation metadata")]
    MissingMetadata,
    #[error("conversation already exists: {0}")]
    ConversationExists(ConversationId),
}

/// Internal JSONL event representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RolloutEvent {
    SchemaVersion {
        version: u32,
    },
    ConversationCreated {
        conversation_id: ConversationId,
        user_id: UserId,
        title: String,
        active_agent: AgentKind,
        created_at: DateTime<Utc>,
    },
    Message {
        conversation_id: ConversationId,
        message: Message,
    },
    ActiveAgentChanged {
        conversation_id: ConversationId,
        agent: AgentKind,
    },
    TravelContextUpdated {
        conversation_id: ConversationId,
        travel: TravelContext,
    },
}

#[derive(Default)]
struct RolloutState {
    version: Option<u32>,
    user_id: Option<UserId>,
    title: Option<String>,
    active_agent: Option<AgentKind>,
    travel: TravelContext,
    created_at: Option<DateTime<Utc>>,
    messages: Vec<Message>,
}

impl RolloutState {
    fn apply(&mut self, event: RolloutEvent) -> Result<(), StateError> {
        match event {
            RolloutEvent::SchemaVersion { version } => {
                self.version = Some(version);
                if version > 1 {
                    return Err(StateError::UnsupportedSchema(version));
                }
            }
            RolloutEvent::ConversationCreated {
                user_id,
                title,
                active_agent,
                created_at,
                ..
            } => {
                self.user_id = Some(user_id);
                self.title = Some(title);
                self.active_agent = Some(active_agent);
                self.created_at = Some(created_at);
            }
            RolloutEvent::Message { message, .. } => {
                self.messages.push(message);
            }
            RolloutEvent::ActiveAgentChanged { agent, .. } => {
                self.active_agent = Some(agent);
            }
            RolloutEvent::TravelContextUpdated { travel, .. } => {
                self.travel = travel;
            }
        }
        Ok(())
    }

    fn finish(self, conversation_id: ConversationId) -> Result<ConversationRecord, StateError> {
        let _ = self.version.ok_or(StateError::MissingMetadata)?;
        let user_id = self.user_id.ok_or(StateError::MissingMetadata)?;
        let title = self.title.ok_or(StateError::MissingMetadata)?;
        let active_agent = self.active_agent.ok_or(StateError::MissingMetadata)?;
        let created_at = self.created_at.ok_or(StateError::MissingMetadata)?;
        Ok(ConversationRecord {
            id: conversation_id,
            user_id,
            title,
            active_agent,
            travel: self.travel,
            created_at,
            messages: self.messages,
        })
    }
}

/// JSONL-backed state store implementation.
pub struct JsonlStateStore {
    /// Root directory for rollouts and side tables.
    root: PathBuf,
    /// Serialize write access to all files under the root.
    write_lock: Mutex<()>,
}

impl JsonlStateStore {
    /// Create a new JSONL store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StateError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized JSONL state store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Build the rollout file path for a conversation.
    fn rollout_path(&self, conversation_id: ConversationId) -> PathBuf {
        self.root.join(format!("{conversation_id}.jsonl"))
    }

    /// Append an event to an existing rollout file.
    fn write_event(
        &self,
        conversation_id: ConversationId,
        event: &RolloutEvent,
    ) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        let path = self.rollout_path(conversation_id);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Create a new rollout file and write the initial event.
    fn write_new_rollout(
        &self,
        conversation_id: ConversationId,
        event: &RolloutEvent,
    ) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        let path = self.rollout_path(conversation_id);
        if path.exists() {
            return Err(StateError::ConversationExists(conversation_id));
        }
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)?;
        let header = serde_json::to_string(&RolloutEvent::SchemaVersion { version: 1 })?;
        writeln!(file, "{header}")?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read and reconstruct a conversation from its rollout file.
    fn read_rollout(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationRecord>, StateError> {
        let path = self.rollout_path(conversation_id);
        if !path.exists() {
            return Ok(None);
        }
        let file = OpenOptions::new().read(true).open(&path)?;
        let reader = BufReader::new(file);
        let mut rollout = RolloutState::default();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: RolloutEvent = serde_json::from_str(&line)?;
            rollout.apply(event)?;
        }
        Ok(Some(rollout.finish(conversation_id)?))
    }

    /// Append one serialized row to a shared side-table file.
    fn append_row<T: Serialize>(&self, file_name: &str, row: &T) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        let path = self.root.join(file_name);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(row)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn read_users(&self) -> Result<HashMap<UserId, UserProfile>, StateError> {
        let path = self.root.join(USERS_FILE);
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl StateStore for JsonlStateStore {
    /// Record conversation creation as a rollout event.
    fn record_conversation(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        title: &str,
        active_agent: AgentKind,
        created_at: DateTime<Utc>,
    ) -> Result<(), StateError> {
        info!(
            "recording conversation creation (conversation_id={}, user_id={}, active_agent={})",
            conversation_id, user_id, active_agent
        );
        let event = RolloutEvent::ConversationCreated {
            conversation_id,
            user_id,
            title: title.to_string(),
            active_agent,
            created_at,
        };
        self.write_new_rollout(conversation_id, &event)
    }

    /// Append a message event to a conversation rollout.
    fn append_message(
        &self,
        conversation_id: ConversationId,
        message: &Message,
    ) -> Result<(), StateError> {
        debug!(
            "appending message event (conversation_id={}, role={}, content_len={})",
            conversation_id,
            message.role.as_str(),
            message.content.len()
        );
        let event = RolloutEvent::Message {
            conversation_id,
            message: message.clone(),
        };
        self.write_event(conversation_id, &event)
    }

    /// Record an active-agent change as a rollout event.
    fn record_agent_change(
        &self,
        conversation_id: ConversationId,
        agent: AgentKind,
    ) -> Result<(), StateError> {
        debug!(
            "recording agent change (conversation_id={}, agent={})",
            conversation_id, agent
        );
        let event = RolloutEvent::ActiveAgentChanged {
            conversation_id,
            agent,
        };
        self.write_event(conversation_id, &event)
    }

    /// Record the post-turn travel context as a rollout event.
    fn record_travel_context(
        &self,
        conversation_id: ConversationId,
        travel: &TravelContext,
    ) -> Result<(), StateError> {
        let event = RolloutEvent::TravelContextUpdated {
            conversation_id,
            travel: travel.clone(),
        };
        self.write_event(conversation_id, &event)
    }

    /// Load a conversation from the rollout file.
    fn load_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationRecord>, StateError> {
        self.read_rollout(conversation_id)
    }

    /// List all conversations by scanning rollout files.
    fn list_conversations(&self) -> Result<Vec<ConversationSummaryRecord>, StateError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
                continue;
            }
            let file_name = match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(name) => name,
                None => continue,
            };
            let conversation_id = match Uuid::parse_str(file_name) {
                Ok(id) => id,
                Err(_) => continue,
            };
            if let Some(record) = self.read_rollout(conversation_id)? {
                let updated_at = record
                    .messages
                    .last()
                    .map(|msg| msg.created_at)
                    .unwrap_or(record.created_at);
                summaries.push(ConversationSummaryRecord {
                    id: record.id,
                    user_id: record.user_id,
                    title: record.title,
                    active_agent: record.active_agent,
                    message_count: record.messages.len(),
                    created_at: record.created_at,
                    updated_at,
                });
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Append a travel search to the shared searches file.
    fn record_search(&self, search: &TravelSearch) -> Result<(), StateError> {
        debug!(
            "recording travel search (user_id={}, query_len={})",
            search.user_id,
            search.query.len()
        );
        self.append_row(SEARCHES_FILE, search)
    }

    /// Read the searches file and filter by user, most recent first.
    fn list_searches(&self, user_id: UserId) -> Result<Vec<TravelSearch>, StateError> {
        let path = self.root.join(SEARCHES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(&path)?;
        let reader = BufReader::new(file);
        let mut searches = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let search: TravelSearch = serde_json::from_str(&line)?;
            if search.user_id == user_id {
                searches.push(search);
            }
        }
        searches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(searches)
    }

    /// Append an audit entry to the shared system-log file.
    fn record_log(&self, entry: &SystemLogEntry) -> Result<(), StateError> {
        self.append_row(SYSTEM_LOG_FILE, entry)
    }

    /// Load a profile from the users map.
    fn load_user(&self, user_id: UserId) -> Result<Option<UserProfile>, StateError> {
        Ok(self.read_users()?.remove(&user_id))
    }

    /// Insert or replace a profile in the users map.
    fn put_user(&self, profile: &UserProfile) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        let path = self.root.join(USERS_FILE);
        let mut users = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str::<HashMap<UserId, UserProfile>>(&raw)?
        } else {
            HashMap::new()
        };
        users.insert(profile.id, profile.clone());
        let rendered = serde_json::to_string_pretty(&users)?;
        fs::write(&path, rendered)?;
        Ok(())
    }
}

/// Resolve the default storage root: configured path, else
/// `~/.sisa/<fallback_dir>`, else `.sisa/<fallback_dir>` under the
/// working directory.
pub fn resolve_default_root(path: Option<&str>, fallback_dir: &str) -> PathBuf {
    if let Some(path) = path {
        return PathBuf::from(path);
    }
    match directories::BaseDirs::new() {
        Some(base) => base.home_dir().join(".sisa").join(fallback_dir),
        None => {
            warn!("home directory unavailable, using relative storage root");
            PathBuf::from(".sisa").join(fallback_dir)
        }
    }
}
