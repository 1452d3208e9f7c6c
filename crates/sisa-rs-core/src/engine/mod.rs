//! Conversation turn engine.
//!
//! One call to [`Engine::process_turn`] runs a full turn: routing,
//! extraction, handler execution, hand-off bookkeeping and persistence.
//! Handler failures are converted into a user-facing apology rather
//! than surfaced to the caller.

mod dispatch;

pub use dispatch::Dispatcher;

use crate::agents::{apology, TurnInput};
use crate::completion::{CompletionClient, HttpCompletionClient};
use crate::conversations::ConversationStore;
use crate::error::SisaCoreError;
use crate::extract::Extractor;
use crate::router::Router;
use crate::state::{resolve_default_root, JsonlStateStore, StateStore};
use crate::types::Message;
use log::{error, info};
use serde_json::json;
use sisa_rs_config::SisaConfig;
use sisa_rs_knowledge::{KnowledgeProvider, KnowledgeService};
use sisa_rs_protocol::{
    AgentKind, ChatRequest, ChatResponse, Handoff, HistoryEntry, LogLevel, UserId,
};
use std::sync::Arc;

const STORAGE_DIR: &str = "conversations";

/// Compute the agent the conversation should sit on after a turn.
///
/// Only a suggestion advances the stored agent; `Continue` keeps the
/// current one and `End` freezes the chain for this turn.
pub fn apply_handoff(current: AgentKind, handoff: &Handoff) -> AgentKind {
    match handoff {
        Handoff::Suggest(next) => *next,
        Handoff::Continue | Handoff::End => current,
    }
}

/// Turn engine wiring the router, extractor, handlers and stores.
pub struct Engine {
    config: SisaConfig,
    router: Router,
    extractor: Extractor,
    dispatcher: Dispatcher,
    conversations: ConversationStore,
}

impl Engine {
    /// Build an engine from explicit collaborators.
    pub fn new(
        config: SisaConfig,
        completion: Arc<dyn CompletionClient>,
        knowledge: Arc<dyn KnowledgeProvider>,
        conversations: ConversationStore,
    ) -> Self {
        let router = Router::new(&config.router);
        let extractor = Extractor::new(&config.planner);
        let dispatcher = Dispatcher::new(&config, completion, knowledge);
        Self {
            config,
            router,
            extractor,
            dispatcher,
            conversations,
        }
    }

    /// Build an engine with the default HTTP completion client, static
    /// knowledge fallback and (when enabled) JSONL persistence.
    pub fn bootstrap(config: SisaConfig) -> Result<Self, SisaCoreError> {
        let completion: Arc<dyn CompletionClient> =
            Arc::new(HttpCompletionClient::new(config.completion.clone())?);
        if config.knowledge.remote_enabled {
            log::warn!("no remote knowledge index is wired in, falling back to the static index");
        }
        let knowledge: Arc<dyn KnowledgeProvider> =
            Arc::new(KnowledgeService::static_only(config.knowledge.top_k));
        let conversations = if config.storage.enabled {
            let root = resolve_default_root(config.storage.path.as_deref(), STORAGE_DIR);
            let store: Arc<dyn StateStore> = Arc::new(
                JsonlStateStore::new(root).map_err(|err| SisaCoreError::State(err.to_string()))?,
            );
            ConversationStore::with_state_store(store)
        } else {
            ConversationStore::new()
        };
        Ok(Self::new(config, completion, knowledge, conversations))
    }

    /// Conversation registry, exposed for listing endpoints.
    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// Process one chat turn for a user.
    pub async fn process_turn(
        &self,
        user_id: UserId,
        request: &ChatRequest,
    ) -> Result<ChatResponse, SisaCoreError> {
        // An explicit agent tag always overrides routing.
        let requested = request
            .agent_type
            .as_deref()
            .map(AgentKind::parse)
            .transpose()?;

        let conversation = match request.conversation_id {
            Some(conversation_id) => self.conversations.resume(conversation_id)?,
            None => {
                let initial = requested.unwrap_or(self.router_default());
                self.conversations.create(user_id, &request.message, initial)
            }
        };

        let decision = self
            .router
            .classify(&request.message, Some(conversation.active_agent));
        let agent = requested.unwrap_or(decision.agent);
        info!(
            "processing turn (conversation_id={}, user_id={}, agent={}, routed_by_keyword={})",
            conversation.id,
            user_id,
            agent,
            decision.matched_keyword.is_some()
        );

        self.conversations
            .append_message(conversation.id, Message::user(&request.message))?;

        let mut travel = conversation.travel.clone();
        travel.begin_turn();
        travel.absorb(self.extractor.extract(&request.message));

        let history = self.history_window(&conversation.messages);
        let profile = self.conversations.get_user(user_id);
        let turn = TurnInput {
            conversation_id: conversation.id,
            user_id,
            profile: profile.as_ref(),
            message: &request.message,
            travel: &travel,
            history: &history,
        };

        let handler = self.dispatcher.resolve(agent);
        let response = match handler.handle(turn).await {
            Ok(response) => response,
            Err(err) => {
                error!(
                    "handler failed (conversation_id={}, agent={}): {err}",
                    conversation.id, agent
                );
                self.conversations.log_system(
                    LogLevel::Error,
                    format!("agent handler failed: {err}"),
                    Some(agent),
                    Some(user_id),
                    Some(json!({ "query": request.message })),
                );
                crate::types::AgentResponse::reply(apology(agent), Handoff::End)
            }
        };

        self.conversations.append_message(
            conversation.id,
            Message::assistant(response.content.clone(), agent, response.metadata.clone()),
        )?;
        if let Some(search) = response.search {
            self.conversations.record_search(search.into_search(user_id));
        }
        self.conversations.update_travel(conversation.id, travel)?;
        let next_active = apply_handoff(agent, &response.handoff);
        self.conversations
            .set_active_agent(conversation.id, next_active)?;

        Ok(ChatResponse {
            response: response.content,
            conversation_id: conversation.id,
            agent_type: agent,
            next_agent: response.handoff.suggestion(),
            metadata: response.metadata,
            should_end: response.handoff.ends_chain(),
        })
    }

    /// Run one handler directly, bypassing the router. Used by the
    /// per-agent endpoints.
    pub async fn process_as(
        &self,
        user_id: UserId,
        agent: AgentKind,
        request: &ChatRequest,
    ) -> Result<ChatResponse, SisaCoreError> {
        let forced = ChatRequest {
            message: request.message.clone(),
            conversation_id: request.conversation_id,
            agent_type: Some(agent.as_str().to_string()),
        };
        self.process_turn(user_id, &forced).await
    }

    fn router_default(&self) -> AgentKind {
        self.config.router.default_agent
    }

    fn history_window(&self, messages: &[Message]) -> Vec<HistoryEntry> {
        let window = self.config.planner.history_window;
        let start = messages.len().saturating_sub(window);
        messages[start..]
            .iter()
            .map(Message::to_history_entry)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn suggestions_advance_the_active_agent() {
        assert_eq!(
            apply_handoff(AgentKind::Research, &Handoff::Suggest(AgentKind::Planner)),
            AgentKind::Planner
        );
    }

    #[test]
    fn continue_and_end_keep_the_current_agent() {
        assert_eq!(
            apply_handoff(AgentKind::Planner, &Handoff::Continue),
            AgentKind::Planner
        );
        assert_eq!(
            apply_handoff(AgentKind::Research, &Handoff::End),
            AgentKind::Research
        );
    }
}
