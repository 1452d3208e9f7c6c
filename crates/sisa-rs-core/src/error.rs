//! Error types for the core routing crate.

use crate::completion::CompletionError;
use sisa_rs_protocol::{ConversationId, ProtocolError};
use thiserror::Error;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum SisaCoreError {
    /// Conversation id is unknown to the engine.
    #[error("unknown conversation: {0}")]
    UnknownConversation(ConversationId),
    /// Agent tag is unknown to the dispatcher (caller contract violation).
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
    /// Completion service failure.
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    /// Similarity-search failure.
    #[error("knowledge error: {0}")]
    Knowledge(#[from] sisa_rs_knowledge::KnowledgeError),
    /// State store error.
    #[error("state error: {0}")]
    State(String),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Payload parsing error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<ProtocolError> for SisaCoreError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownAgent(tag) => SisaCoreError::UnknownAgent(tag),
            other => SisaCoreError::Parse(other.to_string()),
        }
    }
}
