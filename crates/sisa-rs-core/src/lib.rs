//! Core routing and conversation-state engine for Sisa.
//!
//! This crate owns the keyword router, the travel-context extractor,
//! the four agent handlers and the conversation turn engine used by the
//! server and SDK.

pub mod agents;
pub mod completion;
pub mod context;
pub mod conversations;
pub mod engine;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod router;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use agents::{apology, AgentHandler, TurnInput};
pub use completion::{CompletionClient, CompletionError, HttpCompletionClient, ResponseMode};
pub use context::{BudgetTier, MissingField, TravelContext, TurnExtraction};
pub use conversations::ConversationStore;
pub use engine::{apply_handoff, Dispatcher, Engine};
pub use error::SisaCoreError;
pub use extract::Extractor;
pub use router::{RouteDecision, Router};
pub use state::{JsonlStateStore, StateError, StateStore};
