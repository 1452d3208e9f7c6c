//! Similarity-search support for Sisa agent handlers.

pub mod error;
pub mod model;
pub mod provider;
pub mod service;

/// Knowledge error type.
pub use error::KnowledgeError;
/// Snippet model.
pub use model::Snippet;
/// Provider interface and the deterministic static index.
pub use provider::{KnowledgeProvider, StaticKnowledge};
/// Degraded-mode front door.
pub use service::KnowledgeService;
