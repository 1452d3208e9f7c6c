//! Test helpers shared across Sisa crates.

pub mod completion;
pub mod knowledge;

pub use completion::{FailingCompletion, FixedCompletion, RecordingCompletion};
pub use knowledge::StubKnowledge;
