//! Completion doubles for in-crate unit tests.
//!
//! These live inside the crate so unit tests never link a second copy of
//! the library through an external helper crate; integration tests use
//! the shared doubles from `sisa-rs-test-utils` instead.

use crate::completion::{CompletionClient, CompletionError, ResponseMode};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Completion client that always returns the same canned text.
#[derive(Debug, Clone)]
pub(crate) struct FixedCompletion {
    response: String,
}

impl FixedCompletion {
    pub(crate) fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for FixedCompletion {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _mode: ResponseMode,
    ) -> Result<String, CompletionError> {
        Ok(self.response.clone())
    }
}

/// Completion client that records every user prompt it receives.
#[derive(Clone)]
pub(crate) struct RecordingCompletion {
    response: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingCompletion {
    pub(crate) fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All user prompts seen so far, in call order.
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl CompletionClient for RecordingCompletion {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _mode: ResponseMode,
    ) -> Result<String, CompletionError> {
        self.prompts.lock().push(user_prompt.to_string());
        Ok(self.response.clone())
    }
}
