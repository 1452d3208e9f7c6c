//! Mock completion clients.

use async_trait::async_trait;
use parking_lot::Mutex;
use sisa_rs_core::{CompletionClient, CompletionError, ResponseMode};
use std::sync::Arc;

/// Completion client that always returns the same canned text.
#[derive(Debug, Clone)]
pub struct FixedCompletion {
    response: String,
}

impl FixedCompletion {
    pub fn new(response: impl Into<String>) -> Self {
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

/// Completion client that records every prompt it receives.
#[derive(Clone)]
pub struct RecordingCompletion {
    response: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingCompletion {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All user prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
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

/// Completion client that always fails with an empty-response error.
#[derive(Debug, Clone, Default)]
pub struct FailingCompletion;

#[async_trait]
impl CompletionClient for FailingCompletion {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _mode: ResponseMode,
    ) -> Result<String, CompletionError> {
        Err(CompletionError::EmptyResponse)
    }
}
