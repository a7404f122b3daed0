use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{ChatMessage, ReasoningService};
use crate::error::ReasoningError;

/// Scripted reasoning service for tests.
///
/// Replies are served from a queue in order, then the default reply for
/// every further call. No network access.
#[derive(Debug, Clone)]
pub struct MockReasoning {
    default_reply: Result<String, ReasoningError>,
    queue: Arc<Mutex<VecDeque<Result<String, ReasoningError>>>>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockReasoning {
    /// Answer every call with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self::with_default(Ok(reply.into()))
    }

    /// Fail every call with `err`.
    pub fn failing(err: ReasoningError) -> Self {
        Self::with_default(Err(err))
    }

    fn with_default(default_reply: Result<String, ReasoningError>) -> Self {
        Self {
            default_reply,
            queue: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serve `reply` before falling back to the default.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(reply.into()));
    }

    /// Fail the next unscripted call with `err`.
    pub fn push_error(&self, err: ReasoningError) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(err));
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Messages of the most recent request.
    pub fn last_request(&self) -> Option<Vec<ChatMessage>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Default for MockReasoning {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl ReasoningService for MockReasoning {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ReasoningError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone())
    }
}
