//! Chat-completion providers.
//!
//! The comparison service talks to the model through [`CompletionProvider`],
//! so the HTTP-backed OpenAI-compatible provider can be swapped for
//! [`MockCompletionProvider`] in tests.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatibleProvider;

use crate::error::LlmError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single-shot, non-streaming text completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` as one user message and return the first choice's
    /// message content.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

/// In-memory provider returning queued replies, for tests.
///
/// Once the queue is drained, the last reply is repeated. Every call and its
/// prompt are recorded.
pub struct MockCompletionProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a provider that always answers with `content`.
    pub fn with_content(content: &str) -> Self {
        let provider = Self::new();
        *provider.fallback.lock().unwrap() = Some(content.to_string());
        provider
    }

    /// Queue a reply (content or error) for the next call.
    pub fn queue(&self, reply: Result<String, LlmError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }
        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| LlmError::Transport {
                message: "mock provider has no reply queued".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
