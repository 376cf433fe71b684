//! Scripted providers for tests and local development

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use crate::error::{Error, Result};

/// LLM that replays queued replies and records every prompt it receives
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    /// Empty script; every call fails once the queue is exhausted
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `reply` once the queue is exhausted
    pub fn answering(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Queue a successful reply
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(Ok(reply.into()));
    }

    /// Queue a backend failure
    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .push_back(Err(Error::generation(message.into())));
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());

        if let Some(next) = self.replies.lock().pop_front() {
            return next;
        }
        self.fallback
            .clone()
            .ok_or_else(|| Error::generation("scripted LLM has no reply queued"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Embedder wrapper that can be switched into a failing state
pub struct SwitchableEmbedder<E> {
    inner: E,
    failing: AtomicBool,
}

impl<E: EmbeddingProvider> SwitchableEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl<E: EmbeddingProvider> EmbeddingProvider for SwitchableEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::embedding("embedding backend unreachable"));
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.failing.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
