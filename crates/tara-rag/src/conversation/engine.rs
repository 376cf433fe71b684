//! Retrieval-augmented conversation engine
//!
//! One engine per session, bound to one vector index and one memory. The
//! first successful upload creates it; later uploads extend its index in
//! place so prior chat context survives new documents.

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::{IndexMode, SearchHit, VectorIndex};
use crate::types::Chunk;

use super::memory::ConversationMemory;
use super::roles::Role;

/// Backend handles shared by every engine in the process
#[derive(Clone)]
pub struct EngineProviders {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmProvider>,
}

/// A generated answer with the chunks it was conditioned on
#[derive(Debug, Clone)]
pub struct EngineAnswer {
    pub answer: String,
    pub sources: Vec<SearchHit>,
}

pub struct ConversationEngine {
    index: VectorIndex,
    memory: ConversationMemory,
    providers: EngineProviders,
    retrieval: RetrievalConfig,
}

impl ConversationEngine {
    /// Build an engine over a fresh index of `chunks`
    pub async fn create(
        chunks: Vec<Chunk>,
        providers: EngineProviders,
        retrieval: RetrievalConfig,
    ) -> Result<Self> {
        let index = VectorIndex::build(chunks, providers.embedder.as_ref()).await?;
        Ok(Self {
            index,
            memory: ConversationMemory::new(),
            providers,
            retrieval,
        })
    }

    /// Create or extend the engine held in `slot`; returns the number of chunks indexed.
    ///
    /// On failure the slot is left exactly as it was.
    pub async fn merge(
        slot: &mut Option<Self>,
        mode: IndexMode,
        chunks: Vec<Chunk>,
        providers: &EngineProviders,
        retrieval: &RetrievalConfig,
    ) -> Result<usize> {
        match mode {
            IndexMode::Create => {
                let engine = Self::create(chunks, providers.clone(), retrieval.clone()).await?;
                let added = engine.index.len();
                *slot = Some(engine);
                Ok(added)
            }
            IndexMode::Extend => match slot.as_mut() {
                Some(engine) => engine.extend(chunks).await,
                None => Err(Error::IndexNotBuilt),
            },
        }
    }

    /// Append chunks to the index; memory is untouched
    pub async fn extend(&mut self, chunks: Vec<Chunk>) -> Result<usize> {
        self.index
            .extend(chunks, self.providers.embedder.as_ref())
            .await
    }

    /// Retrieval depth for the current index contents
    pub fn top_k(&self) -> usize {
        if self.index.has_document_chunks() {
            self.retrieval.document_top_k
        } else {
            self.retrieval.tabular_top_k
        }
    }

    /// Answer a question from retrieved context and memory.
    ///
    /// Memory grows by the question/answer pair only when generation succeeds.
    pub async fn ask(&mut self, question: &str, role: Role) -> Result<EngineAnswer> {
        let history = self.memory.recent(self.retrieval.max_history_turns);

        let search_query = if self.retrieval.condense_question && !history.is_empty() {
            let prompt = PromptBuilder::build_condense_prompt(question, history);
            let standalone = self.providers.llm.generate(&prompt).await?;
            tracing::debug!("Condensed question: {}", standalone);
            standalone
        } else {
            question.to_string()
        };

        let k = self.top_k();
        let sources = self
            .index
            .search(&search_query, self.providers.embedder.as_ref(), k)
            .await?;
        tracing::debug!("Retrieved {} chunks (k={})", sources.len(), k);

        let context = PromptBuilder::build_context(&sources);
        let enhanced = PromptBuilder::enhanced_question(role, question);
        let prompt = PromptBuilder::build_answer_prompt(&enhanced, &context, history);

        let answer = self.providers.llm.generate(&prompt).await?;
        self.memory.push_exchange(question, answer.clone());

        Ok(EngineAnswer { answer, sources })
    }

    /// Store an exchange answered outside the engine
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.memory.push_exchange(question, answer);
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}
