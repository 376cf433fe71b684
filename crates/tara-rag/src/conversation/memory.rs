//! Conversation memory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Speaker,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Append-only chat history that only grows by complete question/answer pairs
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user question together with the answer it received
    pub fn push_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let at = Utc::now();
        self.turns.push(Turn {
            role: Speaker::User,
            content: question.into(),
            at,
        });
        self.turns.push(Turn {
            role: Speaker::Assistant,
            content: answer.into(),
            at,
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of completed exchanges
    pub fn exchanges(&self) -> usize {
        self.turns.len() / 2
    }

    /// The last `max_exchanges` exchanges, or everything when `None`
    pub fn recent(&self, max_exchanges: Option<usize>) -> &[Turn] {
        match max_exchanges {
            Some(n) => {
                let keep = (n * 2).min(self.turns.len());
                &self.turns[self.turns.len() - keep..]
            }
            None => &self.turns,
        }
    }

    /// Render turns as a transcript for prompts
    pub fn transcript(turns: &[Turn]) -> String {
        turns
            .iter()
            .map(|t| match t.role {
                Speaker::User => format!("Human: {}", t.content),
                Speaker::Assistant => format!("Assistant: {}", t.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
