//! Conversation and chat exchange types for Car Advisor.
//!
//! The advisor is stateless between calls: the caller owns the conversation
//! history and sends it with every chat request. The reply carries the history
//! back with the newest exchange appended.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::car::{Car, CarColumn};
use crate::filter::FilterSet;
use crate::llm::Message;

/// One completed exchange: what the user said and what the advisor answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

/// Ordered, append-only record of prior exchanges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append an exchange, keeping at most `max_turns` of the most recent ones.
    pub fn push(&mut self, turn: ConversationTurn, max_turns: usize) {
        self.turns.push(turn);
        self.truncate_to_recent(max_turns);
    }

    /// Drop the oldest turns so that at most `max_turns` remain.
    pub fn truncate_to_recent(&mut self, max_turns: usize) {
        if self.turns.len() > max_turns {
            let excess = self.turns.len() - max_turns;
            self.turns.drain(..excess);
        }
    }

    /// Flatten into alternating user/assistant messages for an LLM prompt.
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(|t| [Message::user(&t.user), Message::assistant(&t.assistant)])
            .collect()
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Manual filters; these always win over filters extracted from the message.
    #[serde(default, alias = "filters", alias = "manual_filters")]
    pub active_filters: Option<FilterSet>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub history: ConversationHistory,
}

/// Result of one pass through the advisor pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub conversation_id: Uuid,
    pub message: String,
    /// Manual filters as received.
    pub active_filters: FilterSet,
    /// Filters the language model derived from the message.
    pub extracted_filters: FilterSet,
    /// The merged set the catalog was queried with.
    pub filters_applied: FilterSet,
    pub cars_found: usize,
    /// The first matches (at most 5).
    pub cars: Vec<Car>,
    pub suggest_comparison: bool,
    pub priority_columns: Vec<CarColumn>,
    pub history: ConversationHistory,
    /// True when the summary fell back to a fixed text because the model failed.
    pub degraded: bool,
}
