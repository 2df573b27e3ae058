//! Conversation record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Open key/value metadata attached to a conversation
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A dialogue tracked by the store
///
/// Callers only ever see clones; every mutation goes through
/// `ConversationStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    /// Append-only, replayed verbatim to the backend
    pub messages: Vec<Message>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub(crate) fn new(
        id: String,
        messages: Vec<Message>,
        metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            messages,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether at least one message has been stored
    pub fn has_history(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Number of completed user→assistant exchanges
    pub fn turn_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == crate::types::MessageRole::Assistant)
            .count()
    }

    /// Refresh `updated_at` without ever moving it backwards
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
