//! In-memory conversation registry with age and count based eviction

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::model::{Conversation, Metadata};
use crate::logging::Logger;
use crate::types::Message;
use crate::{log_debug, log_info};

/// Bounds applied on every `create`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Maximum number of tracked conversations (never below 1)
    pub capacity: usize,
    /// Conversations untouched for longer than this are dropped
    pub retention: Duration,
}

impl StoreLimits {
    pub fn new(capacity: usize, retention: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            retention,
        }
    }
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(24 * 3600))
    }
}

struct Entry {
    conversation: Conversation,
    /// Store-wide touch counter; orders entries whose timestamps tie
    touched: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    sequence: u64,
}

impl Inner {
    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Authoritative owner of every conversation
///
/// Unknown ids are never an error: lookups come back empty and mutations
/// are silently ignored, so stale continuation tokens from a host are harmless.
pub struct ConversationStore {
    inner: RwLock<Inner>,
    limits: StoreLimits,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn Logger>,
}

impl ConversationStore {
    /// Create a store on the system clock
    pub fn new(limits: StoreLimits, logger: Arc<dyn Logger>) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock), logger)
    }

    /// Create a store reading time from `clock`
    pub fn with_clock(limits: StoreLimits, clock: Arc<dyn Clock>, logger: Arc<dyn Logger>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            limits,
            clock,
            logger,
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Register a new conversation and run the cleanup pass
    pub fn create(&self, messages: Vec<Message>, metadata: Metadata) -> String {
        let now = self.clock.now();
        let id = Uuid::new_v4().to_string();

        let mut inner = self.inner.write();
        let touched = inner.next_sequence();
        inner.entries.insert(
            id.clone(),
            Entry {
                conversation: Conversation::new(id.clone(), messages, metadata, now),
                touched,
            },
        );
        let (expired, overflow) = self.evict(&mut inner, now, &id);
        let size = inner.entries.len();
        drop(inner);

        log_debug!(self.logger, "[ConversationStore] Created conversation {}", id);
        if expired + overflow > 0 {
            log_info!(
                self.logger,
                "[ConversationStore] Evicted {} expired and {} overflow conversations ({} remaining)",
                expired, overflow, size,
            );
        }
        id
    }

    /// Look up a conversation; `None` means unknown or expired
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.inner.read().entries.get(id).map(|e| e.conversation.clone())
    }

    /// Stored messages, or an empty list for an unknown id
    pub fn get_messages(&self, id: &str) -> Vec<Message> {
        self.inner
            .read()
            .entries
            .get(id)
            .map(|e| e.conversation.messages.clone())
            .unwrap_or_default()
    }

    /// Append a message; no-op for an unknown id
    pub fn add_message(&self, id: &str, message: Message) {
        self.mutate(id, |conversation| conversation.messages.push(message));
    }

    /// Shallow-merge `partial` into the metadata; no-op for an unknown id
    pub fn update_metadata(&self, id: &str, partial: Metadata) {
        self.mutate(id, |conversation| {
            for (key, value) in partial {
                conversation.metadata.insert(key, value);
            }
        });
    }

    /// Remove a conversation, returning whether it existed
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.inner.write().entries.remove(id).is_some();
        if removed {
            log_debug!(self.logger, "[ConversationStore] Deleted conversation {}", id);
        }
        removed
    }

    /// Number of tracked conversations
    pub fn size(&self) -> usize {
        self.inner.read().entries.len()
    }

    #[cfg(test)]
    pub(crate) fn ids(&self) -> Vec<String> {
        self.inner.read().entries.keys().cloned().collect()
    }

    /// Drop everything
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let count = inner.entries.len();
        inner.entries.clear();
        drop(inner);
        log_info!(self.logger, "[ConversationStore] Cleared {} conversations", count);
    }

    fn mutate(&self, id: &str, apply: impl FnOnce(&mut Conversation)) {
        let now = self.clock.now();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if !inner.entries.contains_key(id) {
            return;
        }
        let touched = inner.next_sequence();
        if let Some(entry) = inner.entries.get_mut(id) {
            apply(&mut entry.conversation);
            entry.conversation.touch(now);
            entry.touched = touched;
        }
    }

    /// Age-based pass, then count-based pass. `keep` (the conversation that
    /// triggered the sweep) is never a candidate.
    fn evict(&self, inner: &mut Inner, now: DateTime<Utc>, keep: &str) -> (usize, usize) {
        let retention = self.limits.retention;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|id, entry| id == keep || !is_expired(&entry.conversation, now, retention));
        let expired = before - inner.entries.len();

        let mut overflow = 0;
        if inner.entries.len() > self.limits.capacity {
            let excess = inner.entries.len() - self.limits.capacity;
            let mut candidates: Vec<(DateTime<Utc>, u64, String)> = inner
                .entries
                .iter()
                .filter(|(id, _)| id.as_str() != keep)
                .map(|(id, entry)| (entry.conversation.updated_at, entry.touched, id.clone()))
                .collect();
            candidates.sort();

            for (_, _, id) in candidates.into_iter().take(excess) {
                inner.entries.remove(&id);
                overflow += 1;
            }
        }

        (expired, overflow)
    }
}

fn is_expired(conversation: &Conversation, now: DateTime<Utc>, retention: Duration) -> bool {
    match (now - conversation.updated_at).to_std() {
        Ok(age) => age > retention,
        // updated_at in the future (clock stepped back): not expired
        Err(_) => false,
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("limits", &self.limits)
            .field("size", &self.size())
            .finish()
    }
}
