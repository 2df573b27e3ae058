//! Continuation token resolution

use crate::conversation::{ConversationStore, Metadata};
use crate::logging::Logger;
use crate::types::Message;
use crate::log_debug;

/// Outcome of resolving a continuation token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Conversation to use for this call
    pub id: String,
    /// True when an existing conversation with history was reused
    pub resumed: bool,
}

/// Reuse the conversation behind `token`, or start a new one
///
/// A token that is unknown, expired, or points at an empty conversation is
/// not an error: a fresh conversation seeded with `seed` is created and its
/// id returned instead.
pub fn resolve_conversation(
    store: &ConversationStore,
    token: Option<&str>,
    seed: Vec<Message>,
    metadata: Metadata,
    logger: &dyn Logger,
) -> Resolution {
    if let Some(token) = token {
        match store.get(token) {
            Some(conversation) if conversation.has_history() => {
                log_debug!(
                    logger,
                    "[workflow] Resuming conversation {} ({} messages)",
                    token,
                    conversation.messages.len(),
                );
                return Resolution {
                    id: conversation.id,
                    resumed: true,
                };
            }
            Some(_) => log_debug!(
                logger,
                "[workflow] Continuation {} has no history, starting a new conversation",
                token,
            ),
            None => log_debug!(
                logger,
                "[workflow] Continuation {} is unknown or expired, starting a new conversation",
                token,
            ),
        }
    }

    let id = store.create(seed, metadata);
    log_debug!(logger, "[workflow] Started conversation {}", id);
    Resolution { id, resumed: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::StoreLimits;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use std::sync::Arc;

    fn store() -> ConversationStore {
        ConversationStore::new(StoreLimits::default(), Arc::new(NoOpLogger))
    }

    #[test]
    fn test_no_token_creates_seeded_conversation() {
        let store = store();
        let resolution = resolve_conversation(
            &store,
            None,
            vec![Message::system("sys")],
            Metadata::new(),
            &NoOpLogger,
        );
        assert!(!resolution.resumed);
        assert_eq!(store.get_messages(&resolution.id), vec![Message::system("sys")]);
    }

    #[test]
    fn test_known_token_is_reused() {
        let store = store();
        let id = store.create(vec![Message::user("earlier")], Metadata::new());
        let resolution = resolve_conversation(&store, Some(id.as_str()), vec![], Metadata::new(), &NoOpLogger);
        assert!(resolution.resumed);
        assert_eq!(resolution.id, id);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_unknown_token_yields_fresh_conversation() {
        let store = store();
        let logger = MemoryLogger::new();
        let resolution = resolve_conversation(
            &store,
            Some("does-not-exist"),
            vec![Message::system("sys")],
            Metadata::new(),
            &logger,
        );
        assert!(!resolution.resumed);
        assert_ne!(resolution.id, "does-not-exist");
        assert!(store.get(&resolution.id).is_some());
        assert!(logger.contains(LogLevel::Debug, "does-not-exist"));
    }

    #[test]
    fn test_empty_conversation_is_not_resumed() {
        let store = store();
        let empty = store.create(Vec::new(), Metadata::new());
        let resolution = resolve_conversation(&store, Some(empty.as_str()), vec![], Metadata::new(), &NoOpLogger);
        assert!(!resolution.resumed);
        assert_ne!(resolution.id, empty);
    }
}
