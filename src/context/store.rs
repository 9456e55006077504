//! Bounded conversation history store

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_HISTORY;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Convert to string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable turn of conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: Role,
    text: String,
    timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// An owned, ordered snapshot of conversation history (oldest first)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext {
    turns: Vec<ConversationTurn>,
}

impl ConversationContext {
    /// Build a context from turns, oldest first
    #[must_use]
    pub const fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        Self { turns }
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent turn, if any
    #[must_use]
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }
}

/// Thread-safe bounded conversation history
///
/// All access goes through one lock; [`snapshot`](Self::snapshot) copies under
/// that lock so readers never observe a partially-applied append.
#[derive(Debug)]
pub struct ContextStore {
    turns: Mutex<VecDeque<ConversationTurn>>,
    max_turns: usize,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ContextStore {
    /// Create a store holding at most `max_turns` turns
    ///
    /// A bound of zero is raised to one; configuration validation rejects it
    /// before it gets here.
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        let max_turns = max_turns.max(1);
        Self {
            turns: Mutex::new(VecDeque::with_capacity(max_turns + 1)),
            max_turns,
        }
    }

    /// Append a turn, evicting the oldest turns beyond the bound
    pub fn append(&self, role: Role, text: impl Into<String>) {
        let turn = ConversationTurn::new(role, text);
        let mut turns = self.lock();
        turns.push_back(turn);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
        tracing::trace!(role = %role, len = turns.len(), "context turn appended");
    }

    /// Copy the current history
    #[must_use]
    pub fn snapshot(&self) -> ConversationContext {
        let turns = self.lock();
        ConversationContext::from_turns(turns.iter().cloned().collect())
    }

    /// Drop all turns
    pub fn clear(&self) {
        self.lock().clear();
        tracing::debug!("context cleared");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The configured bound
    #[must_use]
    pub const fn max_turns(&self) -> usize {
        self.max_turns
    }

    // Every critical section leaves the deque consistent, so a poisoned lock
    // still guards valid data
    fn lock(&self) -> MutexGuard<'_, VecDeque<ConversationTurn>> {
        self.turns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn keeps_most_recent_turns_in_order() {
        let store = ContextStore::new(10);
        for i in 0..15 {
            store.append(Role::User, format!("turn {i}"));
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 10);
        let texts: Vec<&str> = snapshot.turns().iter().map(ConversationTurn::text).collect();
        let expected: Vec<String> = (5..15).map(|i| format!("turn {i}")).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn snapshot_is_detached() {
        let store = ContextStore::new(3);
        store.append(Role::User, "hello");
        let snapshot = store.snapshot();

        store.append(Role::Assistant, "hi");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn clear_resets() {
        let store = ContextStore::new(3);
        store.append(Role::User, "a");
        store.append(Role::Assistant, "b");
        store.clear();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());

        // Clearing an empty store is fine
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn zero_bound_is_raised_to_one() {
        let store = ContextStore::new(0);
        store.append(Role::User, "a");
        store.append(Role::User, "b");
        assert_eq!(store.max_turns(), 1);
        assert_eq!(store.snapshot().last().map(ConversationTurn::text), Some("b"));
    }

    #[test]
    fn concurrent_appends_respect_bound() {
        let store = Arc::new(ContextStore::new(5));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..20 {
                        store.append(Role::User, format!("{t}-{i}"));
                        assert!(store.snapshot().len() <= 5);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = ConversationTurn::new(Role::Assistant, "ok");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["text"], "ok");
    }
}
