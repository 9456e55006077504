//! Long-term memory collaborator
//!
//! Recall and storage are opaque to the gateway: a store returns whatever it
//! considers relevant and is told about every completed query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::context::ConversationContext;
use crate::gateway::Aggregate;

/// A recalled memory item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    pub text: String,
}

/// Recall/remember capability
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Memories relevant to `query`
    ///
    /// # Errors
    ///
    /// Returns error if the backing store is unavailable
    async fn recall(&self, query: &str, context: &ConversationContext) -> Result<Vec<Memory>>;

    /// Record a completed query and its aggregated result
    ///
    /// # Errors
    ///
    /// Returns error if the backing store is unavailable
    async fn remember(
        &self,
        query: &str,
        result: &Aggregate,
        context: &ConversationContext,
    ) -> Result<()>;
}

/// Memory store that recalls nothing and forgets everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMemory;

#[async_trait]
impl MemoryStore for NullMemory {
    async fn recall(&self, _query: &str, _context: &ConversationContext) -> Result<Vec<Memory>> {
        Ok(Vec::new())
    }

    async fn remember(
        &self,
        _query: &str,
        _result: &Aggregate,
        _context: &ConversationContext,
    ) -> Result<()> {
        Ok(())
    }
}
