//! Conversation context for multi-turn interactions
//!
//! A bounded, ordered history of user/assistant turns shared by every
//! pipeline run and gateway query.

mod store;

pub use store::{ContextStore, ConversationContext, ConversationTurn, Role};
