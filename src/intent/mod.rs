//! Intent inference types
//!
//! The inference collaborator turns a routed query into an [`IntentResult`]:
//! a task type plus an ordered list of [`Action`]s for the dispatcher.

mod keyword;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::context::ConversationContext;
use crate::memory::Memory;
use crate::router::RoutingDecision;

pub use keyword::KeywordInferer;

/// Tool parameters / results: string keys to JSON values
pub type Parameters = serde_json::Map<String, Value>;

/// Coarse category of a user request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    SmartHome,
    Music,
    Weather,
    Calendar,
    Search,
    General,
}

/// A structured instruction for one registered tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Tool identifier (e.g. "smart_home.set_scene")
    pub tool: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Action {
    /// Create an action with no parameters
    #[must_use]
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            parameters: Parameters::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }
}

/// Parsed intent for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub task_type: TaskType,
    pub confidence: f32,
    /// Actions to execute; may be empty
    pub actions: Vec<Action>,
    pub original_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
}

/// Everything an inferer needs to interpret one query
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub query: &'a str,
    pub context: &'a ConversationContext,
    pub routing: &'a RoutingDecision,
    pub memories: &'a [Memory],
}

/// Turns a routed query into structured actions
///
/// Implementations typically call the LLM backend named by
/// `request.routing.backend`.
#[async_trait]
pub trait IntentInferer: Send + Sync {
    /// Infer the intent of a query
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails; the caller records it as a
    /// detection failure
    async fn infer(&self, request: InferenceRequest<'_>) -> Result<IntentResult>;
}
