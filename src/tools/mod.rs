//! Tool handlers, registry and concurrent dispatch
//!
//! Every action produced by intent inference names a tool. The
//! [`ToolRegistry`] resolves that name to a [`ToolHandler`], and the
//! [`ActionDispatcher`] runs all actions of one intent concurrently, turning
//! each into an [`ActionOutcome`] at the same position.

mod builtin;
mod dispatcher;
mod registry;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::intent::{Action, Parameters};

pub use builtin::{
    ChatTool, GetTimeTool, LightControlTool, PlayMusicTool, SetSceneTool, VolumeControlTool,
    register_builtin_tools,
};
pub use dispatcher::ActionDispatcher;
pub use registry::ToolRegistry;

/// A capability invoked by name with JSON parameters
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool
    ///
    /// # Errors
    ///
    /// Returns error if the tool fails; the dispatcher isolates it to this
    /// action's outcome
    async fn invoke(&self, parameters: &Parameters) -> Result<Parameters>;
}

/// Adapter turning an async closure into a [`ToolHandler`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Parameters>> + Send,
{
    async fn invoke(&self, parameters: &Parameters) -> Result<Parameters> {
        (self.0)(parameters.clone()).await
    }
}

/// Wrap an async closure as a shareable handler
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Parameters) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Parameters>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Why a single action did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionError {
    /// No handler is registered under the tool id
    #[error("tool not found: {tool}")]
    NotFound { tool: String },

    /// The handler returned an error or panicked
    #[error("tool failed: {message}")]
    Fault { message: String },

    /// The handler exceeded the per-action timeout
    #[error("tool timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The run was cancelled before the handler finished
    #[error("action cancelled")]
    Cancelled,
}

/// Result of executing one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Succeeded { action: Action, output: Parameters },
    Failed { action: Action, error: ActionError },
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// The action this outcome belongs to
    #[must_use]
    pub const fn action(&self) -> &Action {
        match self {
            Self::Succeeded { action, .. } | Self::Failed { action, .. } => action,
        }
    }

    #[must_use]
    pub const fn output(&self) -> Option<&Parameters> {
        match self {
            Self::Succeeded { output, .. } => Some(output),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ActionError> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}
