//! Concurrent action dispatch
//!
//! Fans every action of an intent out onto its own task and joins them in
//! input order. A failing, hung, or panicking handler only affects its own
//! outcome slot. Panic isolation needs `panic = "unwind"`, which every
//! profile in this crate keeps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::{ActionError, ActionOutcome, ToolHandler, ToolRegistry};
use crate::config::DEFAULT_ACTION_TIMEOUT;
use crate::intent::Action;

/// Executes actions against a [`ToolRegistry`]
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    registry: Arc<ToolRegistry>,
    action_timeout: Duration,
}

impl ActionDispatcher {
    /// Create a dispatcher with a per-action timeout
    #[must_use]
    pub const fn new(registry: Arc<ToolRegistry>, action_timeout: Duration) -> Self {
        Self {
            registry,
            action_timeout,
        }
    }

    /// Create a dispatcher with the default timeout
    #[must_use]
    pub const fn with_default_timeout(registry: Arc<ToolRegistry>) -> Self {
        Self::new(registry, DEFAULT_ACTION_TIMEOUT)
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        self.action_timeout
    }

    /// Run all actions concurrently
    ///
    /// Returns exactly one outcome per action, in input order.
    pub async fn run(&self, actions: &[Action]) -> Vec<ActionOutcome> {
        self.run_with_cancel(actions, &CancellationToken::new()).await
    }

    /// Run all actions concurrently, stopping early when `cancel` fires
    ///
    /// Actions still running when the token is cancelled are recorded as
    /// [`ActionError::Cancelled`]. Dropping the returned future also signals
    /// every in-flight action to stop.
    pub async fn run_with_cancel(
        &self,
        actions: &[Action],
        cancel: &CancellationToken,
    ) -> Vec<ActionOutcome> {
        if actions.is_empty() {
            return Vec::new();
        }

        let token = cancel.child_token();
        let _guard = token.clone().drop_guard();

        tracing::debug!(count = actions.len(), "dispatching actions");

        let handles: Vec<_> = actions
            .iter()
            .map(|action| {
                let handler = self.registry.resolve(&action.tool);
                tokio::spawn(execute(
                    action.clone(),
                    handler,
                    self.action_timeout,
                    token.clone(),
                ))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(actions.len());
        for (action, handle) in actions.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let error = if e.is_panic() {
                        ActionError::Fault {
                            message: "handler panicked".to_string(),
                        }
                    } else {
                        ActionError::Cancelled
                    };
                    tracing::error!(tool = %action.tool, error = %e, "action task aborted");
                    ActionOutcome::Failed {
                        action: action.clone(),
                        error,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        tracing::debug!(count = outcomes.len(), failed, "actions joined");

        outcomes
    }
}

async fn execute(
    action: Action,
    handler: Result<Arc<dyn ToolHandler>, ActionError>,
    timeout: Duration,
    cancel: CancellationToken,
) -> ActionOutcome {
    let handler = match handler {
        Ok(handler) => handler,
        Err(error) => {
            tracing::warn!(tool = %action.tool, %error, "action not dispatched");
            return ActionOutcome::Failed { action, error };
        }
    };

    let started = Instant::now();
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ActionError::Cancelled),
        res = tokio::time::timeout(timeout, handler.invoke(&action.parameters)) => match res {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ActionError::Fault { message: e.to_string() }),
            Err(_) => Err(ActionError::Timeout { timeout_ms: millis(timeout) }),
        },
    };

    let elapsed_ms = millis(started.elapsed());
    match result {
        Ok(output) => {
            tracing::debug!(tool = %action.tool, elapsed_ms, "action succeeded");
            ActionOutcome::Succeeded { action, output }
        }
        Err(error) => {
            tracing::warn!(tool = %action.tool, elapsed_ms, %error, "action failed");
            ActionOutcome::Failed { action, error }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
