//! Route, recall, infer, dispatch, aggregate, remember

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{Aggregate, aggregate};
use crate::Result;
use crate::context::{ContextStore, ConversationContext, Role};
use crate::intent::{InferenceRequest, IntentInferer, IntentResult};
use crate::memory::MemoryStore;
use crate::router::{ComplexityRouter, RoutingDecision};
use crate::tools::{ActionDispatcher, ToolRegistry};

/// Shared orchestration core used by text queries and voice runs
pub struct Orchestrator {
    router: ComplexityRouter,
    context: Arc<ContextStore>,
    dispatcher: ActionDispatcher,
    inferer: Arc<dyn IntentInferer>,
    memory: Arc<dyn MemoryStore>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("router", &self.router)
            .field("context", &self.context)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        router: ComplexityRouter,
        context: Arc<ContextStore>,
        dispatcher: ActionDispatcher,
        inferer: Arc<dyn IntentInferer>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            router,
            context,
            dispatcher,
            inferer,
            memory,
        }
    }

    #[must_use]
    pub const fn router(&self) -> &ComplexityRouter {
        &self.router
    }

    #[must_use]
    pub const fn context(&self) -> &Arc<ContextStore> {
        &self.context
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }

    /// Route a query against a context snapshot
    #[must_use]
    pub fn route(&self, query: &str, context: &ConversationContext) -> RoutingDecision {
        let routing = self.router.route(query, context);
        tracing::info!(
            complexity = %routing.complexity,
            backend = %routing.backend,
            "query routed"
        );
        routing
    }

    /// Recall memories and infer the intent of an already routed query
    ///
    /// # Errors
    ///
    /// Returns error if the memory store or the inferer fails
    pub async fn infer(
        &self,
        query: &str,
        context: &ConversationContext,
        routing: &RoutingDecision,
    ) -> Result<IntentResult> {
        let memories = self.memory.recall(query, context).await?;

        self.inferer
            .infer(InferenceRequest {
                query,
                context,
                routing,
                memories: &memories,
            })
            .await
    }

    /// Dispatch the intent's actions, aggregate, and remember the result
    ///
    /// # Errors
    ///
    /// Returns error if the memory store fails to record the result. Action
    /// failures are carried inside the aggregate.
    pub async fn act(
        &self,
        query: &str,
        intent: &IntentResult,
        context: &ConversationContext,
        cancel: &CancellationToken,
    ) -> Result<Aggregate> {
        let outcomes = self.dispatcher.run_with_cancel(&intent.actions, cancel).await;
        let result = aggregate(outcomes);

        tracing::info!(
            succeeded = result.succeeded,
            failed = result.failed,
            "actions aggregated"
        );

        self.memory.remember(query, &result, context).await?;

        Ok(result)
    }

    /// Record a completed exchange in the shared context
    pub fn record_exchange(&self, query: &str, response: &str) {
        self.context.append(Role::User, query);
        self.context.append(Role::Assistant, response);
    }
}
