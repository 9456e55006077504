//! Gateway facade
//!
//! A [`Gateway`] is built explicitly from a [`Config`] and owns the router,
//! context store, tool registry, dispatcher and collaborators. Hosts talk to
//! it through [`Gateway::process_query`] for text and
//! [`Gateway::run_pipeline`] / [`Gateway::run_stream`] for audio.

mod aggregate;
mod orchestrator;

use std::sync::Arc;
use std::time::Instant;

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::context::{ContextStore, ConversationContext};
use crate::intent::{IntentInferer, KeywordInferer};
use crate::memory::{MemoryStore, NullMemory};
use crate::pipeline::{PipelineResult, VoicePipeline, VoiceStack};
use crate::router::{BackendEndpoint, ComplexityRouter, RoutingDecision};
use crate::tools::{ActionDispatcher, ToolHandler, ToolRegistry, register_builtin_tools};
use crate::{Error, Result};

pub use aggregate::{ACKNOWLEDGEMENT, Aggregate, GENERIC_SUCCESS, aggregate};
pub use orchestrator::Orchestrator;

/// Result of [`Gateway::process_query`]
///
/// `success` is false exactly when `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Aggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: f64,
}

/// A registered tool as listed to hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub schema: Value,
}

/// Builder for [`Gateway`]
pub struct GatewayBuilder {
    config: Config,
    inferer: Arc<dyn IntentInferer>,
    memory: Arc<dyn MemoryStore>,
    voice: Option<VoiceStack>,
    backends: Vec<(String, BackendEndpoint)>,
    builtin_tools: bool,
}

impl GatewayBuilder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            inferer: Arc::new(KeywordInferer::new()),
            memory: Arc::new(NullMemory),
            voice: None,
            backends: Vec::new(),
            builtin_tools: true,
        }
    }

    /// Use a different intent inferer (defaults to [`KeywordInferer`])
    #[must_use]
    pub fn inferer(mut self, inferer: Arc<dyn IntentInferer>) -> Self {
        self.inferer = inferer;
        self
    }

    /// Use a memory store (defaults to [`NullMemory`])
    #[must_use]
    pub fn memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = memory;
        self
    }

    /// Enable the voice pipeline
    #[must_use]
    pub fn voice(mut self, voice: VoiceStack) -> Self {
        self.voice = Some(voice);
        self
    }

    /// Register where a routing backend is reachable
    #[must_use]
    pub fn backend(mut self, id: impl Into<String>, endpoint: BackendEndpoint) -> Self {
        self.backends.push((id.into(), endpoint));
        self
    }

    /// Skip registering the built-in tools
    #[must_use]
    pub const fn without_builtin_tools(mut self) -> Self {
        self.builtin_tools = false;
        self
    }

    /// Validate the configuration and assemble the gateway
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid
    pub fn build(self) -> Result<Gateway> {
        self.config.validate()?;

        let mut router = ComplexityRouter::new(&self.config.router);
        for (id, endpoint) in self.backends {
            router.register_backend(id, endpoint);
        }

        let registry = Arc::new(ToolRegistry::new());
        if self.builtin_tools {
            register_builtin_tools(&registry);
        }

        let context = Arc::new(ContextStore::new(self.config.history.max_history));
        let dispatcher = ActionDispatcher::new(registry, self.config.dispatch.action_timeout);

        let orchestrator = Arc::new(Orchestrator::new(
            router,
            context,
            dispatcher,
            self.inferer,
            self.memory,
        ));

        let pipeline = self
            .voice
            .map(|voice| VoicePipeline::new(voice, Arc::clone(&orchestrator), &self.config.audio));

        tracing::info!(
            tools = orchestrator.registry().len(),
            voice = pipeline.is_some(),
            max_history = self.config.history.max_history,
            "gateway ready"
        );

        Ok(Gateway {
            config: self.config,
            orchestrator,
            pipeline,
        })
    }
}

/// Voice-request routing and orchestration core
#[derive(Debug, Clone)]
pub struct Gateway {
    config: Config,
    orchestrator: Arc<Orchestrator>,
    pipeline: Option<VoicePipeline>,
}

impl Gateway {
    #[must_use]
    pub fn builder(config: Config) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    /// Gateway with defaults for every collaborator and no voice pipeline
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        GatewayBuilder::new(config).build()
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The shared conversation history
    #[must_use]
    pub fn context(&self) -> &Arc<ContextStore> {
        self.orchestrator.context()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.orchestrator.registry()
    }

    #[must_use]
    pub const fn pipeline(&self) -> Option<&VoicePipeline> {
        self.pipeline.as_ref()
    }

    /// Route a query without running it
    ///
    /// Uses `context` when given, otherwise the shared history.
    #[must_use]
    pub fn route(&self, query: &str, context: Option<&ConversationContext>) -> RoutingDecision {
        match context {
            Some(context) => self.orchestrator.route(query, context),
            None => self.orchestrator.route(query, &self.context().snapshot()),
        }
    }

    /// Process a text query end to end
    ///
    /// With an explicit `context` the call is stateless. Without one the
    /// shared history is used and the exchange is appended to it on success.
    pub async fn process_query(
        &self,
        query: &str,
        context: Option<ConversationContext>,
    ) -> GatewayResponse {
        self.process_query_with_cancel(query, context, &CancellationToken::new())
            .await
    }

    /// [`Gateway::process_query`], forwarding `cancel` to dispatched actions
    pub async fn process_query_with_cancel(
        &self,
        query: &str,
        context: Option<ConversationContext>,
        cancel: &CancellationToken,
    ) -> GatewayResponse {
        let started = Instant::now();
        let shared = context.is_none();
        let context = context.unwrap_or_else(|| self.context().snapshot());

        let routing = self.orchestrator.route(query, &context);
        let inferred = self.orchestrator.infer(query, &context, &routing).await;
        let outcome = match inferred {
            Ok(intent) => {
                self.orchestrator
                    .act(query, &intent, &context, cancel)
                    .await
            }
            Err(e) => Err(e),
        };

        let execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(result) => {
                if shared {
                    self.orchestrator.record_exchange(query, &result.message);
                }
                GatewayResponse {
                    success: true,
                    result: Some(result),
                    routing: Some(routing),
                    error: None,
                    execution_time_ms,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "query failed");
                GatewayResponse {
                    success: false,
                    result: None,
                    routing: Some(routing),
                    error: Some(e.to_string()),
                    execution_time_ms,
                }
            }
        }
    }

    /// Record a tool schema without a handler
    pub fn register_tool(&self, name: impl Into<String>, schema: Value) {
        self.registry().register_schema(name, schema);
    }

    /// Register a tool handler
    pub fn register_handler(&self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.registry().register(name, handler);
    }

    /// Registered tools with their schemas, sorted by name
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        let registry = self.registry();
        registry
            .names()
            .into_iter()
            .map(|name| {
                let schema = registry.schema(&name).unwrap_or(Value::Null);
                ToolInfo { name, schema }
            })
            .collect()
    }

    /// Run the voice pipeline on one chunk
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the gateway was built without voice.
    /// Stage faults are reported inside the result.
    pub async fn run_pipeline(&self, chunk: &[u8]) -> Result<PipelineResult> {
        Ok(self.voice_pipeline()?.run(chunk).await)
    }

    /// Run the voice pipeline once per window of `source`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the gateway was built without voice
    pub fn run_stream<S>(
        &self,
        source: S,
    ) -> Result<impl Stream<Item = PipelineResult> + Send + 'static + use<S>>
    where
        S: Stream<Item = Vec<u8>> + Send + 'static,
    {
        Ok(self.voice_pipeline()?.stream(source))
    }

    fn voice_pipeline(&self) -> Result<&VoicePipeline> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| Error::Config("voice pipeline is not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_with_explicit_context_is_stateless() {
        let gateway = Gateway::new(Config::default()).unwrap();

        let response = gateway
            .process_query("打开客厅灯", Some(ConversationContext::default()))
            .await;

        assert!(response.success);
        assert!(gateway.context().is_empty());
    }

    #[tokio::test]
    async fn query_without_context_updates_history() {
        let gateway = Gateway::new(Config::default()).unwrap();

        let response = gateway.process_query("打开客厅灯", None).await;

        assert!(response.success);
        assert_eq!(response.result.unwrap().message, "已打开客厅灯。");
        assert_eq!(gateway.context().len(), 2);
    }

    #[tokio::test]
    async fn pipeline_requires_voice() {
        let gateway = Gateway::new(Config::default()).unwrap();
        assert!(matches!(
            gateway.run_pipeline(&[0; 32]).await,
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn register_tool_lists_schema() {
        let gateway = Gateway::builder(Config::default())
            .without_builtin_tools()
            .build()
            .unwrap();
        gateway.register_tool("weather", serde_json::json!({"type": "object"}));

        let tools = gateway.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "weather");
        assert_eq!(tools[0].schema["type"], "object");
    }
}
