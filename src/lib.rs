//! VoiceOS Gateway - voice request routing and orchestration core
//!
//! This library provides the core of the `VoiceOS` gateway:
//! - Complexity routing of queries to on-device, edge or cloud backends
//! - A bounded conversation context store
//! - The voice pipeline state machine (VAD, wake word, STT, inference,
//!   actions, TTS) with per-stage timing and windowed streaming
//! - A tool registry and concurrent action dispatcher
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │        HTTP API   │   CLI   │   audio stream         │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                     Gateway                          │
//! │  Pipeline │ Router │ Context │ Inferer │ Memory     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Dispatcher + Tool Registry              │
//! │   smart home │ music │ volume │ time │ chat │ ...   │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod intent;
pub mod memory;
pub mod pipeline;
pub mod router;
pub mod tools;
pub mod voice;

pub use config::Config;
pub use context::{ContextStore, ConversationContext, ConversationTurn, Role};
pub use error::{Error, Result};
pub use gateway::{Aggregate, Gateway, GatewayBuilder, GatewayResponse, Orchestrator, ToolInfo};
pub use intent::{Action, InferenceRequest, IntentInferer, IntentResult, KeywordInferer, TaskType};
pub use memory::{Memory, MemoryStore, NullMemory};
pub use pipeline::{
    AudioWindower, PipelineError, PipelineResult, Stage, StageTimings, VoicePipeline, VoiceStack,
};
pub use router::{Complexity, ComplexityRouter, RoutingDecision};
pub use tools::{ActionDispatcher, ActionError, ActionOutcome, ToolHandler, ToolRegistry};
