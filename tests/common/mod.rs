//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use voiceos_gateway::context::ConversationContext;
use voiceos_gateway::gateway::Aggregate;
use voiceos_gateway::intent::{InferenceRequest, IntentInferer, IntentResult};
use voiceos_gateway::memory::{Memory, MemoryStore};
use voiceos_gateway::pipeline::VoiceStack;
use voiceos_gateway::voice::{Synthesizer, Transcriber, VoiceActivityDetector, WakeWordDetector};
use voiceos_gateway::{Config, Error, Gateway, Result};

/// Detector with a fixed answer
pub struct Fixed(pub bool);

#[async_trait]
impl VoiceActivityDetector for Fixed {
    async fn detect(&self, _chunk: &[u8]) -> Result<bool> {
        Ok(self.0)
    }
}

#[async_trait]
impl WakeWordDetector for Fixed {
    async fn detect(&self, _chunk: &[u8]) -> Result<bool> {
        Ok(self.0)
    }
}

/// Detector that always faults
pub struct BrokenDetector;

#[async_trait]
impl VoiceActivityDetector for BrokenDetector {
    async fn detect(&self, _chunk: &[u8]) -> Result<bool> {
        Err(Error::VoiceActivity("microphone unplugged".to_string()))
    }
}

/// Transcriber returning a fixed transcript or a fault
pub struct ScriptedTranscriber {
    transcript: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedTranscriber {
    pub fn says(text: &str) -> Arc<Self> {
        Arc::new(Self {
            transcript: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            transcript: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _chunk: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcript
            .clone()
            .ok_or_else(|| Error::Stt("recognizer offline".to_string()))
    }
}

/// Transcriber naming the window by its first byte
///
/// Earlier windows take longer so concurrent runs finish out of order.
pub struct WindowTranscriber;

#[async_trait]
impl Transcriber for WindowTranscriber {
    async fn transcribe(&self, chunk: &[u8]) -> Result<String> {
        let index = chunk.first().copied().unwrap_or_default();
        let delay = 50_u64.saturating_sub(u64::from(index) * 20);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(format!("window {index}"))
    }
}

/// Synthesizer echoing the text as bytes
pub struct EchoSynthesizer;

#[async_trait]
impl Synthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}

/// Synthesizer that always faults
pub struct BrokenSynthesizer;

#[async_trait]
impl Synthesizer for BrokenSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Err(Error::Tts("speaker busy".to_string()))
    }
}

/// Inferer whose backend is unreachable
pub struct Offline;

#[async_trait]
impl IntentInferer for Offline {
    async fn infer(&self, _request: InferenceRequest<'_>) -> Result<IntentResult> {
        Err(Error::Inference("backend unreachable".to_string()))
    }
}

/// Memory store that recalls nothing and cannot store
pub struct ReadOnlyMemory;

#[async_trait]
impl MemoryStore for ReadOnlyMemory {
    async fn recall(&self, _query: &str, _context: &ConversationContext) -> Result<Vec<Memory>> {
        Ok(Vec::new())
    }

    async fn remember(
        &self,
        _query: &str,
        _result: &Aggregate,
        _context: &ConversationContext,
    ) -> Result<()> {
        Err(Error::Memory("store is read-only".to_string()))
    }
}

/// Voice stack with fixed detectors
pub fn voice(speech: bool, awake: bool, transcriber: Arc<dyn Transcriber>) -> VoiceStack {
    VoiceStack {
        vad: Arc::new(Fixed(speech)),
        wake_word: Arc::new(Fixed(awake)),
        transcriber,
        synthesizer: Arc::new(EchoSynthesizer),
    }
}

/// Config with a small streaming window
pub fn small_window_config(window_bytes: u16) -> Config {
    let mut config = Config::default();
    // 1000 Hz at one byte per sample: window_ms bytes per window
    config.audio.sample_rate = 1000;
    config.audio.sample_width = 1;
    config.audio.window_ms = u64::from(window_bytes);
    config
}

/// Gateway with a voice pipeline
pub fn voice_gateway(config: Config, voice: VoiceStack) -> Gateway {
    Gateway::builder(config)
        .voice(voice)
        .build()
        .expect("failed to build gateway")
}
