//! Fixed-output collaborators for demos and headless runs

use async_trait::async_trait;

use super::{SAMPLE_RATE, Synthesizer, Transcriber, samples_to_wav};
use crate::Result;

/// Transcriber that always returns the same text
#[derive(Debug, Clone, Default)]
pub struct FixedTranscriber {
    text: String,
}

impl FixedTranscriber {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _chunk: &[u8]) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Synthesizer producing a header-only WAV
#[derive(Debug, Clone, Copy)]
pub struct SilentSynthesizer {
    sample_rate: u32,
}

impl Default for SilentSynthesizer {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

impl SilentSynthesizer {
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

#[async_trait]
impl Synthesizer for SilentSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        tracing::debug!(chars = text.chars().count(), "synthesizing silence");
        samples_to_wav(&[], self.sample_rate)
    }
}
