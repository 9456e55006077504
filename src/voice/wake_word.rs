//! Wake word detection
//!
//! Hybrid approach: the chunk is transcribed and the transcript checked for a
//! configured wake word.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Transcriber, WakeWordDetector};
use crate::Result;

/// Detects wake words by transcribing the chunk
pub struct TranscriptWakeWord {
    wake_words: Vec<String>,
    transcriber: Arc<dyn Transcriber>,
}

impl std::fmt::Debug for TranscriptWakeWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptWakeWord")
            .field("wake_words", &self.wake_words)
            .finish_non_exhaustive()
    }
}

impl TranscriptWakeWord {
    /// Create a new wake word detector
    ///
    /// # Arguments
    ///
    /// * `wake_words` - List of wake words to detect (e.g., "你好富迪")
    /// * `transcriber` - STT used to verify the wake word
    #[must_use]
    pub fn new(wake_words: Vec<String>, transcriber: Arc<dyn Transcriber>) -> Self {
        let normalized: Vec<String> = wake_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        tracing::debug!(wake_words = ?normalized, "wake word detector initialized");

        Self {
            wake_words: normalized,
            transcriber,
        }
    }

    /// Check if transcribed text contains a wake word
    #[must_use]
    pub fn check_wake_word(&self, transcript: &str) -> bool {
        let normalized = transcript.to_lowercase();

        for wake_word in &self.wake_words {
            if normalized.contains(wake_word.as_str()) {
                tracing::info!(wake_word, transcript, "wake word detected");
                return true;
            }
        }

        false
    }

    /// Get the configured wake words
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }
}

#[async_trait]
impl WakeWordDetector for TranscriptWakeWord {
    async fn detect(&self, chunk: &[u8]) -> Result<bool> {
        let transcript = self.transcriber.transcribe(chunk).await?;
        Ok(self.check_wake_word(&transcript))
    }
}

/// Push-to-talk: every chunk counts as addressed to the assistant
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAwake;

#[async_trait]
impl WakeWordDetector for AlwaysAwake {
    async fn detect(&self, _chunk: &[u8]) -> Result<bool> {
        Ok(true)
    }
}
