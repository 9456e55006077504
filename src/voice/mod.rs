//! Voice collaborators
//!
//! The pipeline talks to voice activity detection, wake word detection, STT
//! and TTS only through these traits. Audio arrives as little-endian 16-bit
//! mono PCM.

mod audio;
mod fixed;
mod vad;
mod wake_word;

use async_trait::async_trait;

use crate::Result;

pub use audio::{SAMPLE_RATE, pcm16_to_samples, samples_to_pcm16, samples_to_wav, wav_to_pcm16};
pub use fixed::{FixedTranscriber, SilentSynthesizer};
pub use vad::{EnergyVad, calculate_energy};
pub use wake_word::{AlwaysAwake, TranscriptWakeWord};

/// Decides whether a chunk contains speech
#[async_trait]
pub trait VoiceActivityDetector: Send + Sync {
    /// # Errors
    ///
    /// Returns error if the detector fails
    async fn detect(&self, chunk: &[u8]) -> Result<bool>;
}

/// Decides whether a chunk contains the wake word
#[async_trait]
pub trait WakeWordDetector: Send + Sync {
    /// # Errors
    ///
    /// Returns error if the detector fails
    async fn detect(&self, chunk: &[u8]) -> Result<bool>;
}

/// Speech-to-text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a chunk; an empty string means nothing intelligible
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    async fn transcribe(&self, chunk: &[u8]) -> Result<String>;
}

/// Text-to-speech
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text`; the returned audio may be empty
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
