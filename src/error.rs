//! Error types for the voiceos gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voiceos gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (invalid bound or table at construction)
    #[error("configuration error: {0}")]
    Config(String),

    /// Voice activity detection error
    #[error("voice activity error: {0}")]
    VoiceActivity(String),

    /// Wake word detection error
    #[error("wake word error: {0}")]
    WakeWord(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Intent inference error
    #[error("inference error: {0}")]
    Inference(String),

    /// Memory store error
    #[error("memory error: {0}")]
    Memory(String),

    /// Tool handler error
    #[error("tool error: {0}")]
    Tool(String),

    /// Audio decoding/encoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
