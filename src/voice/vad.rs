//! Energy-based voice activity detection

use async_trait::async_trait;

use super::{VoiceActivityDetector, pcm16_to_samples};
use crate::Result;

/// Flags a chunk as speech when its RMS energy exceeds a threshold
#[derive(Debug, Clone, Copy)]
pub struct EnergyVad {
    threshold: f32,
}

impl EnergyVad {
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Synchronous check on raw PCM
    #[must_use]
    pub fn is_speech(&self, chunk: &[u8]) -> bool {
        let energy = calculate_energy(&pcm16_to_samples(chunk));
        tracing::trace!(energy, threshold = self.threshold, "chunk energy");
        energy > self.threshold
    }
}

#[async_trait]
impl VoiceActivityDetector for EnergyVad {
    async fn detect(&self, chunk: &[u8]) -> Result<bool> {
        Ok(self.is_speech(chunk))
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::samples_to_pcm16;

    #[test]
    fn test_energy_calculation() {
        let silence = vec![0.0f32; 100];
        assert!(calculate_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(calculate_energy(&loud) > 0.4);

        assert!(calculate_energy(&[]).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn silence_is_not_speech() {
        let vad = EnergyVad::new(0.01);
        assert!(!vad.detect(&vec![0u8; 3200]).await.unwrap());
        assert!(!vad.detect(&[]).await.unwrap());
    }

    #[tokio::test]
    async fn loud_chunk_is_speech() {
        let vad = EnergyVad::new(0.01);
        let chunk = samples_to_pcm16(&vec![0.3f32; 1600]);
        assert!(vad.detect(&chunk).await.unwrap());
    }
}
