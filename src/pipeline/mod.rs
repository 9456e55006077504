//! Voice pipeline state machine
//!
//! One run takes a chunk of 16-bit PCM through
//! `VOICE_ACTIVITY → WAKE_DETECT → TRANSCRIBE → INFER → ACT → SYNTHESIZE`.
//! A negative detection ends the run early with success and nothing said. A
//! collaborator fault ends it with a [`PipelineError`] naming the stage. Every
//! stage entered is timed, and so is the whole run.

mod stream;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer, ser::SerializeMap};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::Result;
use crate::config::AudioConfig;
use crate::gateway::Orchestrator;
use crate::intent::IntentResult;
use crate::router::RoutingDecision;
use crate::tools::ActionOutcome;
use crate::voice::{
    EnergyVad, Synthesizer, Transcriber, TranscriptWakeWord, VoiceActivityDetector,
    WakeWordDetector,
};

pub use stream::{AudioWindower, audio_windows};

/// Timing key for the whole run
pub const TOTAL: &str = "total";

/// One named pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    VoiceActivity,
    WakeDetect,
    Transcribe,
    Infer,
    Act,
    Synthesize,
}

impl Stage {
    /// Stages in execution order
    pub const ALL: [Self; 6] = [
        Self::VoiceActivity,
        Self::WakeDetect,
        Self::Transcribe,
        Self::Infer,
        Self::Act,
        Self::Synthesize,
    ];

    /// Timing key for this stage
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::VoiceActivity => "voice_activity",
            Self::WakeDetect => "wake_detect",
            Self::Transcribe => "transcribe",
            Self::Infer => "infer",
            Self::Act => "act",
            Self::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Elapsed time per stage tag, plus [`TOTAL`]
///
/// Serializes as a map of tag to milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageTimings(BTreeMap<&'static str, Duration>);

impl StageTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tag: &'static str, elapsed: Duration) {
        self.0.insert(tag, elapsed);
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Duration> {
        self.0.get(tag).copied()
    }

    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<Duration> {
        self.get(stage.tag())
    }

    #[must_use]
    pub fn total(&self) -> Option<Duration> {
        self.get(TOTAL)
    }

    /// Recorded tags in sorted order
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for StageTimings {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tag, elapsed) in &self.0 {
            map.serialize_entry(tag, &(elapsed.as_secs_f64() * 1000.0))?;
        }
        map.end()
    }
}

/// A collaborator fault that ended a run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("{stage} stage failed: {message}")]
pub struct PipelineError {
    pub stage: Stage,
    pub message: String,
}

/// Result of one pipeline run
///
/// `success` is false exactly when `error` is set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    pub success: bool,
    pub transcript: String,
    pub intent: Option<IntentResult>,
    pub routing: Option<RoutingDecision>,
    pub outcomes: Vec<ActionOutcome>,
    /// Spoken reply text
    pub response: String,
    #[serde(skip)]
    pub audio: Vec<u8>,
    pub stages: StageTimings,
    pub error: Option<PipelineError>,
}

impl PipelineResult {
    /// True when the run stopped at a negative detection
    #[must_use]
    pub fn is_early_exit(&self) -> bool {
        self.success && self.stages.stage(Stage::Transcribe).is_none()
    }
}

/// Voice perception collaborators
#[derive(Clone)]
pub struct VoiceStack {
    pub vad: Arc<dyn VoiceActivityDetector>,
    pub wake_word: Arc<dyn WakeWordDetector>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

impl fmt::Debug for VoiceStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceStack").finish_non_exhaustive()
    }
}

impl VoiceStack {
    /// Energy VAD and transcript wake word detection from configuration
    ///
    /// The wake word detector shares `transcriber`.
    #[must_use]
    pub fn from_config(
        audio: &AudioConfig,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            vad: Arc::new(EnergyVad::new(audio.vad_threshold)),
            wake_word: Arc::new(TranscriptWakeWord::new(
                audio.wake_words.clone(),
                Arc::clone(&transcriber),
            )),
            transcriber,
            synthesizer,
        }
    }

    /// Replace the wake word detector
    #[must_use]
    pub fn with_wake_word(mut self, wake_word: Arc<dyn WakeWordDetector>) -> Self {
        self.wake_word = wake_word;
        self
    }
}

/// Sequences perception, orchestration and synthesis for one chunk at a time
#[derive(Debug, Clone)]
pub struct VoicePipeline {
    voice: VoiceStack,
    orchestrator: Arc<Orchestrator>,
    window_bytes: usize,
    stream_concurrency: usize,
}

impl VoicePipeline {
    #[must_use]
    pub fn new(voice: VoiceStack, orchestrator: Arc<Orchestrator>, audio: &AudioConfig) -> Self {
        Self {
            voice,
            orchestrator,
            window_bytes: audio.window_bytes(),
            stream_concurrency: audio.stream_concurrency.max(1),
        }
    }

    /// Bytes per streaming window
    #[must_use]
    pub const fn window_bytes(&self) -> usize {
        self.window_bytes
    }

    #[must_use]
    pub const fn stream_concurrency(&self) -> usize {
        self.stream_concurrency
    }

    /// Process one chunk end to end
    pub async fn run(&self, chunk: &[u8]) -> PipelineResult {
        self.run_with_cancel(chunk, &CancellationToken::new()).await
    }

    /// Process one chunk, forwarding `cancel` to dispatched actions
    pub async fn run_with_cancel(&self, chunk: &[u8], cancel: &CancellationToken) -> PipelineResult {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", %run_id, bytes = chunk.len());

        async {
            let started = Instant::now();
            let mut run = Run::default();

            if let Err(error) = self.drive(chunk, cancel, &mut run).await {
                tracing::warn!(stage = %error.stage, error = %error.message, "pipeline run failed");
                run.result.error = Some(error);
            }

            run.result.success = run.result.error.is_none();
            run.result.stages.record(TOTAL, started.elapsed());

            tracing::info!(
                success = run.result.success,
                elapsed_ms = run.result.stages.total().unwrap_or_default().as_secs_f64() * 1000.0,
                "pipeline run finished"
            );

            run.result
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        chunk: &[u8],
        cancel: &CancellationToken,
        run: &mut Run,
    ) -> std::result::Result<(), PipelineError> {
        let speech = run
            .stage(Stage::VoiceActivity, self.voice.vad.detect(chunk))
            .await?;
        if !speech {
            tracing::debug!("no speech detected");
            return Ok(());
        }

        let awake = run
            .stage(Stage::WakeDetect, self.voice.wake_word.detect(chunk))
            .await?;
        if !awake {
            tracing::debug!("no wake word detected");
            return Ok(());
        }

        let transcript = run
            .stage(Stage::Transcribe, self.voice.transcriber.transcribe(chunk))
            .await?;
        tracing::info!(transcript = %transcript, "transcribed");
        run.result.transcript.clone_from(&transcript);

        let context = self.orchestrator.context().snapshot();
        let routing = self.orchestrator.route(&transcript, &context);
        let intent = run
            .stage(
                Stage::Infer,
                self.orchestrator.infer(&transcript, &context, &routing),
            )
            .await;
        run.result.routing = Some(routing);
        let intent = intent?;

        let aggregate = run
            .stage(
                Stage::Act,
                self.orchestrator.act(&transcript, &intent, &context, cancel),
            )
            .await?;
        let response = aggregate.message;
        run.result.intent = Some(intent);
        run.result.outcomes = aggregate.outputs;
        run.result.response.clone_from(&response);

        run.result.audio = run
            .stage(Stage::Synthesize, self.voice.synthesizer.synthesize(&response))
            .await?;

        self.orchestrator.record_exchange(&transcript, &response);

        Ok(())
    }
}

#[derive(Default)]
struct Run {
    result: PipelineResult,
}

impl Run {
    /// Time one stage and map its fault to a [`PipelineError`]
    async fn stage<T>(
        &mut self,
        stage: Stage,
        work: impl Future<Output = Result<T>>,
    ) -> std::result::Result<T, PipelineError> {
        let started = Instant::now();
        let outcome = work.await;
        self.result.stages.record(stage.tag(), started.elapsed());

        outcome.map_err(|e| PipelineError {
            stage,
            message: e.to_string(),
        })
    }
}
