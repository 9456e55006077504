//! Configuration management for the voiceos gateway
//!
//! Values are resolved in three layers: built-in defaults, the optional TOML
//! file (see [`file`]), then `VOICEOS_*` environment overrides. The result is
//! validated once; an invalid bound or table is a startup error.

pub mod file;

use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Default conversation-history bound
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Default audio sample rate (16kHz for speech)
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Default per-action handler timeout
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Highest sample rate accepted by [`Config::validate`]
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Longest streaming window accepted by [`Config::validate`]
pub const MAX_WINDOW_MS: u64 = 60_000;

/// Keywords that indicate a simple, device-local command
pub const DEFAULT_SIMPLE_KEYWORDS: &[&str] = &[
    "打开", "关闭", "调亮", "调暗", "开关", "播放", "暂停", "停止", "温度", "模式", "查询状态",
    "现在几",
];

/// Keywords that indicate a request needing multi-step reasoning
pub const DEFAULT_COMPLEX_KEYWORDS: &[&str] = &[
    "帮我", "能不能", "怎么办", "分析", "比较", "推荐", "计划", "安排", "搜索", "周末", "旅行",
    "露营",
];

/// Gateway configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Conversation history configuration
    pub history: HistoryConfig,

    /// Audio windowing and detection configuration
    pub audio: AudioConfig,

    /// Action dispatch configuration
    pub dispatch: DispatchConfig,

    /// Complexity router configuration
    pub router: RouterConfig,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Conversation history configuration
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of turns kept in the context store
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Audio configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate of incoming PCM audio
    pub sample_rate: u32,

    /// Bytes per sample (2 for 16-bit PCM)
    pub sample_width: u16,

    /// Streaming window length in milliseconds
    pub window_ms: u64,

    /// RMS energy above which a chunk counts as speech
    pub vad_threshold: f32,

    /// Maximum number of windows processed concurrently when streaming
    pub stream_concurrency: usize,

    /// Wake words (e.g. "你好富迪")
    pub wake_words: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            sample_width: 2,
            window_ms: 1000,
            vad_threshold: 0.01,
            stream_concurrency: 1,
            wake_words: vec!["你好富迪".to_string()],
        }
    }
}

impl AudioConfig {
    /// Number of bytes in one streaming window, saturating at `usize::MAX`
    #[must_use]
    pub fn window_bytes(&self) -> usize {
        self.checked_window_bytes().unwrap_or(usize::MAX)
    }

    /// Number of bytes in one streaming window, `None` on overflow
    #[must_use]
    pub fn checked_window_bytes(&self) -> Option<usize> {
        let bytes_per_second =
            u64::from(self.sample_rate).checked_mul(u64::from(self.sample_width))?;
        let bytes = bytes_per_second.checked_mul(self.window_ms)? / 1000;
        usize::try_from(bytes).ok()
    }
}

/// Action dispatch configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Upper bound on a single handler invocation
    pub action_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            action_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }
}

/// Complexity router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Keywords scored towards the simple tier
    pub simple_keywords: Vec<String>,

    /// Keywords scored towards the complex tier
    pub complex_keywords: Vec<String>,

    /// Tier to backend mapping
    pub backends: BackendTable,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            simple_keywords: DEFAULT_SIMPLE_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            complex_keywords: DEFAULT_COMPLEX_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            backends: BackendTable::default(),
        }
    }
}

/// Backend identifier for each complexity tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTable {
    pub simple: String,
    pub medium: String,
    pub complex: String,
}

impl Default for BackendTable {
    fn default() -> Self {
        Self {
            simple: "on-device-small".to_string(),
            medium: "cloud-medium".to_string(),
            complex: "cloud-large".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

impl Config {
    /// Load configuration from the default file location and environment
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        Self::load_with_options(None)
    }

    /// Load configuration with an explicit config file path
    ///
    /// When `path` is given the file must exist and parse; the default
    /// location is optional and falls back to built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file cannot be read or parsed, or if the
    /// resulting configuration is invalid
    pub fn load_with_options(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => file::read_config_file(p)?,
            None => file::load_config_file(),
        };

        let mut config = Self::default();
        config.apply_file(file);
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Overlay values present in a config file
    pub fn apply_file(&mut self, file: file::GatewayConfigFile) {
        if let Some(max_history) = file.context.max_history {
            self.history.max_history = max_history;
        }

        let audio = file.audio;
        if let Some(v) = audio.sample_rate {
            self.audio.sample_rate = v;
        }
        if let Some(v) = audio.sample_width {
            self.audio.sample_width = v;
        }
        if let Some(v) = audio.window_ms {
            self.audio.window_ms = v;
        }
        if let Some(v) = audio.vad_threshold {
            self.audio.vad_threshold = v;
        }
        if let Some(v) = audio.stream_concurrency {
            self.audio.stream_concurrency = v;
        }
        if let Some(v) = audio.wake_words {
            self.audio.wake_words = v;
        }

        if let Some(ms) = file.dispatch.action_timeout_ms {
            self.dispatch.action_timeout = Duration::from_millis(ms);
        }

        let router = file.router;
        if let Some(v) = router.simple_keywords {
            self.router.simple_keywords = v;
        }
        if let Some(v) = router.complex_keywords {
            self.router.complex_keywords = v;
        }
        if let Some(v) = router.backends.simple {
            self.router.backends.simple = v;
        }
        if let Some(v) = router.backends.medium {
            self.router.backends.medium = v;
        }
        if let Some(v) = router.backends.complex {
            self.router.backends.complex = v;
        }

        if let Some(port) = file.server.port {
            self.server.port = port;
        }
    }

    /// Overlay `VOICEOS_*` environment overrides
    ///
    /// `lookup` stands in for the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = parse_env(&lookup, "VOICEOS_PORT") {
            self.server.port = v;
        }
        if let Some(v) = parse_env(&lookup, "VOICEOS_SAMPLE_RATE") {
            self.audio.sample_rate = v;
        }
        if let Some(v) = parse_env(&lookup, "VOICEOS_MAX_HISTORY") {
            self.history.max_history = v;
        }
        if let Some(ms) = parse_env(&lookup, "VOICEOS_ACTION_TIMEOUT_MS") {
            self.dispatch.action_timeout = Duration::from_millis(ms);
        }
        if let Some(words) = lookup("VOICEOS_WAKE_WORDS") {
            self.audio.wake_words = words
                .split(',')
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(ToString::to_string)
                .collect();
        }
    }

    /// Check bounds and tables
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.history.max_history == 0 {
            return Err(Error::Config("context.max_history must be at least 1".to_string()));
        }
        if self.audio.sample_rate == 0 || self.audio.sample_rate > MAX_SAMPLE_RATE {
            return Err(Error::Config(format!(
                "audio.sample_rate must be in 1..={MAX_SAMPLE_RATE}, got {}",
                self.audio.sample_rate
            )));
        }
        if !(1..=4).contains(&self.audio.sample_width) {
            return Err(Error::Config(format!(
                "audio.sample_width must be 1 to 4 bytes, got {}",
                self.audio.sample_width
            )));
        }
        if self.audio.window_ms > MAX_WINDOW_MS {
            return Err(Error::Config(format!(
                "audio.window_ms must be at most {MAX_WINDOW_MS}, got {}",
                self.audio.window_ms
            )));
        }
        match self.audio.checked_window_bytes() {
            None => {
                return Err(Error::Config(
                    "audio window size overflows; lower sample_rate or sample_width".to_string(),
                ));
            }
            Some(0) => {
                return Err(Error::Config("audio window must hold at least one byte".to_string()));
            }
            Some(_) => {}
        }
        if self.audio.stream_concurrency == 0 {
            return Err(Error::Config(
                "audio.stream_concurrency must be at least 1".to_string(),
            ));
        }
        if !self.audio.vad_threshold.is_finite() || self.audio.vad_threshold < 0.0 {
            return Err(Error::Config(format!(
                "audio.vad_threshold must be a non-negative number, got {}",
                self.audio.vad_threshold
            )));
        }
        if self.dispatch.action_timeout.is_zero() {
            return Err(Error::Config(
                "dispatch.action_timeout_ms must be positive".to_string(),
            ));
        }

        let keywords = self
            .router
            .simple_keywords
            .iter()
            .chain(&self.router.complex_keywords);
        for keyword in keywords {
            // An empty keyword matches every query
            if keyword.trim().is_empty() {
                return Err(Error::Config("router keywords must not be empty".to_string()));
            }
        }

        let backends = &self.router.backends;
        for (tier, id) in [
            ("simple", &backends.simple),
            ("medium", &backends.medium),
            ("complex", &backends.complex),
        ] {
            if id.trim().is_empty() {
                return Err(Error::Config(format!("router.backends.{tier} is empty")));
            }
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
