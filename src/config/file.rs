//! TOML configuration file loading
//!
//! Supports `~/.config/voiceos/gateway.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct GatewayConfigFile {
    /// Conversation history
    #[serde(default)]
    pub context: ContextFileConfig,

    /// Audio windowing and detection
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Action dispatch
    #[serde(default)]
    pub dispatch: DispatchFileConfig,

    /// Complexity router
    #[serde(default)]
    pub router: RouterFileConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Conversation history configuration
#[derive(Debug, Default, Deserialize)]
pub struct ContextFileConfig {
    pub max_history: Option<usize>,
}

/// Audio configuration
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    pub sample_rate: Option<u32>,
    pub sample_width: Option<u16>,
    pub window_ms: Option<u64>,
    pub vad_threshold: Option<f32>,
    pub stream_concurrency: Option<usize>,
    pub wake_words: Option<Vec<String>>,
}

/// Action dispatch configuration
#[derive(Debug, Default, Deserialize)]
pub struct DispatchFileConfig {
    /// Per-action timeout in milliseconds
    pub action_timeout_ms: Option<u64>,
}

/// Router configuration
#[derive(Debug, Default, Deserialize)]
pub struct RouterFileConfig {
    pub simple_keywords: Option<Vec<String>>,
    pub complex_keywords: Option<Vec<String>>,

    /// Tier to backend id table
    #[serde(default)]
    pub backends: BackendsFileConfig,
}

/// Tier to backend id table
#[derive(Debug, Default, Deserialize)]
pub struct BackendsFileConfig {
    pub simple: Option<String>,
    pub medium: Option<String>,
    pub complex: Option<String>,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,
}

/// Load the TOML config file from the standard path
///
/// Returns `GatewayConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> GatewayConfigFile {
    let Some(path) = config_file_path() else {
        return GatewayConfigFile::default();
    };

    if !path.exists() {
        return GatewayConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            GatewayConfigFile::default()
        }
    }
}

/// Read and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<GatewayConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/voiceos/gateway.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voiceos").join("gateway.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;
    use crate::Config;

    #[test]
    fn parses_partial_file() {
        let file: GatewayConfigFile = toml::from_str(
            r#"
            [context]
            max_history = 3

            [router.backends]
            complex = "deepseek-v3"
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_file(file);

        assert_eq!(config.history.max_history, 3);
        assert_eq!(config.router.backends.complex, "deepseek-v3");
        // Untouched sections keep their defaults
        assert_eq!(config.router.backends.simple, "on-device-small");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn explicit_path_is_loaded_and_validated() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "[dispatch]\naction_timeout_ms = 1500\n\n[audio]\nwake_words = [\"hey fudi\"]"
        )
        .unwrap();

        let config = Config::load_with_options(Some(tmp.path())).unwrap();
        assert_eq!(config.dispatch.action_timeout, Duration::from_millis(1500));
        assert_eq!(config.audio.wake_words, vec!["hey fudi"]);
    }

    #[test]
    fn explicit_invalid_file_is_an_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[context]\nmax_history = 0").unwrap();
        assert!(Config::load_with_options(Some(tmp.path())).is_err());
    }

    #[test]
    fn huge_window_in_file_is_a_config_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[audio]\nwindow_ms = 9223372036854775807").unwrap();
        let err = Config::load_with_options(Some(tmp.path())).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(read_config_file(&missing).is_err());
    }
}
