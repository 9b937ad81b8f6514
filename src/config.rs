use anyhow::{Context, Result};
use serde::Deserialize;
use std::num::NonZeroUsize;

use crate::engine::RecognitionConfig;

/// Default config file location (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config/stt-relay";

/// Prefix for environment overrides, e.g. `STT_RELAY__SERVICE__HTTP__PORT`
const ENV_PREFIX: &str = "STT_RELAY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub recognition: RecognitionConfig,
    pub audio: AudioConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "stt-relay".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 50051,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Maximum bytes per upstream write; zero is rejected at load time
    pub chunk_size: NonZeroUsize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::audio::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Which upstream recognition engine to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Nats,
    /// In-memory engine that never produces results (dry runs)
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    pub nats_url: String,
    pub subject_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Nats,
            nats_url: "nats://localhost:4222".to_string(),
            subject_prefix: "stt.stream".to_string(),
        }
    }
}

impl Config {
    /// Load from a config file that must exist, then apply environment overrides
    pub fn load(path: &str) -> Result<Self> {
        Self::build(path, true).with_context(|| format!("Failed to load config from {}", path))
    }

    /// Like [`Config::load`], but a missing file falls back to defaults
    pub fn load_optional(path: &str) -> Result<Self> {
        Self::build(path, false).with_context(|| format!("Failed to load config from {}", path))
    }

    fn build(path: &str, required: bool) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioEncoding;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
[service]
name = "relay-test"

[service.http]
bind = "127.0.0.1"
port = 6000

[recognition]
encoding = "MULAW"
sample_rate_hertz = 16000
language_code = "en-US"
speech_contexts = [{ phrases = ["hoful", "shwazil"] }]

[audio]
chunk_size = 3200

[engine]
kind = "mock"
"#,
        );

        let cfg = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.service.name, "relay-test");
        assert_eq!(cfg.service.http.port, 6000);
        assert_eq!(cfg.recognition.encoding, AudioEncoding::Mulaw);
        assert_eq!(cfg.recognition.sample_rate_hertz, 16000);
        assert_eq!(cfg.recognition.speech_contexts[0].phrases.len(), 2);
        assert!(cfg.recognition.interim_results);
        assert_eq!(cfg.audio.chunk_size.get(), 3200);
        assert_eq!(cfg.engine.kind, EngineKind::Mock);
        assert_eq!(cfg.engine.subject_prefix, "stt.stream");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");

        let cfg = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.service.http.port, 50051);
        assert_eq!(cfg.audio.chunk_size.get(), 1600);
        assert_eq!(cfg.recognition.language_code, "ko-KR");
        assert_eq!(cfg.engine.kind, EngineKind::Nats);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let file = write_config("[audio]\nchunk_size = 0\n");

        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_missing_required_file_fails() {
        assert!(Config::load("/nonexistent/stt-relay-config").is_err());
        assert!(Config::load_optional("/nonexistent/stt-relay-config").is_ok());
    }
}
