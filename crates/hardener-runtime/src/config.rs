//! Runtime configuration.
//!
//! Loaded from an optional YAML file; command-line flags and HTTP request
//! fields override individual values afterwards.
//!
//! ```yaml
//! loop:
//!   target_score: 80
//!   max_iterations: 3
//! assessor:
//!   command: 42c
//!   config_path: security/42c-conf.yaml
//!   report: file
//! corrector:
//!   mode: auto
//! generator:
//!   provider: azure-openai
//!   timeout: 2m
//!   options:
//!     deployment: gpt-4o
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default iteration budget when none is configured.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Default generator timeout.
pub const DEFAULT_GENERATOR_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration problems detected before the loop starts.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("target_score is required")]
    MissingTargetScore,

    #[error("target_score must be between 0 and 100, got {0}")]
    InvalidTargetScore(u32),

    #[error("max_iterations must be at least 1")]
    ZeroMaxIterations,

    #[error("generative correction requires a generator provider: {0}")]
    GeneratorRequired(String),

    #[error("unknown generator provider '{provider}' (available: {available:?})")]
    UnknownProvider {
        provider: String,
        available: Vec<String>,
    },

    #[error("invalid generator options: {0}")]
    InvalidGeneratorOptions(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardenerConfig {
    #[serde(rename = "loop", default)]
    pub convergence: LoopConfig,

    #[serde(default)]
    pub assessor: AssessorConfig,

    #[serde(default)]
    pub corrector: CorrectorConfig,

    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
}

impl HardenerConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Resolve and check the loop bounds.
    pub fn loop_settings(&self) -> Result<LoopSettings, ConfigurationError> {
        let target = self
            .convergence
            .target_score
            .ok_or(ConfigurationError::MissingTargetScore)?;
        if target > 100 {
            return Err(ConfigurationError::InvalidTargetScore(target));
        }
        if self.convergence.max_iterations == 0 {
            return Err(ConfigurationError::ZeroMaxIterations);
        }

        Ok(LoopSettings {
            target_score: target as u8,
            max_iterations: self.convergence.max_iterations,
        })
    }
}

/// `loop:` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoopConfig {
    /// Required before a session can start; no default on purpose.
    #[serde(default)]
    pub target_score: Option<u32>,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_score: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Validated loop bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub target_score: u8,
    pub max_iterations: u32,
}

/// Where the assessor writes its report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// `--output-file <path>`, read back after the process exits
    #[default]
    File,
    /// Parsed from the process's stdout
    Stdout,
}

/// `assessor:` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssessorConfig {
    #[serde(default = "default_assessor_command")]
    pub command: String,

    /// Passed as `--config <path>` when set
    #[serde(default)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub report: ReportMode,

    /// Appended after the standard arguments, before the artifact path
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_assessor_command() -> String {
    "42c".to_string()
}

impl Default for AssessorConfig {
    fn default() -> Self {
        Self {
            command: default_assessor_command(),
            config_path: None,
            report: ReportMode::File,
            extra_args: Vec::new(),
        }
    }
}

/// How the corrector strategy is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectorMode {
    /// Generative when a provider is configured and healthy, else deterministic
    #[default]
    Auto,
    /// Generative or fail at startup
    Generative,
    /// Never call the generator
    Deterministic,
}

impl std::str::FromStr for CorrectorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(CorrectorMode::Auto),
            "generative" => Ok(CorrectorMode::Generative),
            "deterministic" => Ok(CorrectorMode::Deterministic),
            other => Err(format!(
                "unknown corrector mode '{}' (expected auto, generative or deterministic)",
                other
            )),
        }
    }
}

/// `corrector:` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrectorConfig {
    #[serde(default)]
    pub mode: CorrectorMode,
}

/// `generator:` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Registry key, e.g. "azure-openai" or "anthropic"
    pub provider: String,

    #[serde(
        default = "default_generator_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub timeout: Duration,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Provider-specific options (credentials, endpoint, model)
    #[serde(default = "empty_options")]
    pub options: serde_json::Value,
}

impl GeneratorConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            timeout: DEFAULT_GENERATOR_TIMEOUT,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            options: empty_options(),
        }
    }
}

fn default_generator_timeout() -> Duration {
    DEFAULT_GENERATOR_TIMEOUT
}

fn default_max_tokens() -> u32 {
    8_000
}

fn default_temperature() -> f32 {
    0.2
}

fn empty_options() -> serde_json::Value {
    serde_json::json!({})
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = HardenerConfig::from_yaml(
            r#"
loop:
  target_score: 85
  max_iterations: 5
assessor:
  command: /usr/local/bin/42c
  config_path: security/42c-conf.yaml
  report: stdout
  extra_args: ["--verbose"]
corrector:
  mode: generative
generator:
  provider: azure-openai
  timeout: 90s
  options:
    deployment: gpt-4o
"#,
        )
        .unwrap();

        let settings = config.loop_settings().unwrap();
        assert_eq!(settings.target_score, 85);
        assert_eq!(settings.max_iterations, 5);
        assert_eq!(config.assessor.report, ReportMode::Stdout);
        assert_eq!(config.corrector.mode, CorrectorMode::Generative);

        let generator = config.generator.unwrap();
        assert_eq!(generator.timeout, Duration::from_secs(90));
        assert_eq!(generator.max_tokens, 8_000);
        assert_eq!(generator.options["deployment"], "gpt-4o");
    }

    #[test]
    fn test_defaults() {
        let config = HardenerConfig::from_yaml("loop:\n  target_score: 80\n").unwrap();
        assert_eq!(config.convergence.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.assessor.command, "42c");
        assert_eq!(config.assessor.report, ReportMode::File);
        assert_eq!(config.corrector.mode, CorrectorMode::Auto);
        assert!(config.generator.is_none());
    }

    #[test]
    fn test_target_score_is_required() {
        let config = HardenerConfig::default();
        assert!(matches!(
            config.loop_settings(),
            Err(ConfigurationError::MissingTargetScore)
        ));
    }

    #[test]
    fn test_rejects_out_of_range_bounds() {
        let config = HardenerConfig::from_yaml("loop:\n  target_score: 120\n").unwrap();
        assert!(matches!(
            config.loop_settings(),
            Err(ConfigurationError::InvalidTargetScore(120))
        ));

        let config =
            HardenerConfig::from_yaml("loop:\n  target_score: 80\n  max_iterations: 0\n").unwrap();
        assert!(matches!(
            config.loop_settings(),
            Err(ConfigurationError::ZeroMaxIterations)
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(HardenerConfig::from_yaml("loop:\n  target: 80\n").is_err());
    }

    #[test]
    fn test_bad_duration_rejected() {
        let result = HardenerConfig::from_yaml("generator:\n  provider: anthropic\n  timeout: soon\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_corrector_mode_from_str() {
        assert_eq!("AUTO".parse::<CorrectorMode>(), Ok(CorrectorMode::Auto));
        assert!("llm".parse::<CorrectorMode>().is_err());
    }
}
