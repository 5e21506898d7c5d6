//! Configuration file handling.
//!
//! This module handles loading `.edscout.toml` files and merging them with
//! command-line overrides. Scoring settings are validated once, at startup,
//! by building the [`Judge`].

use crate::agent::OllamaConfig;
use crate::analysis::{InconclusivePolicy, Judge, Weights};
use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".edscout.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "edscout_report.md".to_string()
}

/// Which back-end screens and scores candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Verdicts and scores recorded in the candidates file
    #[default]
    Recorded,
    /// A local Ollama model
    Ollama,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Recorded => write!(f, "recorded"),
            Provider::Ollama => write!(f, "ollama"),
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Ollama model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_http_timeout(),
        }
    }
}

impl ModelConfig {
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            ollama_url: self.ollama_url.clone(),
            model_name: self.name.clone(),
            temperature: self.temperature,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_http_timeout() -> u64 {
    240
}

/// How inconclusive criteria are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Hold the candidate when any criterion is inconclusive
    #[default]
    FailFast,
    /// Replace inconclusive scores with the default score
    Substitute,
}

/// Decision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Composite score needed to invest.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default)]
    pub inconclusive_policy: PolicyKind,

    /// Score used for inconclusive criteria under `substitute`.
    #[serde(default = "default_score")]
    pub default_score: f64,

    /// Every criterion must reach this score to invest, when set.
    #[serde(default)]
    pub min_criterion_score: Option<f64>,

    #[serde(default)]
    pub weights: Weights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            inconclusive_policy: PolicyKind::default(),
            default_score: default_score(),
            min_criterion_score: None,
            weights: Weights::default(),
        }
    }
}

impl ScoringConfig {
    pub fn policy(&self) -> InconclusivePolicy {
        match self.inconclusive_policy {
            PolicyKind::FailFast => InconclusivePolicy::FailFast,
            PolicyKind::Substitute => InconclusivePolicy::Substitute {
                default_score: self.default_score,
            },
        }
    }

    /// Validate the scoring settings and build the judge.
    pub fn build_judge(&self) -> Result<Judge, ConfigError> {
        Judge::new(self.weights, self.threshold, self.policy())?
            .with_floor(self.min_criterion_score)
    }
}

fn default_threshold() -> f64 {
    70.0
}

fn default_score() -> f64 {
    50.0
}

/// Evaluator fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Time each evaluator gets before it is reported inconclusive.
    #[serde(default = "default_evaluator_timeout")]
    pub evaluator_timeout_seconds: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            evaluator_timeout_seconds: default_evaluator_timeout(),
        }
    }
}

impl EvaluationConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        if self.evaluator_timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Duration::from_secs(self.evaluator_timeout_seconds))
    }
}

fn default_evaluator_timeout() -> u64 {
    300
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.edscout.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }

        if let Some(threshold) = args.threshold {
            self.scoring.threshold = threshold;
        }
        if let Some(policy) = args.inconclusive_policy {
            self.scoring.inconclusive_policy = policy;
        }
        if let Some(score) = args.default_score {
            self.scoring.default_score = score;
        }
        if let Some(floor) = args.min_criterion_score {
            self.scoring.min_criterion_score = Some(floor);
        }

        if let Some(timeout) = args.timeout {
            self.evaluation.evaluator_timeout_seconds = timeout;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
    }

    /// Check every setting that can be checked without running anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.build_judge()?;
        self.evaluation.timeout()?;
        if self.model.provider == Provider::Ollama && self.model.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap_or_else(|_| String::new());
        content.replacen(
            "[scoring]\n",
            "[scoring]\n# Require every criterion to reach this score before investing.\n# min_criterion_score = 50\n",
            1,
        )
    }
}
