//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Every setting that also lives in the config file
//! is optional here so the file value survives unless a flag is given.

use crate::config::{PolicyKind, Provider, ReportFormat};
use clap::Parser;
use std::path::PathBuf;

/// edscout - LLM-assisted investment screening for AI education startups
///
/// Screens a pool of candidate startups against the eligibility gate,
/// scores eligible ones on six criteria and stops at the first one whose
/// composite score clears the threshold.
///
/// Examples:
///   edscout --candidates startups.json
///   edscout --candidates startups.json --provider ollama --model llama3.2:latest
///   edscout --candidates startups.json --inconclusive-policy substitute --format json
///   edscout --candidates startups.json --dry-run
///   edscout --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file with the candidate pool
    ///
    /// Either an array of candidates or an object with a `candidates` array.
    #[arg(long, value_name = "FILE", required_unless_present = "init_config")]
    pub candidates: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .edscout.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Back-end that screens and scores candidates
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Ollama model to use
    ///
    /// Can also be set via EDSCOUT_MODEL env var or .edscout.toml config.
    #[arg(short, long, env = "EDSCOUT_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Composite score (0-100) needed to invest
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Per-evaluator timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// What to do when a criterion is inconclusive
    #[arg(long, value_name = "POLICY")]
    pub inconclusive_policy: Option<PolicyKind>,

    /// Score used for inconclusive criteria with the substitute policy
    #[arg(long, value_name = "SCORE")]
    pub default_score: Option<f64>,

    /// Require every criterion to reach this score before investing
    #[arg(long, value_name = "SCORE")]
    pub min_criterion_score: Option<f64>,

    /// Dry run: load and list the candidate pool without evaluating
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with code 2 when the pool is exhausted without an investment
    #[arg(long)]
    pub fail_on_exhausted: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .edscout.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref path) = self.candidates {
            if !path.is_file() {
                return Err(format!("Candidates file does not exist: {}", path.display()));
            }
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            candidates: None,
            config: None,
            output: None,
            format: None,
            provider: None,
            model: None,
            ollama_url: None,
            temperature: None,
            threshold: None,
            timeout: None,
            inconclusive_policy: None,
            default_score: None,
            min_criterion_score: None,
            dry_run: false,
            fail_on_exhausted: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_candidates_required_unless_init_config() {
        assert!(Args::try_parse_from(["edscout"]).is_err());
        assert!(Args::try_parse_from(["edscout", "--init-config"]).is_ok());
    }

    #[test]
    fn test_parses_value_enums() {
        let args = Args::try_parse_from([
            "edscout",
            "--candidates",
            "c.json",
            "--provider",
            "ollama",
            "--inconclusive-policy",
            "fail-fast",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.provider, Some(Provider::Ollama));
        assert_eq!(args.inconclusive_policy, Some(PolicyKind::FailFast));
        assert_eq!(args.format, Some(ReportFormat::Json));

        assert!(Args::try_parse_from([
            "edscout",
            "--candidates",
            "c.json",
            "--inconclusive-policy",
            "maybe"
        ])
        .is_err());
    }

    #[test]
    fn test_validation_missing_candidates_file() {
        let mut args = make_args();
        args.candidates = Some(PathBuf::from("/nonexistent/candidates.json"));
        assert!(args.validate().is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        args.candidates = Some(file.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_ollama_url() {
        let mut args = make_args();
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
