//! edscout - LLM-assisted investment screening for AI education startups
//!
//! Screens a pool of candidate startups, scores the eligible ones on six
//! weighted criteria and recommends the first that clears the threshold.
//!
//! Exit codes:
//!   0 - Success (an investment was recommended, or the pool was exhausted
//!       without --fail-on-exhausted)
//!   1 - Runtime error (config, candidates file, back-end setup, etc.)
//!   2 - Pool exhausted without an investment and --fail-on-exhausted set

mod agent;
mod analysis;
mod cli;
mod config;
mod error;
mod evaluator;
mod models;
mod pool;
mod report;
mod selector;
mod supply;
mod workflow;

use agent::{ChatBackend, LlmEvaluator, LlmScreen, OllamaClient};
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, Provider};
use evaluator::{Evaluator, EvaluatorSet, RecordedEvaluator};
use indicatif::{ProgressBar, ProgressStyle};
use pool::{CandidatePool, SharedPool};
use report::ReportMetadata;
use selector::{EligibilityScreen, RecordedScreen, Selector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use supply::JsonFileSupply;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use workflow::{Controller, WorkflowOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("edscout v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Screening failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .edscout.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize weights, threshold, back-end and more.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` wins over the verbosity flags.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref config_path) => Config::load(config_path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(args);
    Ok(config)
}

/// Run the complete screening workflow. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Fail on bad settings before touching any candidate
    config.validate().context("Invalid configuration")?;
    let judge = config.scoring.build_judge()?;
    let evaluator_timeout = config.evaluation.timeout()?;

    // Step 1: Build the pool
    let candidates_path = args
        .candidates
        .as_deref()
        .context("--candidates is required")?;
    if !args.quiet {
        println!("📥 Loading candidates: {}", candidates_path.display());
    }
    let pool = supply::build_pool(&JsonFileSupply::new(candidates_path))?;

    if args.dry_run {
        return handle_dry_run(&pool);
    }

    // Step 2: Pick the back-end
    let (screen, evaluators) = build_backend(&config)?;
    let evaluator_set = EvaluatorSet::new(evaluators, evaluator_timeout)?;

    if !args.quiet {
        println!("🤖 Back-end: {}", config.model.provider);
        if config.model.provider == Provider::Ollama {
            println!("   Model: {}", config.model.name);
            println!("   Ollama: {}", config.model.ollama_url);
        }
        println!(
            "   Threshold: {:.1} | Inconclusive policy: {:?} | Evaluator timeout: {}s",
            judge.threshold(),
            judge.policy(),
            evaluator_set.timeout().as_secs()
        );
        println!("\n🔬 Screening {} candidates...\n", pool.len());
    }

    debug!("Scoring weights: {:?}", judge.weights());

    // Step 3: Run the workflow
    let mut controller = Controller::new(
        SharedPool::new(pool),
        Selector::new(screen),
        evaluator_set,
        judge,
    );
    if !args.quiet {
        controller = controller.with_progress(spinner());
    }

    let outcome = controller.run().await?;
    debug!("Workflow took {} transitions", controller.transitions().len());

    // Step 4: Write the report
    let metadata = ReportMetadata {
        provider: config.model.provider.to_string(),
        model: (config.model.provider == Provider::Ollama).then(|| config.model.name.clone()),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let output = PathBuf::from(&config.general.output);
    report::write_report(&outcome, &metadata, &output, config.report.format)?;

    if !args.quiet {
        print_summary(&outcome, metadata.duration_seconds);
        println!("\n✅ Report saved to: {}", output.display());
    }

    if !outcome.is_invested() && args.fail_on_exhausted {
        eprintln!("\n⛔ Pool exhausted without an investment. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Screen and evaluators for the configured provider.
fn build_backend(
    config: &Config,
) -> Result<(Arc<dyn EligibilityScreen>, Vec<Arc<dyn Evaluator>>)> {
    match config.model.provider {
        Provider::Recorded => Ok((
            Arc::new(RecordedScreen::new()),
            RecordedEvaluator::full_set(),
        )),
        Provider::Ollama => {
            let client = OllamaClient::new(config.model.ollama_config())?;
            info!("Using Ollama model {}", client.model_name());
            let backend: Arc<dyn ChatBackend> = Arc::new(client);
            Ok((
                Arc::new(LlmScreen::new(Arc::clone(&backend))),
                LlmEvaluator::full_set(backend),
            ))
        }
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Handle --dry-run: list the pool, exit.
fn handle_dry_run(pool: &CandidatePool) -> Result<i32> {
    println!("\n🔍 Dry run: candidate pool (no evaluation)...\n");

    if pool.is_empty() {
        println!("   No candidates found.");
    } else {
        println!("   {} candidates would be screened in this order:\n", pool.len());
        for record in pool.records() {
            let recorded = record
                .profile
                .attributes
                .keys()
                .filter(|k| k.starts_with("score."))
                .count();
            match record.url {
                Some(ref url) => println!(
                    "     🏢 {} [{}] {} ({} recorded scores)",
                    record.name, record.id, url, recorded
                ),
                None => println!(
                    "     🏢 {} [{}] ({} recorded scores)",
                    record.name, record.id, recorded
                ),
            }
        }
    }

    if let Some(first) = pool.next_untried() {
        println!("\n   First to screen: {}", first.name);
    }

    println!("\n✅ Dry run complete. No candidates were evaluated.");
    Ok(0)
}

fn print_summary(outcome: &WorkflowOutcome, duration: f64) {
    println!("\n📊 Screening Summary:");
    match outcome {
        WorkflowOutcome::Invested(report) => {
            println!(
                "   Decision: 💰 Invest in {} (composite {:.2}, threshold {:.2})",
                report.candidate.name, report.decision.composite, report.decision.threshold
            );
            println!("   Passed over: {}", report.passed_over.len());
        }
        WorkflowOutcome::Exhausted(report) => {
            warn!("No candidate met the investment bar");
            println!("   Decision: ⏸️  No investment, pool exhausted");
            println!(
                "   Held: {} | Excluded: {}",
                report.count_with_status(models::CandidateStatus::Held),
                report.count_with_status(models::CandidateStatus::Excluded)
            );
        }
    }
    println!("   Selection rounds: {}", outcome.iterations());
    println!("   Duration: {:.1}s", duration);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/startups.json")
    }

    #[tokio::test]
    async fn test_recorded_run_invests_in_first_strong_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let fixture = fixture();
        let args = Args::parse_from([
            "edscout",
            "--candidates",
            fixture.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--format",
            "json",
            "--quiet",
        ]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(run(args, config).await.unwrap(), 0);

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(report["outcome"], "invested");
        assert_eq!(report["report"]["candidate"]["name"], "Mathpresso");
        assert_eq!(report["report"]["decision"]["composite"], 75.25);
        assert_eq!(report["report"]["iterations"], 2);
        assert_eq!(report["report"]["passed_over"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_run_fails_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.md");
        let fixture = fixture();
        let base = [
            "edscout",
            "--candidates",
            fixture.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--threshold",
            "99",
            "--quiet",
        ];

        let args = Args::parse_from(base);
        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(run(args, config).await.unwrap(), 0);
        let markdown = std::fs::read_to_string(&output).unwrap();
        assert!(markdown.contains("# Screening Report: No Investment"));
        assert!(markdown.contains("Bootstrap Tutors"));

        let args = Args::parse_from(base.iter().copied().chain(["--fail-on-exhausted"]));
        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(run(args, config).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_scoring_config_fails_before_screening() {
        let fixture = fixture();
        let args = Args::parse_from([
            "edscout",
            "--candidates",
            fixture.to_str().unwrap(),
            "--threshold",
            "150",
            "--quiet",
        ]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        let err = run(args, config).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Decision threshold"));
    }
}
