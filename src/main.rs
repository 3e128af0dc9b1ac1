//! CallCoach - LLM-powered sales call coaching
//!
//! A CLI tool that turns raw call notes into a structured coaching
//! analysis and rolls recent analyses into team trend signals.
//!
//! Exit codes:
//!   0 - Success (including trends with insufficient data)
//!   1 - Runtime error (short input, provider failure, malformed output, config, store)

use anyhow::{bail, Context, Result};
use callcoach::cli::{Args, Mode, OutputFormat};
use callcoach::config::{Config, DEFAULT_CONFIG_FILE};
use callcoach::extraction::Extractor;
use callcoach::models::{AnalysisReport, ObjectionCount, TeamTrendsReport};
use callcoach::provider::build_provider;
use callcoach::report;
use callcoach::store::{CallWindowReader, JsonFileStore};
use callcoach::trends::{compute_trends, objection_distribution, TrendConfig};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Title given to calls created from the command line.
const NEW_CALL_TITLE: &str = "Untitled Call";

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
    if args.mode() == Mode::InitConfig {
        return handle_init_config();
    }

    init_logging(&args);

    info!("CallCoach v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match args.mode() {
        Mode::Trends => run_trends(&args),
        _ => run_analyze(&args).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .callcoach.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize the provider, model, store, and trend thresholds.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` directives are applied on top of the `--verbose`/`--quiet` level.
fn init_logging(args: &Args) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let filter = args.log_filter(&directives);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
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
    let mut config = if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => {
                info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
                config
            }
            Ok(None) => {
                debug!("No config file found, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!("Failed to load config: {:#}", e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// Read notes from a file, or from stdin for "-".
fn read_notes(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        debug!("Reading call notes from stdin");
        return std::io::read_to_string(std::io::stdin())
            .context("Failed to read notes from stdin");
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read notes file: {}", path.display()))
}

/// Spinner shown while the model call is pending.
fn start_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Write the rendered report to --output, or stdout when omitted.
fn write_output(output: Option<&PathBuf>, content: &str, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!("\n✅ Report saved to: {}", path.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .context("Failed to write report to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

/// Analyze one call's notes and render the result.
async fn run_analyze(args: &Args) -> Result<()> {
    let config = load_config(args)?;

    // The store is only touched when a call id is given
    let mut store = match args.call {
        Some(_) => Some(JsonFileStore::open(Path::new(&config.general.store))?),
        None => None,
    };

    let (raw_text, notes_from_file) = match (&args.notes, &args.call, &store) {
        (Some(path), _, _) => (read_notes(path)?, true),
        (None, Some(call_id), Some(store)) => {
            let call = store
                .call(call_id)
                .with_context(|| format!("Call not found in store: {}", call_id))?;
            match call.note {
                Some(ref note) => (note.raw_text.clone(), false),
                None => bail!("Call {} has no notes to analyze", call_id),
            }
        }
        _ => bail!("No call notes to analyze"),
    };

    if let (Some(call_id), Some(store)) = (&args.call, store.as_mut()) {
        if store.call(call_id).is_none() {
            store.create_call(call_id, NEW_CALL_TITLE, args.rep.as_deref(), Utc::now())?;
        } else if args.rep.is_some() {
            store.assign_representative(call_id, args.rep.as_deref())?;
        }
    }

    let representative = args.rep.clone().or_else(|| {
        let call_id = args.call.as_deref()?;
        store.as_ref()?.call(call_id)?.representative.clone()
    });

    let provider = build_provider(&config.model)?;
    let model_used = provider.describe();
    let extractor = Extractor::new(provider);

    let spinner =
        (!args.quiet).then(|| start_spinner(format!("Analyzing call with {}", model_used)));
    let outcome = extractor.analyze(&raw_text, representative.as_deref()).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if let (Some(call_id), Some(store)) = (&args.call, store.as_mut()) {
        let now = Utc::now();
        match outcome {
            Ok(ref analysis) => {
                store.record_analysis(call_id, &raw_text, analysis, now)?;
            }
            // Keep what was typed even though analysis failed
            Err(_) if notes_from_file => {
                store.save_raw_text(call_id, &raw_text, now)?;
            }
            Err(_) => {}
        }
        store.save()?;
    }

    let analysis = outcome?;

    let report = AnalysisReport {
        call_id: args.call.clone(),
        representative,
        model_used,
        analysis_date: Utc::now(),
        analysis,
    };

    let content = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_analysis_markdown(&report),
    };

    write_output(args.output.as_ref(), &content, args.quiet)
}

/// Compute team trends over the store's most recent calls and render them.
fn run_trends(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let store = JsonFileStore::open(Path::new(&config.general.store))?;

    let trend_config = TrendConfig::from(&config.trends);
    let window = store.recent_window(trend_config.window_size)?;
    let snapshot = compute_trends(&window, &trend_config);

    if let Some(reason) = snapshot.insufficient_data_reason() {
        info!("Trends unavailable: {}", reason);
    }

    let report = TeamTrendsReport {
        generated_at: Utc::now(),
        calls_considered: window.len(),
        analyzed_calls: window.iter().filter(|c| c.is_analyzed()).count(),
        min_calls: trend_config.min_calls,
        trends: snapshot,
        objection_distribution: objection_distribution(&window)
            .into_iter()
            .map(|(category, count)| ObjectionCount { category, count })
            .collect(),
    };

    let content = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_trends_markdown(&report),
    };

    write_output(args.output.as_ref(), &content, args.quiet)
}
