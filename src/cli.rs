//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ProviderKind;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// CallCoach - LLM-powered sales call coaching
///
/// Turn raw call notes into a structured coaching analysis, and roll
/// recent analyses into team-level trend signals.
///
/// Examples:
///   callcoach --notes call.txt --rep Jess
///   callcoach --call c-42 --store calls.json
///   callcoach --trends --store calls.json --format json
///   callcoach --notes - --provider gemini < call.txt
///   callcoach --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// File with raw call notes or a transcript ("-" reads stdin)
    #[arg(short, long, value_name = "FILE", conflicts_with = "trends")]
    pub notes: Option<PathBuf>,

    /// Call id in the store to analyze and update
    ///
    /// Without --notes, the call's stored raw text is analyzed.
    #[arg(long, value_name = "ID", conflicts_with = "trends")]
    pub call: Option<String>,

    /// Name of the representative who led the call
    ///
    /// Coaching feedback is addressed to this name.
    #[arg(short, long, value_name = "NAME")]
    pub rep: Option<String>,

    /// Compute team trends over the most recent calls in the store
    #[arg(short, long)]
    pub trends: bool,

    /// Path to the JSON call store
    #[arg(short, long, value_name = "FILE", env = "CALLCOACH_STORE")]
    pub store: Option<PathBuf>,

    /// Completion provider
    #[arg(long, value_name = "PROVIDER", env = "CALLCOACH_PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// Model to use for analysis
    #[arg(short, long, env = "CALLCOACH_MODEL")]
    pub model: Option<String>,

    /// Provider API base URL
    #[arg(long, value_name = "URL", env = "CALLCOACH_PROVIDER_URL")]
    pub provider_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of most recent calls considered for trends
    #[arg(long, value_name = "COUNT")]
    pub window: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .callcoach.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .callcoach.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// What the invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    InitConfig,
    Analyze,
    Trends,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The requested mode.
    pub fn mode(&self) -> Mode {
        if self.init_config {
            Mode::InitConfig
        } else if self.trends {
            Mode::Trends
        } else {
            Mode::Analyze
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.mode() == Mode::Analyze && self.notes.is_none() && self.call.is_none() {
            return Err(
                "Provide call notes with --notes, a stored call with --call, or use --trends"
                    .to_string(),
            );
        }

        if let Some(ref url) = self.provider_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Provider URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate temperature range
        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(window) = self.window {
            if window == 0 {
                return Err("Window must be at least 1 call".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate notes file if provided
        if let Some(ref notes) = self.notes {
            if notes.as_os_str() != "-" && !notes.is_file() {
                return Err(format!("Notes file does not exist: {}", notes.display()));
            }
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

    /// Log filter: the verbosity level plus any `RUST_LOG`-style directives.
    pub fn log_filter(&self, directives: &str) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.log_level()).into())
            .parse_lossy(directives)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            notes: None,
            call: Some("c-1".to_string()),
            rep: None,
            trends: false,
            store: None,
            provider: None,
            model: None,
            provider_url: None,
            temperature: None,
            timeout: None,
            window: None,
            format: None,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_mode_selection() {
        let mut args = make_args();
        assert_eq!(args.mode(), Mode::Analyze);

        args.trends = true;
        assert_eq!(args.mode(), Mode::Trends);

        args.init_config = true;
        assert_eq!(args.mode(), Mode::InitConfig);
    }

    #[test]
    fn test_validation_requires_input_for_analyze() {
        let mut args = make_args();
        args.call = None;
        assert!(args.validate().is_err());

        args.trends = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_provider_url() {
        let mut args = make_args();
        args.provider_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_notes_file() {
        let mut args = make_args();
        args.notes = Some(PathBuf::from("/definitely/not/here.txt"));
        assert!(args.validate().is_err());

        args.notes = Some(PathBuf::from("-"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.window = Some(0);
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

    #[test]
    fn test_log_filter_applies_directives_over_level() {
        let mut args = make_args();
        assert_eq!(args.log_filter("").max_level_hint(), Some(LevelFilter::INFO));

        args.quiet = true;
        assert_eq!(args.log_filter("").max_level_hint(), Some(LevelFilter::ERROR));
        assert_eq!(
            args.log_filter("callcoach=debug").max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }
}
