//! Command-line entry point for QA trend analysis.

use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use qatrend_common::{end_of_day, init_logging, start_of_day};
use qatrend_config::{Config, ConfigLoader, TrendConfigOverride};
use qatrend_engine::{AnalysisKind, JsonFileSource, QaPlatformClient, RecordSource, TrendEngine};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "qatrend", version)]
#[command(about = "Trend, seasonality, anomaly and forecast analysis of QA platform metrics")]
struct Cli {
    /// Configuration file (default: $QATREND_CONFIG_PATH, then ./qatrend.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze one metric, or all of them, over a date range
    Analyze(AnalyzeArgs),
    /// Check that the QA platform API is reachable
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Quality,
    #[value(name = "error_rate")]
    ErrorRate,
    Efficiency,
    Engagement,
    All,
}

impl KindArg {
    /// The single kind selected, or `None` for all of them
    fn kind(self) -> Option<AnalysisKind> {
        match self {
            KindArg::Quality => Some(AnalysisKind::Quality),
            KindArg::ErrorRate => Some(AnalysisKind::ErrorRate),
            KindArg::Efficiency => Some(AnalysisKind::Efficiency),
            KindArg::Engagement => Some(AnalysisKind::Engagement),
            KindArg::All => None,
        }
    }
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Metric to analyze
    #[arg(long, value_enum)]
    kind: KindArg,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Read records from a JSON file instead of the QA platform API
    #[arg(long)]
    records: Option<PathBuf>,

    /// Moving-average window in days
    #[arg(long)]
    window: Option<usize>,

    /// Z-score above which a point is an anomaly
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of days to forecast
    #[arg(long)]
    horizon: Option<usize>,

    /// Skip weekly/monthly seasonality detection
    #[arg(long)]
    no_seasonality: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl AnalyzeArgs {
    fn overrides(&self) -> TrendConfigOverride {
        TrendConfigOverride {
            smoothing_window: self.window,
            anomaly_threshold: self.threshold,
            forecast_periods: self.horizon,
            seasonality_detection: self.no_seasonality.then_some(false),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let mut logging = config.logging.to_logging_config();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    init_logging(logging).context("Failed to initialize logging")?;

    match cli.command {
        Command::Analyze(args) => {
            let output = run_analysis(&config, &args).await?;
            let rendered = if args.pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{rendered}");
            Ok(())
        }
        Command::Health => check_health(&config).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ConfigLoader::load().context("Failed to load configuration"),
    }
}

fn record_source(config: &Config, records: Option<&Path>) -> Result<Arc<dyn RecordSource>> {
    match records {
        Some(path) => {
            info!("Reading records from {}", path.display());
            Ok(Arc::new(JsonFileSource::new(path)))
        }
        None => {
            info!("Fetching records from {}", config.source.base_url);
            let client = QaPlatformClient::new(config.source.clone())
                .context("Failed to create QA platform client")?;
            Ok(Arc::new(client))
        }
    }
}

/// Run the requested analyses and shape them for output.
///
/// A single kind yields its analysis object; `all` yields an object keyed by
/// kind name.
async fn run_analysis(config: &Config, args: &AnalyzeArgs) -> Result<Value> {
    ensure!(
        args.start <= args.end,
        "--start {} is after --end {}",
        args.start,
        args.end
    );

    let engine = TrendEngine::from_config(config, record_source(config, args.records.as_deref())?);
    let overrides = args.overrides();
    let overrides = (!overrides.is_empty()).then_some(&overrides);
    let (start, end) = (start_of_day(args.start), end_of_day(args.end));

    let output = match args.kind.kind() {
        Some(kind) => serde_json::to_value(engine.analyze(kind, start, end, overrides).await?)?,
        None => {
            let mut by_kind = Map::new();
            for (kind, analysis) in engine
                .analyze_many(&AnalysisKind::ALL, start, end, overrides)
                .await?
            {
                by_kind.insert(kind.to_string(), serde_json::to_value(analysis)?);
            }
            Value::Object(by_kind)
        }
    };

    Ok(output)
}

async fn check_health(config: &Config) -> Result<()> {
    let client = QaPlatformClient::new(config.source.clone())
        .context("Failed to create QA platform client")?;

    if client.health_check().await {
        println!("ok");
        Ok(())
    } else {
        error!("Health check against {} failed", config.source.base_url);
        bail!("QA platform API at {} is unreachable", config.source.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    fn analyze_args(cli: Cli) -> AnalyzeArgs {
        match cli.command {
            Command::Analyze(args) => args,
            Command::Health => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = parse(&[
            "qatrend", "analyze", "--kind", "error_rate", "--start", "2024-01-01", "--end",
            "2024-01-31", "--window", "3", "--no-seasonality", "-v",
        ]);
        assert!(cli.verbose);

        let args = analyze_args(cli);
        assert_eq!(args.kind, KindArg::ErrorRate);
        assert_eq!(args.kind.kind(), Some(AnalysisKind::ErrorRate));
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(args.records.is_none());

        let overrides = args.overrides();
        assert_eq!(overrides.smoothing_window, Some(3));
        assert_eq!(overrides.seasonality_detection, Some(false));
        assert_eq!(overrides.anomaly_threshold, None);
    }

    #[test]
    fn test_no_flags_means_no_overrides() {
        let args = analyze_args(parse(&[
            "qatrend", "analyze", "--kind", "all", "--start", "2024-01-01", "--end", "2024-01-31",
        ]));
        assert_eq!(args.kind.kind(), None);
        assert!(args.overrides().is_empty());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from([
            "qatrend", "analyze", "--kind", "latency", "--start", "2024-01-01", "--end", "2024-01-31",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "qatrend", "analyze", "--kind", "quality", "--start", "01/01/2024", "--end", "2024-01-31",
        ])
        .is_err());
    }

    #[tokio::test]
    async fn test_reversed_range_fails_before_fetch() {
        let args = analyze_args(parse(&[
            "qatrend", "analyze", "--kind", "quality", "--start", "2024-02-01", "--end", "2024-01-01",
        ]));

        // no credentials configured, so reaching the client would fail differently
        let err = run_analysis(&Config::default(), &args).await.unwrap_err();
        assert!(err.to_string().contains("is after"));
    }

    #[tokio::test]
    async fn test_all_kinds_from_records_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(
            br#"[
                {"timestamp": "2024-01-01T09:00:00Z", "overall_score": 70, "user_id": "a"},
                {"timestamp": "2024-01-02T09:00:00Z", "overall_score": 75, "user_id": "b"},
                {"timestamp": "2024-01-03T09:00:00Z", "overall_score": 80, "user_id": "a"}
            ]"#,
        )
        .expect("Failed to write records");

        let path = file.path().to_string_lossy().into_owned();
        let args = analyze_args(parse(&[
            "qatrend", "analyze", "--kind", "all", "--start", "2024-01-01", "--end", "2024-01-03",
            "--records", &path, "--horizon", "2", "--window", "1",
        ]));

        let output = run_analysis(&Config::default(), &args).await.unwrap();
        let by_kind = output.as_object().expect("object keyed by kind");

        assert_eq!(by_kind.len(), 4);
        assert_eq!(by_kind["quality"]["trend"], "increasing");
        assert_eq!(by_kind["quality"]["forecast"].as_array().unwrap().len(), 2);
        assert!(by_kind.contains_key("error_rate"));
    }

    #[tokio::test]
    async fn test_health_requires_credentials() {
        assert!(check_health(&Config::default()).await.is_err());
    }
}
