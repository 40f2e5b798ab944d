//! MacroLens CLI: run the analytics engine over a dashboard bundle.
//!
//! Commands:
//! - `chart`: range-filtered traces for one or more series
//! - `signals`: latest signal per indicator and the net stance
//! - `lag`: optimal lead/lag between two series (or the full correlogram)
//! - `regimes`: regime spans and shading for one indicator
//!
//! Every command prints JSON to stdout. Logs go to stderr and are controlled
//! with `RUST_LOG` (e.g. `RUST_LOG=macrolens_core=debug`).

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use macrolens_core::domain::DATE_FORMAT;
use macrolens_core::lag::LagSearch;
use macrolens_core::{Dashboard, EngineConfig, IndicatorRegistry, Snapshot, ViewMode};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    name = "macrolens",
    about = "MacroLens CLI: macro-liquidity signal and regime analytics"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Path to the JSON data bundle.
    #[arg(long)]
    bundle: PathBuf,

    /// Engine config TOML (ranges, floor, lag search, ROC period).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Indicator registry overrides TOML.
    #[arg(long)]
    indicators: Option<PathBuf>,

    /// Reference date for range cutoffs (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    now: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Range-filtered chart traces.
    Chart {
        #[command(flatten)]
        inputs: Inputs,

        /// Series keys to plot (e.g., gli_total vix).
        #[arg(required = true)]
        keys: Vec<String>,

        /// Range code (1M, 3M, 6M, 1Y, 2Y, 3Y, 5Y, ALL). Defaults to the configured default.
        #[arg(long)]
        range: Option<String>,

        /// View mode: raw, roc, zscore.
        #[arg(long, default_value = "raw")]
        view: ViewMode,
    },
    /// Latest signals and net stance.
    Signals {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Lag at which LEAD best predicts TARGET.
    Lag {
        #[command(flatten)]
        inputs: Inputs,

        lead: String,
        target: String,

        /// View mode both series are compared in.
        #[arg(long, default_value = "roc")]
        view: ViewMode,

        /// Override the configured minimum lag.
        #[arg(long, allow_hyphen_values = true)]
        min_lag: Option<i64>,

        /// Override the configured maximum lag.
        #[arg(long, allow_hyphen_values = true)]
        max_lag: Option<i64>,

        /// Override the configured lag step.
        #[arg(long)]
        step: Option<usize>,

        /// Print every evaluated lag instead of only the best one.
        #[arg(long, default_value_t = false)]
        correlogram: bool,
    },
    /// Regime spans and shading rectangles for one indicator.
    Regimes {
        #[command(flatten)]
        inputs: Inputs,

        key: String,

        /// Range code. Defaults to the configured default.
        #[arg(long)]
        range: Option<String>,
    },
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Chart {
            inputs,
            keys,
            range,
            view,
        } => run_chart(&inputs, &keys, range, view),
        Commands::Signals { inputs } => run_signals(&inputs),
        Commands::Lag {
            inputs,
            lead,
            target,
            view,
            min_lag,
            max_lag,
            step,
            correlogram,
        } => run_lag(
            &inputs,
            &lead,
            &target,
            view,
            (min_lag, max_lag, step),
            correlogram,
        ),
        Commands::Regimes { inputs, key, range } => run_regimes(&inputs, &key, range),
    }
}

/// Everything a command needs: the engine, the decoded snapshot and "now".
struct Session {
    dashboard: Dashboard,
    snapshot: Snapshot,
    now: NaiveDate,
}

impl Session {
    fn load(inputs: &Inputs) -> Result<Self> {
        let config = match &inputs.config {
            Some(path) => EngineConfig::from_file(path)
                .with_context(|| format!("loading engine config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        let registry = match &inputs.indicators {
            Some(path) => IndicatorRegistry::from_file(path)
                .with_context(|| format!("loading indicator registry {}", path.display()))?,
            None => IndicatorRegistry::default_dashboard(),
        };
        let snapshot = load_snapshot(&inputs.bundle, &registry)?;
        let now = match inputs.now.as_deref() {
            Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .with_context(|| format!("invalid --now date '{s}'"))?,
            None => chrono::Local::now().date_naive(),
        };

        tracing::info!(
            bundle = %inputs.bundle.display(),
            dates = snapshot.axis().len(),
            series = snapshot.keys().count(),
            %now,
            "session loaded"
        );
        Ok(Self {
            dashboard: Dashboard::new(config, registry),
            snapshot,
            now,
        })
    }

    fn range_or_default(&self, range: Option<String>) -> String {
        range.unwrap_or_else(|| self.dashboard.config().default_range.clone())
    }
}

fn load_snapshot(path: &Path, registry: &IndicatorRegistry) -> Result<Snapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading bundle {}", path.display()))?;
    Snapshot::from_json(&json, registry).with_context(|| format!("decoding bundle {}", path.display()))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_chart(inputs: &Inputs, keys: &[String], range: Option<String>, view: ViewMode) -> Result<()> {
    let mut session = Session::load(inputs)?;
    let range = session.range_or_default(range);
    let key_refs: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();

    let traces = session
        .dashboard
        .chart(&session.snapshot, &key_refs, &range, view, session.now)?;
    print_json(&json!({
        "range": range,
        "view": view,
        "traces": traces,
    }))
}

fn run_signals(inputs: &Inputs) -> Result<()> {
    let mut session = Session::load(inputs)?;
    let board = session.dashboard.signals(&session.snapshot);
    print_json(&serde_json::to_value(&board)?)
}

fn run_lag(
    inputs: &Inputs,
    lead: &str,
    target: &str,
    view: ViewMode,
    overrides: (Option<i64>, Option<i64>, Option<usize>),
    correlogram: bool,
) -> Result<()> {
    let mut session = Session::load(inputs)?;
    let defaults = session.dashboard.config().lag;
    let (min_lag, max_lag, step) = overrides;
    let search = LagSearch::new(
        min_lag.unwrap_or(defaults.min_lag),
        max_lag.unwrap_or(defaults.max_lag),
        step.unwrap_or(defaults.step),
    );
    if search.min_lag > search.max_lag {
        bail!(
            "--min-lag ({}) must not exceed --max-lag ({})",
            search.min_lag,
            search.max_lag
        );
    }

    if correlogram {
        let points = session
            .dashboard
            .correlogram(&session.snapshot, lead, target, view, Some(search))?;
        return print_json(&json!({
            "lead": lead,
            "target": target,
            "view": view,
            "search": search,
            "points": points,
        }));
    }

    let result = session
        .dashboard
        .optimal_lag(&session.snapshot, lead, target, view, Some(search))?;
    if result.is_no_data() {
        tracing::warn!(lead, target, "no lag had enough overlapping observations");
    }
    print_json(&json!({
        "lead": lead,
        "target": target,
        "view": view,
        "search": search,
        "result": result,
    }))
}

fn run_regimes(inputs: &Inputs, key: &str, range: Option<String>) -> Result<()> {
    let mut session = Session::load(inputs)?;
    let range = session.range_or_default(range);
    let view = session
        .dashboard
        .regimes(&session.snapshot, key, &range, session.now)?;
    print_json(&json!({
        "range": range,
        "regimes": view,
    }))
}
