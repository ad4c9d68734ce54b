//! Optimizer CLI - analyze tickers and split an investment across them.
//!
//! Prints text tables by default, or `ApiResponse` JSON with `--json`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use optimizer_core::{
    allocate_with, analyze_portfolio, parse_tickers, Allocation, ApiResponse, Config, Horizon,
    MissingMetricPolicy, PortfolioAnalysis, PortfolioTable, HORIZONS,
};
use serde_json::json;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "optimizer")]
#[command(about = "Portfolio optimizer - Sharpe-weighted allocation with a volatility cap")]
#[command(version)]
struct Cli {
    /// Emit JSON instead of text tables
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.portfolio-optimizer/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Without a subcommand, prompt for tickers and investment and run both steps
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show return, volatility and Sharpe per ticker and horizon
    Analyze {
        /// Tickers (comma-separated); prompted for when omitted
        #[arg(short, long)]
        tickers: Option<String>,
        /// Horizons to analyze (comma-separated, e.g. 6m,1y)
        #[arg(long)]
        horizons: Option<String>,
    },
    /// Allocate an investment across tickers
    Allocate {
        /// Tickers (comma-separated); prompted for when omitted
        #[arg(short, long, conflicts_with = "metrics_file")]
        tickers: Option<String>,
        /// Total amount to invest; prompted for when omitted
        #[arg(short, long)]
        investment: Option<f64>,
        /// Horizon whose metrics drive the weights
        #[arg(long)]
        horizon: Option<String>,
        /// Volatility multiple of the average that triggers the cap
        #[arg(long)]
        cap_factor: Option<f64>,
        /// Missing-metric policy: drop, neutral or reject
        #[arg(long)]
        missing: Option<MissingMetricPolicy>,
        /// Read a JSON metrics table instead of downloading prices
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> ExitCode {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if json {
                let response = ApiResponse::<()>::err(format!("{:#}", e));
                match serde_json::to_string_pretty(&response) {
                    Ok(body) => println!("{}", body),
                    Err(_) => eprintln!("error: {:#}", e),
                }
            } else {
                eprintln!("error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from_path(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    match cli.command {
        Some(Commands::Analyze { tickers, horizons }) => {
            handle_analyze(&config, tickers, horizons, cli.json)
        }
        Some(Commands::Allocate {
            tickers,
            investment,
            horizon,
            cap_factor,
            missing,
            metrics_file,
        }) => {
            let config = apply_overrides(config, horizon, cap_factor, missing)?;
            handle_allocate(&config, tickers, investment, metrics_file, cli.json)
        }
        Some(Commands::Config { init }) => handle_config(&config, &config_path, init, cli.json),
        None => handle_report(&config, cli.json),
    }
}

/// Layer `allocate` flags over the loaded config and re-check it.
fn apply_overrides(
    mut config: Config,
    horizon: Option<String>,
    cap_factor: Option<f64>,
    missing: Option<MissingMetricPolicy>,
) -> Result<Config> {
    if let Some(horizon) = horizon {
        config.horizon = horizon;
    }
    if let Some(factor) = cap_factor {
        config.volatility_cap_factor = factor;
    }
    if let Some(policy) = missing {
        config.missing_metrics = policy;
    }
    config.validate()?;
    Ok(config)
}

fn handle_analyze(
    config: &Config,
    tickers: Option<String>,
    horizons: Option<String>,
    json: bool,
) -> Result<String> {
    let tickers = tickers_or_prompt(tickers)?;
    let horizons = match horizons {
        Some(labels) => parse_horizons(&labels)?,
        None => HORIZONS.to_vec(),
    };

    let source = config.price_source()?;
    let analysis = analyze_portfolio(&source, &tickers, &horizons, config.risk_free_rate);

    if json {
        return to_json(&analysis);
    }
    Ok(format!(
        "===== Portfolio Analysis =====\n\n{}",
        format_analysis(&analysis)
    ))
}

fn handle_allocate(
    config: &Config,
    tickers: Option<String>,
    investment: Option<f64>,
    metrics_file: Option<PathBuf>,
    json: bool,
) -> Result<String> {
    let horizon = config.horizon()?;

    let table: PortfolioTable = match metrics_file {
        Some(path) => load_metrics_table(&path)?,
        None => {
            let tickers = tickers_or_prompt(tickers)?;
            let source = config.price_source()?;
            analyze_portfolio(&source, &tickers, &[horizon], config.risk_free_rate)
                .metrics_table(horizon.label)?
        }
    };

    let investment = match investment {
        Some(amount) => amount,
        None => parse_investment(&prompt("Enter investment amount: ")?)?,
    };

    let allocation = allocate_with(&table, investment, &config.allocation())?;

    if json {
        return to_json(&allocation);
    }
    Ok(format!(
        "===== Optimized Allocation ({} Sharpe, missing metrics: {}) =====\n\n{}",
        horizon.label,
        config.missing_metrics,
        format_allocation(&allocation)
    ))
}

fn load_metrics_table(path: &Path) -> Result<PortfolioTable> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing metrics table {}", path.display()))
}

fn handle_config(config: &Config, path: &Path, init: bool, json: bool) -> Result<String> {
    if init {
        if path.exists() {
            bail!("config file already exists: {}", path.display());
        }
        Config::default().save_to_path(path)?;
        tracing::info!(path = %path.display(), "Wrote default config");
    }

    if json {
        return to_json(&json!({
            "path": path,
            "exists": path.exists(),
            "config": config,
        }));
    }

    let body = toml::to_string_pretty(config)?;
    Ok(format!("# {}\n{}", path.display(), body))
}

fn handle_report(config: &Config, json: bool) -> Result<String> {
    let tickers = tickers_or_prompt(None)?;
    let investment = parse_investment(&prompt("Enter investment amount: ")?)?;
    let horizon = config.horizon()?;

    let source = config.price_source()?;
    let analysis = analyze_portfolio(&source, &tickers, &HORIZONS, config.risk_free_rate);
    let table = analysis.metrics_table(horizon.label)?;
    let allocation = allocate_with(&table, investment, &config.allocation())?;

    if json {
        return to_json(&json!({
            "analysis": analysis,
            "allocation": allocation,
        }));
    }

    Ok(format!(
        "\n===== Portfolio Analysis =====\n\n{}\n===== Optimized Allocation ({} Sharpe, missing metrics: {}) =====\n\n{}",
        format_analysis(&analysis),
        horizon.label,
        config.missing_metrics,
        format_allocation(&allocation)
    ))
}

fn tickers_or_prompt(tickers: Option<String>) -> Result<Vec<String>> {
    let raw = match tickers {
        Some(t) => t,
        None => prompt("Enter portfolio stock tickers separated by commas: ")?,
    };

    let tickers = parse_tickers(&raw);
    if tickers.is_empty() {
        bail!("no tickers given");
    }
    Ok(tickers)
}

fn parse_horizons(labels: &str) -> Result<Vec<Horizon>> {
    labels
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| Horizon::from_label(l).with_context(|| format!("unknown horizon: {}", l)))
        .collect()
}

fn parse_investment(input: &str) -> Result<f64> {
    let cleaned = input.trim().trim_start_matches('$').replace(',', "");
    cleaned
        .parse::<f64>()
        .with_context(|| format!("invalid investment amount: {}", input.trim()))
}

fn prompt(message: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", message)?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn to_json<T: serde::Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ApiResponse::ok(data))?)
}

fn cell(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn format_analysis(analysis: &PortfolioAnalysis) -> String {
    let mut out = format!("{:<8}", "Ticker");
    for label in analysis.horizon_labels() {
        out.push_str(&format!(
            "{:>12}{:>16}{:>12}",
            format!("Return {}", label),
            format!("Volatility {}", label),
            format!("Sharpe {}", label)
        ));
    }
    out.push('\n');

    for ticker in &analysis.tickers {
        out.push_str(&format!("{:<8}", ticker.ticker));
        for h in &ticker.horizons {
            out.push_str(&format!(
                "{:>12}{:>16}{:>12}",
                cell(h.total_return),
                cell(h.volatility),
                cell(h.sharpe)
            ));
        }
        out.push('\n');
    }

    out
}

fn format_allocation(allocation: &Allocation) -> String {
    let mut out = format!(
        "{:<8}{:>10}{:>12}{:>10}{:>16}\n",
        "Ticker", "Sharpe", "Volatility", "Weight", "Allocation ($)"
    );

    for row in &allocation.rows {
        out.push_str(&format!(
            "{:<8}{:>10.4}{:>12.4}{:>10.4}{:>16.2}\n",
            row.ticker, row.sharpe, row.volatility, row.weight, row.allocation_amount
        ));
    }

    if !allocation.excluded.is_empty() {
        out.push_str(&format!(
            "\nExcluded (missing metrics): {}\n",
            allocation.excluded.join(", ")
        ));
    }

    out
}
