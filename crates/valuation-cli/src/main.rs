//! valuation-cli: value a batch of company profiles from a JSON file.
//!
//! The input is a JSON array of `{ "symbol", "records", "assumptions" }`
//! objects. Results are printed to stdout as JSON; logs go to stderr.
//!
//! Usage:
//!   valuation-cli profiles.json
//!   valuation-cli profiles.json --report --pretty
//!   valuation-cli profiles.json --screen --max-jpegy 1.5 --recommendation BUY --limit 20
//!   valuation-cli profiles.json --suggest

mod config;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use valuation_core::{Assumptions, Recommendation};
use valuation_engine::screener::{screen, ScreenerFilters};
use valuation_engine::{DataQualityReport, HistoricalRanges, Profile, ValuationEngine, ValuationResult};

use config::CliConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Evaluate,
    Screen,
    Suggest,
}

#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    input: String,
    config_path: Option<String>,
    mode: Mode,
    report: bool,
    pretty: bool,
    filters: ScreenerFilters,
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_number<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    match flag_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{flag} expects a number, got '{raw}'")),
        None => Ok(None),
    }
}

impl CliArgs {
    /// `args` excludes the program name.
    fn parse(args: &[String]) -> Result<Self> {
        let Some(input) = args.first().filter(|a| !a.starts_with("--")) else {
            bail!("missing input file");
        };
        let has = |flag: &str| args.iter().any(|a| a == flag);

        let mode = match (has("--screen"), has("--suggest")) {
            (true, true) => bail!("--screen and --suggest are mutually exclusive"),
            (true, false) => Mode::Screen,
            (false, true) => Mode::Suggest,
            (false, false) => Mode::Evaluate,
        };

        let recommendation = flag_value(args, "--recommendation")
            .map(|r| r.parse::<Recommendation>())
            .transpose()?;

        Ok(Self {
            input: input.clone(),
            config_path: flag_value(args, "--config").map(str::to_string),
            mode,
            report: has("--report"),
            pretty: has("--pretty"),
            filters: ScreenerFilters {
                min_jpegy: parse_number(args, "--min-jpegy")?,
                max_jpegy: parse_number(args, "--max-jpegy")?,
                recommendation,
                min_ratio_3_1: parse_number(args, "--min-ratio")?,
                min_total_return: parse_number(args, "--min-return")?,
                limit: parse_number(args, "--limit")?,
            },
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  valuation-cli <profiles.json> [options]");
    eprintln!();
    eprintln!("Modes:");
    eprintln!("  (default)            Value every profile");
    eprintln!("  --screen             Value, filter and rank by JPEGY");
    eprintln!("  --suggest            Suggest assumptions from history");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config PATH        Guardrail config JSON (overrides GUARDRAIL_CONFIG)");
    eprintln!("  --report             Include data-quality report and historical ranges");
    eprintln!("  --min-jpegy N        Screen: minimum JPEGY");
    eprintln!("  --max-jpegy N        Screen: maximum JPEGY");
    eprintln!("  --recommendation R   Screen: BUY, HOLD or SELL");
    eprintln!("  --min-ratio N        Screen: minimum 3:1 ratio");
    eprintln!("  --min-return N       Screen: minimum total return (%)");
    eprintln!("  --limit N            Screen: maximum entries returned");
    eprintln!("  --pretty             Pretty-print JSON");
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    generated_at: DateTime<Utc>,
    data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileReport {
    symbol: String,
    valuation: ValuationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_quality: Option<DataQualityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    historical_ranges: Option<HistoricalRanges>,
}

#[derive(Serialize)]
struct Suggestion {
    symbol: String,
    assumptions: Assumptions,
}

fn init_tracing(json_logging: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "valuation_cli=info,valuation_engine=warn".into());
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn emit<T: Serialize>(data: T, pretty: bool) -> Result<()> {
    let envelope = Envelope {
        generated_at: Utc::now(),
        data,
    };
    let out = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{out}");
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let mut cli_config = CliConfig::from_env()?;
    init_tracing(cli_config.json_logging);

    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    let args = match CliArgs::parse(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e:#}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };
    if let Some(path) = &args.config_path {
        cli_config.guardrail_config = Some(path.into());
    }

    let engine = ValuationEngine::with_config(cli_config.load_guardrails()?)
        .context("invalid guardrail config")?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading profiles from {}", args.input))?;
    let profiles: Vec<Profile> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing profiles from {}", args.input))?;
    tracing::info!("Loaded {} profiles from {}", profiles.len(), args.input);

    match args.mode {
        Mode::Screen => emit(screen(&engine, &profiles, &args.filters), args.pretty),
        Mode::Suggest => {
            let suggestions: Vec<Suggestion> = profiles
                .iter()
                .map(|p| Suggestion {
                    symbol: p.symbol.clone(),
                    assumptions: engine.suggest_assumptions(
                        &p.records,
                        p.assumptions.current_price,
                        p.assumptions.current_dividend,
                    ),
                })
                .collect();
            emit(suggestions, args.pretty)
        }
        Mode::Evaluate => {
            let reports: Vec<ProfileReport> = profiles
                .iter()
                .map(|p| {
                    let valuation = engine.evaluate(&p.records, &p.assumptions);
                    if !valuation.is_usable() {
                        tracing::warn!(
                            "{}: {:?} ({})",
                            p.symbol,
                            valuation.status,
                            valuation.reasons().join("; ")
                        );
                    }
                    ProfileReport {
                        symbol: p.symbol.clone(),
                        data_quality: args
                            .report
                            .then(|| engine.data_quality_report(&p.records, p.assumptions.current_price)),
                        historical_ranges: args
                            .report
                            .then(|| engine.historical_ranges(&p.records, cli_config.history_window)),
                        valuation,
                    }
                })
                .collect();
            emit(reports, args.pretty)
        }
    }
}
