//! CLI command implementations for agrisensa.
//!
//! Provides subcommand handlers for:
//! - `agrisensa diagnose`: interactive symptom diagnosis
//! - `agrisensa trend <commodity>`: price history and forecast
//! - `agrisensa format <amount>`: Rupiah formatting
//! - `agrisensa health`: check config and backend reachability
//! - `agrisensa config show|init|set|reset`: configuration management
//!
//! In the interactive `diagnose` session, backend failures and bad input are
//! printed in red and the session goes on. `trend` is scriptable, so its
//! failures propagate to `main`: the message goes to stderr and the exit
//! code is non-zero.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::warn;

use crate::adapter::{DiagnosticFlow, FlowError, PredictionSummary, TrendFlow};
use crate::backend::{BackendClient, MarketBackend};
use crate::config::{self, AgrisensaConfig};
use crate::diagnostic::{Prompt, Step, humanize_key};
use crate::trend::{ChartSeries, DatasetKind, TrendDirection, format_axis_tick};
use crate::utils::currency::CurrencyFormat;

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// agrisensa diagnose
// ---------------------------------------------------------------------------

/// Walk the diagnostic tree interactively on stdin/stdout.
pub fn run_diagnose(cfg: &AgrisensaConfig) -> Result<()> {
    let backend = BackendClient::from_config(&cfg.backend);
    let mut flow = DiagnosticFlow::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    diagnose_session(&mut flow, &backend, &mut stdin.lock(), &mut stdout)
}

/// The diagnose loop over arbitrary input/output, so it can run against a
/// scripted session.
fn diagnose_session<R: BufRead, W: Write>(
    flow: &mut DiagnosticFlow,
    backend: &impl MarketBackend,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let mut prompt = match flow.start(backend) {
        Ok(prompt) => prompt,
        Err(e) => {
            report_error(out, &e)?;
            return Ok(());
        }
    };

    writeln!(out, "{}", "Diagnosis Penyakit Tanaman".bold().cyan())?;
    writeln!(out, "{}", "=".repeat(40))?;
    writeln!(out, "  {}", "Ketik nomor atau kunci pilihan, 'q' untuk keluar.".dimmed())?;

    loop {
        print_prompt(out, &prompt)?;
        let Some(answer) = read_answer(input, out, "> ")? else {
            return Ok(());
        };
        if answer.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        if answer.is_empty() {
            continue;
        }

        let key = resolve_answer(&answer, &prompt.options);
        match flow.choose(&key) {
            Ok(Step::Continue(next)) => prompt = next,
            Ok(Step::Terminal { diagnosis }) => {
                writeln!(out)?;
                writeln!(out, "{}", "Hasil Diagnosis".bold().green())?;
                writeln!(out, "  {diagnosis}")?;
                writeln!(out)?;

                let again = read_answer(input, out, "Diagnosis ulang? [y/N] ")?;
                if !matches!(again.as_deref(), Some("y" | "Y")) {
                    return Ok(());
                }
                match flow.restart() {
                    Ok(root) => prompt = root,
                    Err(e) => {
                        report_error(out, &e)?;
                        return Ok(());
                    }
                }
            }
            Err(e) => report_error(out, &e)?,
        }
    }
}

fn print_prompt<W: Write>(out: &mut W, prompt: &Prompt) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", prompt.question.bold())?;
    for (i, key) in prompt.options.iter().enumerate() {
        writeln!(out, "  {:>2}. {}", i + 1, humanize_key(key))?;
    }
    Ok(())
}

/// Read one trimmed line. `None` on end of input.
fn read_answer<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Map a typed answer to an option key: `1`-based numbers pick from the
/// displayed list, anything else is taken as the key itself.
fn resolve_answer(answer: &str, options: &[String]) -> String {
    if let Ok(n) = answer.parse::<usize>()
        && let Some(key) = n.checked_sub(1).and_then(|i| options.get(i))
    {
        return key.clone();
    }
    answer.to_string()
}

// ---------------------------------------------------------------------------
// agrisensa trend
// ---------------------------------------------------------------------------

/// JSON shape of `agrisensa trend --format json`.
#[derive(Serialize)]
struct TrendReport<'a> {
    commodity: &'a str,
    range: Option<u32>,
    chart: &'a ChartSeries,
    prediction: Option<&'a PredictionSummary>,
}

/// Fetch a forecast when `predict` is given, otherwise `range` days of
/// history.
fn load_trend<B: MarketBackend>(
    flow: &mut TrendFlow,
    backend: &B,
    commodity: &str,
    range: u32,
    predict: Option<&str>,
) -> Result<(), FlowError> {
    let result = match predict {
        Some(date) => flow.load_prediction(backend, commodity, date),
        None => flow.load_historical(backend, commodity, range),
    };
    if let Err(e) = &result {
        warn!(error = %e, commodity, "trend request failed");
    }
    result.map(|_| ())
}

/// Load price history (or a forecast when `predict` is given) and print it.
pub fn run_trend(
    cfg: &AgrisensaConfig,
    commodity: Option<&str>,
    range: Option<u32>,
    predict: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let backend = BackendClient::from_config(&cfg.backend);
    let mut flow = TrendFlow::new(&cfg.market, CurrencyFormat::from_config(&cfg.display));
    let commodity = commodity.unwrap_or(&cfg.market.default_commodity);
    let days = range.unwrap_or(cfg.market.default_range);

    load_trend(&mut flow, &backend, commodity, days, predict)
        .with_context(|| format!("trend request for '{commodity}' failed"))?;
    // Forecast output has no range heading.
    let range = predict.is_none().then_some(days);

    let Some(chart) = flow.chart() else {
        return Ok(());
    };
    let prediction = flow.prediction();

    match format {
        OutputFormat::Json => {
            let report = TrendReport {
                commodity,
                range,
                chart,
                prediction,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Csv => print!("{}", trend_csv(chart)),
        OutputFormat::Table => print_trend_table(commodity, range, chart, prediction, flow.currency()),
    }

    Ok(())
}

fn print_trend_table(
    commodity: &str,
    range: Option<u32>,
    chart: &ChartSeries,
    prediction: Option<&PredictionSummary>,
    currency: &CurrencyFormat,
) {
    let title = match range {
        Some(days) => format!("Harga {} - {} Hari Terakhir", humanize_key(commodity), days),
        None => format!("Prediksi Harga {}", humanize_key(commodity)),
    };
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(50));

    if chart.labels.is_empty() {
        println!("{}", "Tidak ada data harga untuk periode ini.".yellow());
        return;
    }

    println!("  {:<12} {:>18} {:>18}", "Tanggal", "Historis", "Prediksi");
    println!("  {}", "-".repeat(48));

    let historical = chart.dataset(DatasetKind::Historical);
    let forecast = chart.dataset(DatasetKind::Prediction);
    let cell = |value: Option<f64>| value.map(|v| currency.format(v)).unwrap_or_default();

    for (i, label) in chart.labels.iter().enumerate() {
        let h = historical.and_then(|d| d.data.get(i).copied().flatten());
        let p = forecast.and_then(|d| d.data.get(i).copied().flatten());
        let line = format!("  {:<12} {:>18} {:>18}", truncate(label, 12), cell(h), cell(p));
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }

    if let Some((low, high)) = value_bounds(chart) {
        println!();
        println!(
            "  {} {} – {}",
            "Rentang:".bold(),
            format_axis_tick(low),
            format_axis_tick(high)
        );
    }

    if let Some(summary) = prediction {
        println!();
        println!("{}", "Prediksi AI".bold().cyan());
        println!("  {} {}", "Tanggal:       ".bold(), summary.prediction_date);
        println!("  {} {}", "Harga saat ini:".bold(), summary.current_price_text);
        println!("  {} {}", "Harga prediksi:".bold(), summary.predicted_price_text);
        println!("  {} {}", "Tren:          ".bold(), colorize_badge(summary));
        if !summary.insight.is_empty() {
            println!();
            println!("  {}", summary.insight.dimmed());
        }
    }
}

/// `label,historical,prediction` rows; gaps are empty cells.
fn trend_csv(chart: &ChartSeries) -> String {
    let historical = chart.dataset(DatasetKind::Historical);
    let forecast = chart.dataset(DatasetKind::Prediction);
    let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    let mut out = String::from("label,historical,prediction\n");
    for (i, label) in chart.labels.iter().enumerate() {
        let h = historical.and_then(|d| d.data.get(i).copied().flatten());
        let p = forecast.and_then(|d| d.data.get(i).copied().flatten());
        out.push_str(&format!("{},{},{}\n", label, cell(h), cell(p)));
    }
    out
}

/// Lowest and highest plotted value across all datasets.
fn value_bounds(chart: &ChartSeries) -> Option<(f64, f64)> {
    chart
        .datasets
        .iter()
        .flat_map(|d| d.data.iter().flatten().copied())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn colorize_badge(summary: &PredictionSummary) -> colored::ColoredString {
    match summary.direction {
        TrendDirection::Up => summary.badge.green(),
        TrendDirection::Down => summary.badge.red(),
        TrendDirection::Stable => summary.badge.yellow(),
    }
}

// ---------------------------------------------------------------------------
// agrisensa format
// ---------------------------------------------------------------------------

pub fn run_format(cfg: &AgrisensaConfig, amount: f64) -> Result<()> {
    println!("{}", CurrencyFormat::from_config(&cfg.display).format(amount));
    Ok(())
}

// ---------------------------------------------------------------------------
// agrisensa health
// ---------------------------------------------------------------------------

/// Check config files and backend reachability.
pub fn run_health(cfg: &AgrisensaConfig) -> Result<()> {
    println!("{}", "agrisensa Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.agrisensa/config.toml found"
        } else {
            "not found (run `agrisensa config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".agrisensa.toml found"
        } else {
            "none (optional)"
        },
    );

    let backend = BackendClient::from_config(&cfg.backend);
    let reachable = backend.is_reachable();
    let detail = if reachable {
        format!("reachable at {}", backend.base_url())
    } else {
        format!("not reachable at {} (is the backend running?)", backend.base_url())
    };
    print_health_item("Backend", reachable, &detail);
    print_health_item("Timeout", true, &format!("{} ms", cfg.backend.timeout_ms));
    print_health_item("Default commodity", true, &cfg.market.default_commodity);
    print_health_item("Dashboard address", true, &cfg.web.addr);

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// agrisensa config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective agrisensa Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.agrisensa/config.toml");
    print_source(project_exists, ".agrisensa.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "AGRISENSA_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.agrisensa/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Edit the file to point agrisensa at your backend.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn report_error<W: Write>(out: &mut W, error: &FlowError) -> Result<()> {
    writeln!(out, "{} {}", "error:".red().bold(), error.to_string().red())?;
    Ok(())
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
