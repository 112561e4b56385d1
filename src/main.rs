use anyhow::Result;
use clap::{Parser, Subcommand};

use agrisensa::{cli, config, logging, web};

#[derive(Debug, Parser)]
#[command(name = "agrisensa")]
#[command(about = "Plant disease diagnosis and commodity price trends for farmers")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Diagnose a plant disease by answering questions about its symptoms
    Diagnose,
    /// Show price history for a commodity, optionally with an AI forecast
    Trend {
        /// Commodity key (default: market.default_commodity)
        commodity: Option<String>,
        /// History range in days: 7, 30, 90, 180 or 365
        #[arg(long)]
        range: Option<u32>,
        /// Forecast the price on this date (YYYY-MM-DD)
        #[arg(long)]
        predict: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Format an amount as Rupiah
    Format {
        #[arg(allow_hyphen_values = true)]
        amount: f64,
    },
    /// Check configuration and backend reachability
    Health,
    /// Manage configuration (show, init, set, reset)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Launch the local web dashboard
    Web {
        /// Address to bind (default: web.addr)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective (merged) configuration
    Show,
    /// Write a default config file to ~/.agrisensa/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Set a config value (e.g. `backend.base_url http://10.0.0.2:5000`)
    Set {
        /// Dotted key path
        key: String,
        /// New value
        value: String,
    },
    /// Reset the global config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let loaded = config::load_with_warnings();
    logging::init(&loaded.config.logging);
    loaded.log_warnings();
    let cfg = loaded.config;

    match app.command {
        Commands::Diagnose => cli::run_diagnose(&cfg),
        Commands::Trend {
            commodity,
            range,
            predict,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_trend(
                &cfg,
                commodity.as_deref(),
                range,
                predict.as_deref(),
                fmt,
            )
        }
        Commands::Format { amount } => cli::run_format(&cfg, amount),
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Web { addr } => {
            let mut cfg = cfg;
            if let Some(addr) = addr {
                cfg.web.addr = addr;
            }
            web::serve(&cfg)
        }
    }
}
