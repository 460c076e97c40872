//! Perforce Protections Filter
//!
//! Filters depot paths against a protections table captured from
//! `p4 protects -h <ip>` for one user.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use p4_protections::{
    AccessMode, AppError, ProtectionsFilter, RuleTable,
    config::{AppConfig, LogFormat, RulesFormat, load_config},
    protections::ProtectionEntry,
};
use std::io::{Read, Write};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Perforce protections filter - which depot paths may this identity see?
#[derive(Parser, Debug)]
#[command(name = "p4-protections")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "P4_PROTECTIONS_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "P4_PROTECTIONS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Protections table for one user/IP (raw lines or tagged JSON)
    #[arg(short, long)]
    rules: Option<String>,

    /// Rules input format (lines, json)
    #[arg(long)]
    rules_format: Option<String>,

    /// Candidate depot paths, one per line ("-" or absent reads stdin)
    #[arg(short = 'p', long)]
    candidates: Option<String>,

    /// Minimum mode a path must reach (list, read, open, write, admin, super)
    #[arg(short, long)]
    mode: Option<AccessMode>,

    /// Compare paths case-insensitively, as a case-insensitive server does
    #[arg(short = 'i', long)]
    case_insensitive: bool,

    /// Report every candidate with the access it resolved to
    #[arg(long)]
    explain: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }
}

fn read_source(source: Option<&str>) -> Result<String, AppError> {
    let mut buf = String::new();
    match source {
        None | Some("-") => std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::input("stdin", e))?,
        Some(path) => {
            let expanded = shellexpand::tilde(path);
            std::fs::File::open(expanded.as_ref())
                .and_then(|mut file| file.read_to_string(&mut buf))
                .map_err(|e| AppError::input(path, e))?
        }
    };
    Ok(buf)
}

fn load_table(
    path: &str,
    format: RulesFormat,
    case_sensitive: bool,
) -> Result<RuleTable, AppError> {
    let text = read_source(Some(path))?;
    let table = match format {
        RulesFormat::Lines => {
            // blank lines and comments are a convenience of the file format only
            let lines = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'));
            RuleTable::from_lines(lines, case_sensitive)?
        }
        RulesFormat::Json => {
            let entries: Vec<ProtectionEntry> = serde_json::from_str(&text)?;
            RuleTable::from_entries(&entries, case_sensitive)?
        }
    };
    Ok(table)
}

fn read_candidates(source: Option<&str>) -> Result<Vec<String>, AppError> {
    let text = read_source(source)?;
    Ok(text
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

fn main() -> anyhow::Result<()> {
    // Pick up a local .env before clap reads its env-backed arguments
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = load_config(args.config.as_deref()).context("loading configuration")?;

    // Command line wins over file and environment
    if args.case_insensitive {
        config.filter.case_sensitive = false;
    }
    if let Some(mode) = args.mode {
        config.filter.required_mode = mode;
    }
    if let Some(format) = args.rules_format.as_deref() {
        config.filter.rules_format = match format {
            "lines" => RulesFormat::Lines,
            "json" => RulesFormat::Json,
            other => anyhow::bail!("unknown rules format '{other}' (expected lines or json)"),
        };
    }
    if let Some(level) = args.log_level.as_deref() {
        config.logging.level = level.to_string();
    }

    if args.print_config {
        print!("{}", toml::to_string(&config)?);
        return Ok(());
    }

    // Initialize logging
    init_logging(&config);

    let rules_path = args
        .rules
        .as_deref()
        .context("--rules is required unless --print-config is given")?;

    let table = load_table(
        rules_path,
        config.filter.rules_format,
        config.filter.case_sensitive,
    )
    .inspect_err(|e| error!(error = %e, "Failed to load protections table"))?;

    info!(
        rules = table.len(),
        case_sensitive = table.case_sensitive(),
        required = %config.filter.required_mode,
        "Loaded protections table"
    );

    let filter = ProtectionsFilter::new(table);
    let candidates = read_candidates(args.candidates.as_deref())?;
    let required = config.filter.required_mode;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match (args.explain, args.output) {
        (true, OutputFormat::Json) => {
            let decisions = filter.explain(&candidates, required);
            serde_json::to_writer_pretty(&mut out, &decisions)?;
            writeln!(out)?;
        }
        (true, OutputFormat::Text) => {
            for decision in filter.explain(&candidates, required) {
                let verdict = if decision.allowed { "allow" } else { "deny " };
                let highest = decision
                    .highest
                    .map(|mode| mode.to_string())
                    .unwrap_or_else(|| "none".to_string());
                writeln!(out, "{verdict} {highest:<6} {}", decision.path)?;
            }
        }
        (false, OutputFormat::Json) => {
            let accepted = filter.filter_paths(&candidates, required);
            serde_json::to_writer_pretty(&mut out, &accepted)?;
            writeln!(out)?;
        }
        (false, OutputFormat::Text) => {
            for path in filter.filter_paths(&candidates, required) {
                writeln!(out, "{path}")?;
            }
        }
    }

    Ok(())
}
