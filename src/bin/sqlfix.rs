//! sqlfix — patch a generated SQL import file in place
//!
//! # Usage
//!
//! ```bash
//! # Rename the company inside INSERT INTO clients blocks
//! sqlfix blocks
//!
//! # Strip AND company_id guards, rename company subqueries
//! sqlfix clauses
//!
//! # Both, on another file, without writing
//! sqlfix --file seed.sql --dry-run all
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlfix::config::Overrides;
use sqlfix::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlfix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Patch company references in a generated SQL import file", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlfix blocks                          # Rename company in client blocks
    sqlfix clauses                         # Strip company_id guards
    sqlfix --to Acme --dry-run all         # Preview both passes")]
struct Cli {
    /// SQL file to patch in place
    #[arg(short, long, env = "SQLFIX_FILE")]
    file: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Company name to replace
    #[arg(long)]
    from: Option<String>,

    /// Replacement company name
    #[arg(long)]
    to: Option<String>,

    /// Don't write, just report what would change
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename the company inside INSERT INTO clients blocks
    Blocks,
    /// Strip AND company_id guards and rename company subqueries
    Clauses,
    /// Run blocks, then clauses
    All,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("sqlfix=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<FixConfig> {
    let overrides = Overrides {
        file: cli.file.clone(),
        from: cli.from.clone(),
        to: cli.to.clone(),
    };
    FixConfig::resolve(cli.config.as_deref(), &overrides).context("Failed to load config")
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let patcher = Patcher::new(config).dry_run(cli.dry_run);

    if cli.verbose {
        let c = patcher.config();
        eprintln!("{} {}", "File:".dimmed(), c.file.display().to_string().yellow());
        eprintln!(
            "{} '{}' -> '{}'",
            "Rename:".dimmed(),
            c.rename.from.yellow(),
            c.rename.to.yellow()
        );
    }

    let reports = match cli.command {
        Commands::Blocks => vec![patcher.run(Pass::Blocks)?],
        Commands::Clauses => vec![patcher.run(Pass::Clauses)?],
        Commands::All => patcher.run_all()?,
    };

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports).context("Failed to encode report")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for report in &reports {
                print_report(report, cli.verbose);
            }
        }
    }
    Ok(())
}

fn print_report(report: &PatchReport, verbose: bool) {
    if report.written {
        println!("{}", report.message);
    } else {
        println!("{} {}", "(dry run)".yellow(), report.message.dimmed());
    }

    if !verbose {
        return;
    }
    match &report.stats {
        PassStats::Blocks(s) => {
            println!(
                "  {} lines, {} blocks, {} lines changed",
                s.lines.to_string().cyan(),
                s.blocks.to_string().cyan(),
                s.lines_changed.to_string().cyan()
            );
            if s.unterminated {
                println!("  {}", "⚠ input ended inside a block".yellow());
            }
        }
        PassStats::Clauses(s) => {
            println!(
                "  {} clauses removed, {} subqueries renamed",
                s.clauses_removed.to_string().cyan(),
                s.subqueries_renamed.to_string().cyan()
            );
        }
    }
}
