//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_ledger_adapter::JsonLedgerAdapter;
use crate::adapters::terminal_prompt::TerminalPrompt;
use crate::adapters::text_archive_adapter::TextArchiveAdapter;
use crate::domain::analysis::Candidate;
use crate::domain::config_validation::load_settings;
use crate::domain::cycle::{ranked_candidates, run_cycle, CycleReport};
use crate::domain::error::DipledgerError;
use crate::domain::ledger::Ledger;
use crate::domain::settings::Settings;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::prompt_port::format_cents;

const SPACER: &str = "==========";

#[derive(Parser, Debug)]
#[command(name = "dipledger", about = "Daily buy-the-dip advisor with a confirmed ledger")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile yesterday's instructions and issue today's
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Rank today's candidates without touching the ledger
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        top: Option<usize>,
    },
    /// Show cash, holdings and pending buys
    Status {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run { config } => run_daily(&config),
        Command::Analyze { config, top } => run_analyze(&config, top),
        Command::Status { config } => run_status(&config),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

/// Load and validate the configuration at `path`.
pub fn build_settings(path: &PathBuf) -> Result<Settings, DipledgerError> {
    info!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    load_settings(&adapter)
}

fn run_daily(config_path: &PathBuf) -> Result<(), DipledgerError> {
    let settings = build_settings(config_path)?;
    let store = JsonLedgerAdapter::new(settings.ledger_path.clone());
    let prices = TextArchiveAdapter::new(settings.data_dir.clone());
    let mut prompt = TerminalPrompt::stdio();

    let report = run_cycle(
        &store,
        &prices,
        &mut prompt,
        &settings,
        Utc::now().timestamp_millis(),
    )?;
    print_report(&report);
    Ok(())
}

fn run_analyze(config_path: &PathBuf, top: Option<usize>) -> Result<(), DipledgerError> {
    let settings = build_settings(config_path)?;
    let prices = TextArchiveAdapter::new(settings.data_dir.clone());
    let ranked = ranked_candidates(&prices, &settings.analysis)?;
    let shown = top.unwrap_or(ranked.len()).min(ranked.len());

    println!("\tticker\t\tmarket\t\trating\t\tconfidence\tlimit\t\tstop loss");
    for candidate in &ranked[..shown] {
        println!("{}", candidate_line(candidate));
    }
    Ok(())
}

fn run_status(config_path: &PathBuf) -> Result<(), DipledgerError> {
    let settings = build_settings(config_path)?;
    let ledger = JsonLedgerAdapter::new(settings.ledger_path).load()?;
    print_status(&ledger);
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), DipledgerError> {
    let settings = build_settings(config_path)?;
    println!("Data directory: {}", settings.data_dir.display());
    println!("Ledger:         {}", settings.ledger_path.display());
    println!("Markets:        {}", settings.analysis.markets.join(", "));
    println!(
        "Trusted:        {} on {}",
        settings.analysis.trusted_ticker, settings.analysis.trusted_market
    );
    println!("\nConfiguration is valid.");
    Ok(())
}

fn candidate_line(candidate: &Candidate) -> String {
    format!(
        "\t{}\t\t{}\t\t{:.2}\t\t{:.2}\t\t{}\t\t{}",
        candidate.ticker,
        candidate.market,
        candidate.rating,
        candidate.confidence,
        format_cents(candidate.limit),
        format_cents(candidate.stop_loss)
    )
}

fn print_report(report: &CycleReport) {
    if !report.sell_instructions.is_empty() {
        println!("{SPACER} sell instructions {SPACER}");
        println!("For owned stocks set the following");
        println!("\tticker\t\tlimit\t\tstop loss");
        for sell in &report.sell_instructions {
            println!("{sell}");
        }
    }

    if report.considered_buying {
        println!("{SPACER} buy instructions {SPACER}");
        if report.buy_instructions.is_empty() {
            println!("Buy Nothing Today...");
        } else {
            println!("Set a buy order for the following (set to expire after the market's next close)");
            println!("\tticker\t\tamount\t\tprice");
            for buy in &report.buy_instructions {
                println!("{buy}");
            }
        }
    }

    println!("Cash: {}", format_cents(report.cash as f64));
}

fn print_status(ledger: &Ledger) {
    println!("Cash: {}", format_cents(ledger.cash as f64));
    match DateTime::<Utc>::from_timestamp_millis(ledger.last_ran) {
        Some(at) if ledger.last_ran > 0 => println!("Last run: {}", at.format("%Y-%m-%d %H:%M UTC")),
        _ => println!("Last run: never"),
    }

    println!("{SPACER} holdings {SPACER}");
    println!("\tticker\t\tamount\t\tvalue\t\tlimit\t\tstop loss");
    for p in ledger.live() {
        println!(
            "\t{}\t\t{}\t\t{}\t\t{}\t\t{}",
            p.ticker,
            p.amount,
            format_cents(p.value),
            format_cents(p.limit),
            format_cents(p.stop_loss)
        );
    }

    println!("{SPACER} pending purchases {SPACER}");
    println!("\tticker\t\tamount\t\tprice");
    for p in ledger.pending() {
        println!(
            "\t{}\t\t{}\t\t{}",
            p.ticker,
            p.amount,
            format_cents(p.buy_price().unwrap_or(p.value))
        );
    }
}
