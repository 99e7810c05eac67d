//! Zonewatch CLI
//!
//! Batch jobs over one data directory: sync the watchlist, ingest prices,
//! rebuild views, and read zone status or alerts. Exit codes follow the
//! error class so cron wrappers can tell config mistakes from storage
//! failures.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zonewatch::db::models::ZoneStatusRow;
use zonewatch::error::{AppError, Result};
use zonewatch::provider::csv_file::CsvFileProvider;
use zonewatch::provider::Interval;
use zonewatch::services::{IngestService, SyncService, ViewService, ZoneService};
use zonewatch::state::AppState;

#[derive(Parser)]
#[command(name = "zonewatch", version, about = "Watchlist zone tracking over a partitioned price lake")]
struct Cli {
    /// Data directory holding the database, the price lake, and watchlist.json
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile the persisted watchlist with watchlist.json
    Sync,
    /// Sync, then ingest observations from a wide CSV export
    Fetch {
        /// Wide CSV export: a datetime column plus TICKER:FIELD columns
        #[arg(long)]
        csv: PathBuf,
        /// Trailing window to ingest, in days
        #[arg(long, default_value_t = 365)]
        lookback_days: u32,
        /// Sampling interval of the export: 1h or 1d
        #[arg(long, default_value = "1h")]
        interval: String,
    },
    /// Rebuild the price view and refresh its materialized copy
    BuildViews,
    /// Print the zone status table
    Status,
    /// Print instruments whose latest two daily closes crossed into the zone
    Alerts,
    /// Print the close history of one instrument
    History {
        ticker: String,
        /// Trailing window, in days
        #[arg(long, default_value_t = 30)]
        window_days: u32,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zonewatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let state = AppState::open(&cli.data_dir)?;

    match cli.command {
        Command::Sync => {
            let result = SyncService::run(&state)?;
            println!(
                "watchlist synced: {} declared, {} persisted",
                result.declared, result.persisted
            );
        }
        Command::Fetch {
            csv,
            lookback_days,
            interval,
        } => {
            let interval = Interval::parse(&interval).ok_or_else(|| {
                AppError::ConfigInvalid(format!(
                    "unknown interval '{interval}', expected 1h or 1d"
                ))
            })?;

            SyncService::run(&state)?;
            let provider = CsvFileProvider::new(csv);
            let result = IngestService::run(&state, &provider, lookback_days, interval)?;
            println!(
                "{} rows written for {} tickers",
                result.rows_written,
                result.tickers.len()
            );
        }
        Command::BuildViews => {
            let result = ViewService::rebuild(&state)?;
            println!(
                "view covers {} partition files, {} rows materialized",
                result.partition_files, result.materialized_rows
            );
        }
        Command::Status => {
            let rows = ZoneService::status_rows(&state)?;
            print_status(&rows);
        }
        Command::Alerts => {
            let candidates = ZoneService::alert_candidates(&state)?;
            if candidates.is_empty() {
                println!("no fresh zone crossings");
            }
            for c in &candidates {
                println!(
                    "ALERT: {} closed {:.2} inside [{:.2}, {:.2}] on {} (previous close {:.2})",
                    c.ticker, c.close_now, c.zone_low, c.zone_high, c.date, c.close_prev
                );
            }
        }
        Command::History {
            ticker,
            window_days,
        } => {
            let points = ZoneService::price_history(&state, &ticker, window_days)?;
            if points.is_empty() {
                println!("no closes for {ticker} in the last {window_days} days");
            }
            for p in &points {
                println!("{}  {:.4}", p.datetime.format("%Y-%m-%d %H:%M"), p.close);
            }
        }
    }

    Ok(())
}

fn print_status(rows: &[ZoneStatusRow]) {
    println!(
        "{:<10} {:>10} {:>10} {:>8}  {:<8} {:>7}",
        "TICKER", "CLOSE", "PREV", "%CHG", "STATUS", "CROSSED"
    );
    for row in rows {
        println!(
            "{:<10} {:>10} {:>10} {:>8}  {:<8} {:>7}",
            row.ticker,
            fmt_opt(row.close_now),
            fmt_opt(row.close_prev),
            fmt_opt(row.pct_change),
            row.zone_status.as_str(),
            if row.crossed_today { "yes" } else { "" },
        );
    }

    let summary = ZoneService::summary(rows);
    println!(
        "{} tracked, {} in zone, {} crossed today",
        summary.tracked, summary.in_zone, summary.crossed_today
    );
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}
