//! File-backed market-data provider
//!
//! Reads a wide CSV exported by an external fetcher: a `datetime` column
//! followed by one `TICKER:FIELD` column per series, for example
//! `datetime,AAPL:Close,AAPL:Volume,MSFT:Close`. Blank cells mean the
//! instrument had no observation at that timestamp.
//!
//! The file carries whatever sampling interval it was exported at; the
//! `interval` argument selects nothing here and rows are not re-sampled.

use crate::db::models::{ObservationField, PriceBatch};
use crate::error::{AppError, Result};
use crate::provider::{Interval, MarketDataProvider};
use chrono::{DateTime, Days, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::PathBuf;

pub struct CsvFileProvider {
    path: PathBuf,
}

impl CsvFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct WideColumn {
    ticker: String,
    field: ObservationField,
    values: Vec<Option<f64>>,
}

impl MarketDataProvider for CsvFileProvider {
    fn fetch(
        &self,
        tickers: &[String],
        lookback_days: u32,
        _interval: Interval,
    ) -> Result<Option<PriceBatch>> {
        let wanted: HashSet<&str> = tickers.iter().map(String::as_str).collect();
        let cutoff = Utc::now() - Days::new(u64::from(lookback_days));

        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let headers = reader.headers()?.clone();

        let Some(first) = headers.get(0) else {
            return Err(AppError::Provider("CSV file has no header row".to_string()));
        };
        if first != "datetime" {
            return Err(AppError::Provider(format!(
                "first CSV column must be 'datetime', found '{first}'"
            )));
        }

        // One slot per data column; None marks columns for unwatched tickers.
        let mut columns: Vec<Option<WideColumn>> = Vec::with_capacity(headers.len() - 1);
        for name in headers.iter().skip(1) {
            let (ticker, field) = parse_column_header(name)?;
            if wanted.contains(ticker) {
                columns.push(Some(WideColumn {
                    ticker: ticker.to_string(),
                    field,
                    values: Vec::new(),
                }));
            } else {
                columns.push(None);
            }
        }

        let mut timestamps: Vec<DateTime<Utc>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            let raw_ts = record.get(0).unwrap_or("");
            let ts = parse_datetime(raw_ts)?;
            if ts < cutoff {
                continue;
            }

            timestamps.push(ts);
            for (i, slot) in columns.iter_mut().enumerate() {
                if let Some(column) = slot {
                    let cell = record.get(i + 1).unwrap_or("");
                    column.values.push(parse_cell(cell, &column.ticker)?);
                }
            }
        }

        if timestamps.is_empty() {
            tracing::debug!("No rows within the lookback window");
            return Ok(None);
        }

        let mut batch = PriceBatch::new(timestamps);
        for column in columns.into_iter().flatten() {
            // A column that is blank through the whole window carries nothing.
            if column.values.iter().any(Option::is_some) {
                batch.push_series(column.ticker, column.field, column.values)?;
            }
        }

        if batch.is_empty() {
            return Ok(None);
        }
        Ok(Some(batch))
    }
}

fn parse_column_header(name: &str) -> Result<(&str, ObservationField)> {
    let (ticker, field) = name.split_once(':').ok_or_else(|| {
        AppError::Provider(format!(
            "malformed column header '{name}', expected TICKER:FIELD"
        ))
    })?;
    let field = ObservationField::parse(field).ok_or_else(|| {
        AppError::Provider(format!("unknown observation field in column '{name}'"))
    })?;
    Ok((ticker.trim(), field))
}

/// Accepts RFC 3339 or naive `YYYY-MM-DD HH:MM:SS` (taken as UTC).
fn parse_datetime(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| AppError::Provider(format!("unparseable datetime '{raw}': {e}")))
}

fn parse_cell(cell: &str, ticker: &str) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|e| AppError::Provider(format!("{ticker}: unparseable value '{cell}': {e}")))
}
