//! Price ingestion service

use crate::error::Result;
use crate::provider::{Interval, MarketDataProvider};
use crate::state::AppState;
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    /// Tickers the provider was asked for.
    pub tickers: Vec<String>,
    /// Long-format rows written into the lake.
    pub rows_written: usize,
}

/// Service for fetching observations and writing them into the price lake
pub struct IngestService;

impl IngestService {
    /// Fetch observations for every watched instrument and land them in the
    /// lake. An empty watchlist or a provider with nothing to give is a
    /// logged no-op, not an error.
    pub fn run(
        state: &AppState,
        provider: &dyn MarketDataProvider,
        lookback_days: u32,
        interval: Interval,
    ) -> Result<IngestResult> {
        let tickers = state.db.tickers()?;
        info!(
            "IngestService::run - {} tickers, lookback {} days, interval {}",
            tickers.len(),
            lookback_days,
            interval.as_str()
        );

        if tickers.is_empty() {
            warn!("Watchlist is empty, nothing to ingest");
            return Ok(IngestResult {
                tickers,
                rows_written: 0,
            });
        }

        let batch = match provider.fetch(&tickers, lookback_days, interval)? {
            Some(batch) if !batch.is_empty() => batch,
            _ => {
                warn!("Provider returned no observations");
                return Ok(IngestResult {
                    tickers,
                    rows_written: 0,
                });
            }
        };

        let rows = batch.into_observations();
        let rows_written = state.db.write_observations(&state.lake, &rows)?;

        Ok(IngestResult {
            tickers,
            rows_written,
        })
    }
}
