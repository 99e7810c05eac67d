//! Market-data provider seam
//!
//! Quote sources live behind [`MarketDataProvider`] so ingestion does not
//! care where observations come from. Providers return the wide batch shape
//! ([`PriceBatch`]); the ingest service reshapes it for storage.

pub mod csv_file;

use crate::db::models::PriceBatch;
use crate::error::Result;

/// Sampling interval of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Hourly,
    Daily,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Hourly => "1h",
            Interval::Daily => "1d",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(Interval::Hourly),
            "1d" => Some(Interval::Daily),
            _ => None,
        }
    }
}

/// Source of wide-format price observations for a set of instruments.
pub trait MarketDataProvider {
    /// Fetch observations for `tickers` over a trailing `lookback_days`
    /// window at `interval` resolution.
    ///
    /// `Ok(None)` is the explicit nothing-available signal; callers treat
    /// it as a no-op, not an error.
    fn fetch(
        &self,
        tickers: &[String],
        lookback_days: u32,
        interval: Interval,
    ) -> Result<Option<PriceBatch>>;
}
