//! Data models shared by the db layer, services, and providers
//!
//! Timestamps are `chrono` types in memory and strings at the SQL edge; the
//! helpers at the bottom of this module do those conversions in one place.

use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A watched instrument, as declared in configuration and as persisted in
/// the `watchlist` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchItem {
    pub ticker: String,
    pub currency: String,
    pub zone_low: f64,
    pub zone_high: f64,
    pub notify_on_cross: bool,
    pub cooloff_days: u32,
    pub tags: Vec<String>,
    pub notes: String,
}

/// Observation kind carried in a price stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationField {
    Open,
    High,
    Low,
    Close,
    #[serde(rename = "Adj Close")]
    AdjClose,
    Volume,
}

impl ObservationField {
    /// Storage form, also the column suffix used by wide provider exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationField::Open => "Open",
            ObservationField::High => "High",
            ObservationField::Low => "Low",
            ObservationField::Close => "Close",
            ObservationField::AdjClose => "Adj Close",
            ObservationField::Volume => "Volume",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Open" => Some(ObservationField::Open),
            "High" => Some(ObservationField::High),
            "Low" => Some(ObservationField::Low),
            "Close" => Some(ObservationField::Close),
            "Adj Close" => Some(ObservationField::AdjClose),
            "Volume" => Some(ObservationField::Volume),
            _ => None,
        }
    }
}

/// One long-format price observation, the unit stored in the lake.
///
/// `date` is always the UTC calendar date of `datetime`; it doubles as the
/// second partition key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub ticker: String,
    pub datetime: DateTime<Utc>,
    pub date: NaiveDate,
    pub field: ObservationField,
    pub value: f64,
}

impl PriceObservation {
    pub fn new(
        ticker: impl Into<String>,
        datetime: DateTime<Utc>,
        field: ObservationField,
        value: f64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            date: datetime.date_naive(),
            datetime,
            field,
            value,
        }
    }
}

/// One (ticker, field) column of a wide provider batch. Cells are `None`
/// where the instrument had no observation at that timestamp.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub ticker: String,
    pub field: ObservationField,
    pub values: Vec<Option<f64>>,
}

/// Wide-format batch as returned by a market-data provider: a shared
/// timestamp spine plus one series per (ticker, field) column.
#[derive(Debug, Clone, Default)]
pub struct PriceBatch {
    timestamps: Vec<DateTime<Utc>>,
    series: Vec<PriceSeries>,
}

impl PriceBatch {
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            series: Vec::new(),
        }
    }

    /// Add one column. The series must be exactly as long as the spine.
    pub fn push_series(
        &mut self,
        ticker: impl Into<String>,
        field: ObservationField,
        values: Vec<Option<f64>>,
    ) -> Result<()> {
        let ticker = ticker.into();
        if values.len() != self.timestamps.len() {
            return Err(AppError::Validation(format!(
                "series {}:{} has {} values for {} timestamps",
                ticker,
                field.as_str(),
                values.len(),
                self.timestamps.len()
            )));
        }
        self.series.push(PriceSeries {
            ticker,
            field,
            values,
        });
        Ok(())
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn series(&self) -> &[PriceSeries] {
        &self.series
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() || self.series.is_empty()
    }

    /// Reshape wide to long, dropping empty cells. Row order follows the
    /// timestamp spine within each series.
    pub fn into_observations(self) -> Vec<PriceObservation> {
        let mut rows = Vec::new();
        for series in self.series {
            for (ts, value) in self.timestamps.iter().zip(series.values) {
                if let Some(value) = value {
                    rows.push(PriceObservation::new(
                        series.ticker.clone(),
                        *ts,
                        series.field,
                        value,
                    ));
                }
            }
        }
        rows
    }
}

/// Zone membership of an instrument's latest close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneStatus {
    #[serde(rename = "In zone")]
    InZone,
    Below,
    Above,
    #[serde(rename = "No data")]
    NoData,
}

impl ZoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneStatus::InZone => "In zone",
            ZoneStatus::Below => "Below",
            ZoneStatus::Above => "Above",
            ZoneStatus::NoData => "No data",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "In zone" => Some(ZoneStatus::InZone),
            "Below" => Some(ZoneStatus::Below),
            "Above" => Some(ZoneStatus::Above),
            "No data" => Some(ZoneStatus::NoData),
            _ => None,
        }
    }
}

/// One row of the zone status table: the watch item joined with analytics
/// over its latest two observations. Price fields are `None` for
/// instruments with no observations in the lake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatusRow {
    pub ticker: String,
    pub currency: String,
    pub zone_low: f64,
    pub zone_high: f64,
    pub notify_on_cross: bool,
    pub cooloff_days: u32,
    pub tags: Vec<String>,
    pub notes: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub close_now: Option<f64>,
    pub close_prev: Option<f64>,
    pub pct_change: Option<f64>,
    pub zone_status: ZoneStatus,
    pub crossed_today: bool,
}

/// An instrument whose latest daily close crossed into its zone, eligible
/// for alert delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub ticker: String,
    pub date: NaiveDate,
    pub close_now: f64,
    pub close_prev: f64,
    pub zone_low: f64,
    pub zone_high: f64,
}

/// One close observation, for charting an instrument's trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub datetime: DateTime<Utc>,
    pub close: f64,
}

// ===== Storage-edge conversions =====

/// Comma-joined storage form of a tag list.
pub(crate) fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

/// Inverse of [`join_tags`]; blank segments are dropped.
pub(crate) fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// UTC timestamp in the literal form DuckDB casts to TIMESTAMP.
pub(crate) fn fmt_timestamp(dt: &DateTime<Utc>) -> String {
    dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Date in the literal form DuckDB casts to DATE.
pub(crate) fn fmt_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Inverse of `epoch_us(...)` reads.
pub(crate) fn ts_from_micros(us: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us)
        .ok_or_else(|| AppError::Internal(format!("timestamp out of range: {us}")))
}

/// Parse a DATE cast to VARCHAR.
pub(crate) fn date_from_str(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AppError::Internal(format!("unparseable date '{s}': {e}")))
}
