//! Declarative watchlist configuration
//!
//! The watchlist is declared in a JSON document:
//!
//! ```json
//! {
//!   "watchlist": [
//!     { "ticker": "AAPL", "zone_low": 165, "zone_high": 175, "tags": ["tech"] }
//!   ]
//! }
//! ```
//!
//! A missing file is a distinct error from a file that declares no
//! instruments; the latter is a valid (empty) watchlist.

use crate::db::models::WatchItem;
use crate::error::{AppError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct WatchlistDoc {
    #[serde(default)]
    watchlist: Vec<RawWatchItem>,
}

/// Watch item as written in the file, before validation. Everything but
/// the ticker and the zone bounds is optional.
#[derive(Debug, Deserialize)]
struct RawWatchItem {
    ticker: String,
    #[serde(default = "default_currency")]
    currency: String,
    zone_low: f64,
    zone_high: f64,
    #[serde(default = "default_notify")]
    notify_on_cross: bool,
    #[serde(default = "default_cooloff")]
    cooloff_days: u32,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    notes: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_notify() -> bool {
    true
}

fn default_cooloff() -> u32 {
    1
}

/// Load and validate the declared watchlist.
pub fn load_watch_items(path: &Path) -> Result<Vec<WatchItem>> {
    if !path.exists() {
        return Err(AppError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let text = std::fs::read_to_string(path)?;
    let doc: WatchlistDoc =
        serde_json::from_str(&text).map_err(|e| AppError::ConfigInvalid(e.to_string()))?;

    let mut items = Vec::with_capacity(doc.watchlist.len());
    for raw in doc.watchlist {
        items.push(validate(raw)?);
    }

    tracing::debug!("Loaded {} watch items from {}", items.len(), path.display());
    Ok(items)
}

fn validate(raw: RawWatchItem) -> Result<WatchItem> {
    let ticker = raw.ticker.trim().to_string();
    if ticker.is_empty() {
        return Err(AppError::ConfigInvalid(
            "watch item with blank ticker".to_string(),
        ));
    }
    if !raw.zone_low.is_finite() || !raw.zone_high.is_finite() {
        return Err(AppError::ConfigInvalid(format!(
            "{ticker}: zone bounds must be finite numbers"
        )));
    }
    if raw.zone_low > raw.zone_high {
        return Err(AppError::ConfigInvalid(format!(
            "{ticker}: zone_low {} exceeds zone_high {}",
            raw.zone_low, raw.zone_high
        )));
    }

    Ok(WatchItem {
        ticker,
        currency: raw.currency,
        zone_low: raw.zone_low,
        zone_high: raw.zone_high,
        notify_on_cross: raw.notify_on_cross,
        cooloff_days: raw.cooloff_days,
        tags: normalize_tags(raw.tags),
        notes: raw.notes,
    })
}

/// Trim tags, drop blanks, dedupe while keeping declaration order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
