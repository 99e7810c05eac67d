//! Services Layer
//!
//! Job-level logic shared between the CLI subcommands and any embedding
//! caller. Services orchestrate the config loader, the provider seam, and
//! the db layer; they own no SQL and no parsing themselves.
//!
//! # Services
//!
//! - `SyncService` - reconcile the persisted watchlist with configuration
//! - `IngestService` - fetch observations and write them into the lake
//! - `ViewService` - rebuild the price view and its materialized copy
//! - `ZoneService` - zone status rows, alert candidates, price history

pub mod ingest_service;
pub mod sync_service;
pub mod view_service;
pub mod zone_service;

// Re-export commonly used types and services
pub use ingest_service::{IngestResult, IngestService};
pub use sync_service::{SyncResult, SyncService};
pub use view_service::{ViewResult, ViewService};
pub use zone_service::{ZoneService, ZoneSummary};
