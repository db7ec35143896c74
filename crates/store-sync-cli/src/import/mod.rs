//! Import of export artifacts into a target store
//!
//! - [`driver`]: file order, per-record failure boundary, summary
//! - [`upsert`]: handle-matched create-or-update for each entity type
//! - [`payload`]: record to request body mapping
//! - [`resolver`]: export-side to target-side id map (blogs)
//! - [`error_log`]: append-only failure log

pub mod driver;
pub mod error_log;
pub mod payload;
pub mod resolver;
pub mod upsert;

pub use driver::{EntityKind, ImportDriver, ImportOptions, ImportSummary, Tally};
pub use error_log::ErrorLog;
pub use upsert::{UpsertOutcome, Upserter};
