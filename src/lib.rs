// Client-side wallet sync engine: per-chain pollers feed reconciliation
// listeners that maintain certified keyed stores, pending-event mergers
// and the proof-of-work signing gate.

pub mod chains;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod models;
pub mod stores;
pub mod sync;
pub mod workers;

pub use config::Config;
pub use context::SyncContext;
pub use error::{Result, SyncError};
