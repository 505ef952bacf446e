//! Sync module - periodic automatic valuation of wallets.
//!
//! Sync runs on its own schedule and only writes valuation observations; it
//! never touches a wallet's quota ledger.

mod scheduler;
mod sync_model;
mod sync_service;
mod sync_traits;


pub use scheduler::{interval_from_hours, SyncScheduler};
pub use sync_model::{SyncError, SyncSummary, WalletSyncFailure};
pub use sync_service::WalletSyncService;
pub use sync_traits::{SyncJob, ValuationFeedTrait};
