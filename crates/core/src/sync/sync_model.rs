use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler and feed failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Sync scheduler is already running")]
    AlreadyRunning,

    #[error("Sync scheduler is not running")]
    NotRunning,

    #[error("Valuation feed failed: {0}")]
    Feed(String),
}

/// A wallet that could not be synced, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletSyncFailure {
    pub wallet_id: String,
    pub message: String,
}

/// Outcome of one sync run over a set of wallets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<WalletSyncFailure>,
}
