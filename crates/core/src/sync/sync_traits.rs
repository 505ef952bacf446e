use async_trait::async_trait;
use rust_decimal::Decimal;

use super::sync_model::SyncSummary;
use crate::errors::Result;

/// Source of current wallet net worth, typically a third-party balance API.
///
/// Implementations report failures as `SyncError::Feed`.
#[async_trait]
pub trait ValuationFeedTrait: Send + Sync {
    async fn fetch_networth(&self, address: &str) -> Result<Decimal>;
}

/// Work executed on every scheduler tick.
#[async_trait]
pub trait SyncJob: Send + Sync {
    async fn run(&self) -> Result<SyncSummary>;
}
