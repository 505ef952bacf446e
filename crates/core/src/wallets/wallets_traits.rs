//! Wallet repository trait.
//!
//! Wallet registration lives in the host application; the engine only needs
//! to look wallets up and to record when they were last synced. Ledger fields
//! (`unit_quantity`, `initial_unit_value`) are written exclusively through
//! [`crate::quota::QuotaRepositoryTrait::commit_ledger_change`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::wallets_model::{NewWallet, Wallet};
use crate::errors::Result;

/// Trait defining the contract for Wallet repository operations.
#[async_trait]
pub trait WalletRepositoryTrait: Send + Sync {
    /// Creates a new wallet with an empty ledger.
    async fn create(&self, new_wallet: NewWallet) -> Result<Wallet>;

    /// Retrieves a wallet by its ID.
    ///
    /// Returns `DatabaseError::NotFound` when the wallet does not exist.
    fn get_by_id(&self, wallet_id: &str) -> Result<Wallet>;

    /// Lists wallets, optionally restricted to the given IDs.
    fn list(&self, wallet_ids: Option<&[String]>) -> Result<Vec<Wallet>>;

    /// Records the time of the last successful automatic sync.
    async fn mark_synced(&self, wallet_id: &str, synced_at: DateTime<Utc>) -> Result<()>;
}
