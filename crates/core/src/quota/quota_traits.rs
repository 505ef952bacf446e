//! Quota repository and service traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::quota_model::{
    CashMovement, LedgerChange, LedgerInitialization, NewCashMovement, QuotaHistory,
    QuotaHistoryPoint, RecordedMovement,
};
use crate::errors::Result;

/// Trait defining the contract for quota ledger persistence.
#[async_trait]
pub trait QuotaRepositoryTrait: Send + Sync {
    /// All movements of a wallet, ordered by timestamp then insertion time.
    fn list_movements(&self, wallet_id: &str) -> Result<Vec<CashMovement>>;

    /// A single movement. `DatabaseError::NotFound` when it does not exist or
    /// belongs to another wallet.
    fn get_movement(&self, wallet_id: &str, movement_id: &str) -> Result<CashMovement>;

    /// The cached history points of a wallet, ordered by timestamp.
    fn list_history_points(&self, wallet_id: &str) -> Result<Vec<QuotaHistoryPoint>>;

    /// Applies a ledger change atomically: the wallet's unit quantity (and
    /// initial unit value, if set), the movement insert or removal, and the
    /// history update either all land or none do.
    async fn commit_ledger_change(&self, change: LedgerChange) -> Result<()>;
}

/// Trait defining the contract for the quota ledger service.
///
/// Every operation on one wallet's ledger is serialized against every other
/// operation on the same wallet; different wallets proceed in parallel.
#[async_trait]
pub trait QuotaServiceTrait: Send + Sync {
    /// Seeds the ledger with a first deposit of `amount`.
    ///
    /// Fails with `AlreadyInitialized` if units are outstanding.
    async fn initialize_ledger(
        &self,
        wallet_id: &str,
        amount: Decimal,
        initial_unit_value: Option<Decimal>,
    ) -> Result<LedgerInitialization>;

    /// Prices a deposit or withdrawal at the latest valuation at or before
    /// its timestamp and issues or redeems units accordingly.
    async fn record_movement(&self, movement: NewCashMovement) -> Result<RecordedMovement>;

    /// Removes a movement and rebuilds the ledger from what remains.
    async fn delete_movement(&self, wallet_id: &str, movement_id: &str) -> Result<()>;

    /// Recomputes unit quantity and the history cache from the stored
    /// movements. Returns the rebuilt unit quantity.
    async fn rebuild_ledger(&self, wallet_id: &str) -> Result<Decimal>;

    /// Unit value history over the last `days` days plus performance metrics.
    async fn get_history(&self, wallet_id: &str, days: i64, limit: usize) -> Result<QuotaHistory>;

    /// Unit value history for the window ending at `now`.
    async fn get_history_as_of(
        &self,
        wallet_id: &str,
        now: DateTime<Utc>,
        days: i64,
        limit: usize,
    ) -> Result<QuotaHistory>;

    /// Movements of a wallet, newest first.
    fn get_movements(&self, wallet_id: &str) -> Result<Vec<CashMovement>>;

    /// Cached history points of a wallet, oldest first.
    fn get_history_points(&self, wallet_id: &str) -> Result<Vec<QuotaHistoryPoint>>;
}
