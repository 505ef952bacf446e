//! Quota ledger error types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Business-rule rejections raised by the quota ledger.
///
/// None of these are transient: retrying the same request yields the same
/// error. A rejected operation leaves the ledger untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuotaError {
    #[error("Amount must be greater than 0, got {0}")]
    InvalidAmount(Decimal),

    #[error("Quota ledger of wallet {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("No valuation data for wallet {wallet_id} at or before {timestamp}")]
    NoValuationData {
        wallet_id: String,
        timestamp: DateTime<Utc>,
    },

    #[error("Insufficient units to redeem: requested {requested}, available {available}")]
    InsufficientUnits {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Unit value is zero: net worth is 0 while {0} units are outstanding")]
    ZeroUnitValue(Decimal),

    #[error("Not found: {0}")]
    NotFound(String),
}
