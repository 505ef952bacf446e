//! Wallet domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_INITIAL_UNIT_VALUE;
use crate::{errors::ValidationError, Error, Result};

/// Lifecycle of a wallet's quota ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerState {
    /// No units have ever been issued.
    Unseeded,
    /// Units were issued at least once. Stays active even if every unit was
    /// later redeemed.
    Active,
}

/// A tracked wallet. Each wallet owns exactly one quota ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    /// On-chain address the external feed is queried with
    pub address: String,
    pub name: Option<String>,
    /// Unit price used while no units are outstanding
    pub initial_unit_value: Decimal,
    /// Units currently outstanding. Only the quota ledger mutates this.
    pub unit_quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Returns the ledger state given whether any movement was ever recorded.
    pub fn ledger_state(&self, has_movements: bool) -> LedgerState {
        if self.unit_quantity > Decimal::ZERO || has_movements {
            LedgerState::Active
        } else {
            LedgerState::Unseeded
        }
    }
}

/// Input model for registering a wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWallet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub address: String,
    pub name: Option<String>,
    #[serde(default = "default_initial_unit_value")]
    pub initial_unit_value: Decimal,
}

fn default_initial_unit_value() -> Decimal {
    DEFAULT_INITIAL_UNIT_VALUE
}

impl NewWallet {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            id: None,
            address: address.into(),
            name: None,
            initial_unit_value: DEFAULT_INITIAL_UNIT_VALUE,
        }
    }

    /// Validates the new wallet data.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Wallet address cannot be empty".to_string(),
            )));
        }
        if self.initial_unit_value <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Initial unit value must be greater than 0".to_string(),
            )));
        }
        Ok(())
    }
}
