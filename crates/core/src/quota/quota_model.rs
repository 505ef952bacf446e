//! Quota ledger domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::quota_errors::QuotaError;
use crate::{errors::ValidationError, Error, Result};

/// Direction of a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Money entering the pool; units are issued.
    In,
    /// Money leaving the pool; units are redeemed.
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(MovementType::In),
            "out" => Ok(MovementType::Out),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Invalid movement type '{}'. Must be \"in\" or \"out\"",
                other
            )))),
        }
    }
}

/// A deposit into or withdrawal from a wallet's pool, converted to units at
/// the unit value prevailing when it was recorded.
///
/// `amount / unit_value_at_time == units_issued` at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashMovement {
    pub id: String,
    pub wallet_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub unit_value_at_time: Decimal,
    /// Units created (`in`) or redeemed (`out`); always positive
    pub units_issued: Decimal,
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    /// Units with the sign of the movement's effect on the outstanding
    /// quantity.
    pub fn signed_units(&self) -> Decimal {
        match self.movement_type {
            MovementType::In => self.units_issued,
            MovementType::Out => -self.units_issued,
        }
    }
}

/// Request to record a cash movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCashMovement {
    pub wallet_id: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub amount: Decimal,
    /// Defaults to now
    pub timestamp: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl NewCashMovement {
    pub fn new(wallet_id: impl Into<String>, movement_type: MovementType, amount: Decimal) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            movement_type,
            amount,
            timestamp: None,
            description: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(QuotaError::InvalidAmount(self.amount).into());
        }
        Ok(())
    }
}

/// Cached ledger state right after a movement was applied. Derived data:
/// the whole cache can be rebuilt from the movements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaHistoryPoint {
    pub wallet_id: String,
    /// Movement that produced this point
    pub movement_id: String,
    pub timestamp: DateTime<Utc>,
    pub unit_value: Decimal,
    pub unit_quantity: Decimal,
    pub networth: Decimal,
}

/// How a ledger commit changes the quota history cache.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryUpdate {
    /// Add one point, keeping the existing ones.
    Append(QuotaHistoryPoint),
    /// Replace the wallet's whole cache.
    Replace(Vec<QuotaHistoryPoint>),
}

/// Every write a single ledger operation performs. Repositories must apply it
/// all-or-nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerChange {
    pub wallet_id: String,
    pub unit_quantity: Decimal,
    /// Set only by ledger initialization
    pub initial_unit_value: Option<Decimal>,
    pub insert_movement: Option<CashMovement>,
    pub remove_movement_id: Option<String>,
    pub history: HistoryUpdate,
}

/// Result of seeding a ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInitialization {
    pub unit_value: Decimal,
    pub unit_quantity: Decimal,
    pub movement: CashMovement,
}

/// Result of recording a movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMovement {
    pub movement: CashMovement,
    pub new_unit_quantity: Decimal,
    pub current_unit_value: Decimal,
}

/// One point of the derived unit value history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub unit_value: Decimal,
    /// Units outstanding at this instant, replayed from the movements
    pub unit_quantity: Decimal,
    pub networth: Decimal,
}

/// Performance summary reported alongside the unit value history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaMetrics {
    pub total_cash_in: Decimal,
    pub total_cash_out: Decimal,
    /// `total_cash_in - total_cash_out`
    pub net_invested: Decimal,
    /// Latest valuation, 0 when the wallet has none
    pub current_networth: Decimal,
    /// `current_networth - net_invested`
    pub absolute_gain: Decimal,
    /// Zero when `net_invested <= 0`
    pub roi_pct: Decimal,
    pub initial_unit_value: Decimal,
    pub current_unit_value: Decimal,
    /// Change of the unit value across the series, in percent
    pub performance_pct: Decimal,
    /// Live units outstanding
    pub unit_quantity: Decimal,
}

/// Response model for the unit value history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaHistory {
    pub series: Vec<QuotaSeriesPoint>,
    pub metrics: QuotaMetrics,
}
