//! Valuation observation domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// Where a net worth observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationSource {
    /// Produced by the periodic external sync. Wins every bucket conflict.
    Automatic,
    /// Entered by an operator to backfill history.
    Manual,
}

/// A timestamped net worth measurement for a wallet. Immutable once created,
/// except manual observations which an operator may correct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationObservation {
    pub id: String,
    pub wallet_id: String,
    pub timestamp: DateTime<Utc>,
    pub networth: Decimal,
    pub source: ValuationSource,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input model for recording an observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewValuationObservation {
    pub wallet_id: String,
    pub timestamp: DateTime<Utc>,
    pub networth: Decimal,
    pub source: ValuationSource,
    pub notes: Option<String>,
}

impl NewValuationObservation {
    pub fn automatic(wallet_id: impl Into<String>, timestamp: DateTime<Utc>, networth: Decimal) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            timestamp,
            networth,
            source: ValuationSource::Automatic,
            notes: None,
        }
    }

    pub fn manual(wallet_id: impl Into<String>, timestamp: DateTime<Utc>, networth: Decimal) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            timestamp,
            networth,
            source: ValuationSource::Manual,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.wallet_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "walletId".to_string(),
            )));
        }
        validate_networth(self.networth)
    }
}

/// Input model for correcting a manual observation. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualObservationUpdate {
    pub id: String,
    pub wallet_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub networth: Option<Decimal>,
    pub notes: Option<String>,
}

impl ManualObservationUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "id".to_string(),
            )));
        }
        match self.networth {
            Some(networth) => validate_networth(networth),
            None => Ok(()),
        }
    }
}

fn validate_networth(networth: Decimal) -> Result<()> {
    if networth < Decimal::ZERO {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "Net worth must not be negative".to_string(),
        )));
    }
    Ok(())
}

/// One entry of a wallet's merged valuation timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MergedValuationPoint {
    /// Start of the hour bucket
    pub timestamp: DateTime<Utc>,
    pub networth: Decimal,
    pub source: ValuationSource,
}

/// One bucket of a multi-wallet aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedValuationPoint {
    pub timestamp: DateTime<Utc>,
    /// Sum of every contributing wallet's observed or carried-forward value
    pub networth: Decimal,
    /// Wallets with any value at or before this bucket
    pub wallet_count: usize,
}

/// Summary of an aggregated series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedValuationStats {
    pub current: Decimal,
    pub initial: Decimal,
    pub change: Decimal,
    /// Zero when the initial value is not positive
    pub change_percent: Decimal,
    pub data_points: usize,
}

/// Response model for the multi-wallet aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedValuation {
    pub series: Vec<AggregatedValuationPoint>,
    /// `None` when the series is empty
    pub stats: Option<AggregatedValuationStats>,
}
