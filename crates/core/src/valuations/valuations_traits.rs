//! Valuation repository and service traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::valuations_model::{
    AggregatedValuation, ManualObservationUpdate, MergedValuationPoint, NewValuationObservation,
    ValuationObservation, ValuationSource,
};
use crate::errors::Result;

/// Trait defining the contract for observation storage.
///
/// Implementations must support range queries by wallet and timestamp.
#[async_trait]
pub trait ValuationRepositoryTrait: Send + Sync {
    /// Stores a new observation.
    async fn insert(&self, observation: NewValuationObservation) -> Result<ValuationObservation>;

    /// Applies a correction to a manual observation.
    ///
    /// Returns `DatabaseError::NotFound` if no manual observation with that ID
    /// belongs to the wallet.
    async fn update_manual(&self, update: ManualObservationUpdate) -> Result<ValuationObservation>;

    /// Deletes a manual observation belonging to the wallet.
    async fn delete_manual(&self, wallet_id: &str, observation_id: &str) -> Result<()>;

    /// Lists a wallet's observations ordered by timestamp ascending.
    ///
    /// # Arguments
    /// * `source` - If Some, only observations of this provenance
    /// * `since` - Inclusive lower bound on the raw timestamp
    /// * `until` - Exclusive upper bound on the raw timestamp
    fn list(
        &self,
        wallet_id: &str,
        source: Option<ValuationSource>,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<ValuationObservation>>;
}

/// Trait defining the contract for the valuation timeline service.
#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// Validates and stores an observation of either provenance.
    async fn record_observation(
        &self,
        observation: NewValuationObservation,
    ) -> Result<ValuationObservation>;

    /// Corrects a manual observation.
    async fn update_manual_observation(
        &self,
        update: ManualObservationUpdate,
    ) -> Result<ValuationObservation>;

    /// Removes a manual observation.
    async fn delete_manual_observation(&self, wallet_id: &str, observation_id: &str)
        -> Result<()>;

    /// Lists a wallet's manual observations, newest first.
    fn get_manual_observations(&self, wallet_id: &str) -> Result<Vec<ValuationObservation>>;

    /// Merged series for one wallet over the last `days` days, earliest
    /// `limit` buckets.
    fn get_merged_series(
        &self,
        wallet_id: &str,
        days: i64,
        limit: usize,
    ) -> Result<Vec<MergedValuationPoint>>;

    /// Merged series for one wallet between two instants, without a limit.
    ///
    /// `since` is compared against bucket starts (inclusive); `until` is
    /// exclusive on raw timestamps.
    fn get_merged_series_between(
        &self,
        wallet_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<MergedValuationPoint>>;

    /// The most recent merged point whose bucket is at or before `at`.
    fn latest_at_or_before(
        &self,
        wallet_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<MergedValuationPoint>>;

    /// Forward-filled total across several wallets.
    fn get_merged_valuation(
        &self,
        wallet_ids: &[String],
        days: i64,
        limit: usize,
    ) -> Result<AggregatedValuation>;
}
