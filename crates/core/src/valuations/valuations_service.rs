//! Valuation timeline service implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::sync::Arc;

use super::timeline::{aggregate_series, aggregate_stats, latest_at_or_before, merge_mixed};
use super::valuations_model::{
    AggregatedValuation, ManualObservationUpdate, MergedValuationPoint, NewValuationObservation,
    ValuationObservation, ValuationSource,
};
use super::valuations_traits::{ValuationRepositoryTrait, ValuationServiceTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::utils::{hour_bucket, window_start};
use crate::wallets::WalletRepositoryTrait;

/// Service producing canonical valuation series from stored observations.
pub struct ValuationService {
    repository: Arc<dyn ValuationRepositoryTrait>,
    wallet_repository: Arc<dyn WalletRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl ValuationService {
    pub fn new(
        repository: Arc<dyn ValuationRepositoryTrait>,
        wallet_repository: Arc<dyn WalletRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            wallet_repository,
            event_sink: Arc::new(NoOpDomainEventSink),
        }
    }

    /// Sets the domain event sink for emitting ValuationsChanged events.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    /// Merged series for the window of `days` days ending at `now`, earliest
    /// `limit` buckets first.
    pub fn merged_series_as_of(
        &self,
        wallet_id: &str,
        now: DateTime<Utc>,
        days: i64,
        limit: usize,
    ) -> Result<Vec<MergedValuationPoint>> {
        let since = hour_bucket(window_start(now, days));
        let mut series = self.get_merged_series_between(wallet_id, Some(since), None)?;
        series.truncate(limit);
        Ok(series)
    }

    /// Aggregate over the window of `days` days ending at `now`.
    pub fn merged_valuation_as_of(
        &self,
        wallet_ids: &[String],
        now: DateTime<Utc>,
        days: i64,
        limit: usize,
    ) -> Result<AggregatedValuation> {
        let since = hour_bucket(window_start(now, days));

        let mut per_wallet = Vec::with_capacity(wallet_ids.len());
        for wallet_id in wallet_ids {
            self.wallet_repository.get_by_id(wallet_id)?;
            per_wallet.push(self.get_merged_series_between(wallet_id, Some(since), None)?);
        }

        let mut series = aggregate_series(&per_wallet);
        series.truncate(limit);
        let stats = aggregate_stats(&series);

        debug!(
            "Aggregated {} wallets into {} buckets since {}",
            wallet_ids.len(),
            series.len(),
            since
        );

        Ok(AggregatedValuation { series, stats })
    }
}

#[async_trait]
impl ValuationServiceTrait for ValuationService {
    async fn record_observation(
        &self,
        observation: NewValuationObservation,
    ) -> Result<ValuationObservation> {
        observation.validate()?;
        self.wallet_repository.get_by_id(&observation.wallet_id)?;

        let stored = self.repository.insert(observation).await?;
        debug!(
            "Recorded {:?} observation {} for wallet {}: {} at {}",
            stored.source, stored.id, stored.wallet_id, stored.networth, stored.timestamp
        );

        self.event_sink
            .emit(DomainEvent::valuations_changed(vec![stored.wallet_id.clone()]));
        Ok(stored)
    }

    async fn update_manual_observation(
        &self,
        update: ManualObservationUpdate,
    ) -> Result<ValuationObservation> {
        update.validate()?;
        let updated = self.repository.update_manual(update).await?;
        self.event_sink
            .emit(DomainEvent::valuations_changed(vec![updated.wallet_id.clone()]));
        Ok(updated)
    }

    async fn delete_manual_observation(
        &self,
        wallet_id: &str,
        observation_id: &str,
    ) -> Result<()> {
        self.repository.delete_manual(wallet_id, observation_id).await?;
        debug!(
            "Deleted manual observation {} of wallet {}",
            observation_id, wallet_id
        );
        self.event_sink
            .emit(DomainEvent::valuations_changed(vec![wallet_id.to_string()]));
        Ok(())
    }

    fn get_manual_observations(&self, wallet_id: &str) -> Result<Vec<ValuationObservation>> {
        let mut observations =
            self.repository
                .list(wallet_id, Some(ValuationSource::Manual), None, None)?;
        observations.reverse();
        Ok(observations)
    }

    fn get_merged_series(
        &self,
        wallet_id: &str,
        days: i64,
        limit: usize,
    ) -> Result<Vec<MergedValuationPoint>> {
        self.merged_series_as_of(wallet_id, Utc::now(), days, limit)
    }

    fn get_merged_series_between(
        &self,
        wallet_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<MergedValuationPoint>> {
        // Widen to the bucket start so a bucket is never split by the bound.
        let since = since.map(hour_bucket);
        let observations = self.repository.list(wallet_id, None, since, until)?;
        Ok(merge_mixed(&observations))
    }

    fn latest_at_or_before(
        &self,
        wallet_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<MergedValuationPoint>> {
        let until = hour_bucket(at).checked_add_signed(Duration::hours(1));
        let series = self.get_merged_series_between(wallet_id, None, until)?;
        Ok(latest_at_or_before(&series, at).cloned())
    }

    fn get_merged_valuation(
        &self,
        wallet_ids: &[String],
        days: i64,
        limit: usize,
    ) -> Result<AggregatedValuation> {
        self.merged_valuation_as_of(wallet_ids, Utc::now(), days, limit)
    }
}
