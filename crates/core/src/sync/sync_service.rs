use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;

use super::sync_model::{SyncSummary, WalletSyncFailure};
use super::sync_traits::{SyncJob, ValuationFeedTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::valuations::{NewValuationObservation, ValuationServiceTrait};
use crate::wallets::{Wallet, WalletRepositoryTrait};

/// Fetches the current net worth of every wallet and records it as an
/// automatic observation.
pub struct WalletSyncService {
    wallet_repository: Arc<dyn WalletRepositoryTrait>,
    valuation_service: Arc<dyn ValuationServiceTrait>,
    feed: Arc<dyn ValuationFeedTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl WalletSyncService {
    pub fn new(
        wallet_repository: Arc<dyn WalletRepositoryTrait>,
        valuation_service: Arc<dyn ValuationServiceTrait>,
        feed: Arc<dyn ValuationFeedTrait>,
    ) -> Self {
        Self {
            wallet_repository,
            valuation_service,
            feed,
            event_sink: Arc::new(NoOpDomainEventSink),
        }
    }

    /// Sets the domain event sink for emitting WalletsSynced events.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    /// Syncs the given wallets, or all wallets when `wallet_ids` is `None`.
    ///
    /// Wallets are fetched concurrently. A failing wallet is reported in the
    /// summary and does not abort the others.
    pub async fn sync_wallets(&self, wallet_ids: Option<&[String]>) -> Result<SyncSummary> {
        let wallets = self.wallet_repository.list(wallet_ids)?;
        let results = join_all(wallets.iter().map(|w| self.sync_wallet(w))).await;

        let mut summary = SyncSummary {
            total: wallets.len(),
            ..Default::default()
        };
        let mut synced = Vec::new();

        for (wallet, result) in wallets.iter().zip(results) {
            match result {
                Ok(()) => {
                    summary.success += 1;
                    synced.push(wallet.id.clone());
                }
                Err(e) => {
                    warn!("Failed to sync wallet {}: {}", wallet.id, e);
                    summary.failed += 1;
                    summary.errors.push(WalletSyncFailure {
                        wallet_id: wallet.id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Wallet sync finished: {}/{} succeeded",
            summary.success, summary.total
        );
        if summary.total > 0 {
            self.event_sink
                .emit(DomainEvent::wallets_synced(synced, summary.failed));
        }
        Ok(summary)
    }

    async fn sync_wallet(&self, wallet: &Wallet) -> Result<()> {
        let networth = self.feed.fetch_networth(&wallet.address).await?;
        let now = Utc::now();

        self.valuation_service
            .record_observation(NewValuationObservation::automatic(
                wallet.id.clone(),
                now,
                networth,
            ))
            .await?;
        self.wallet_repository.mark_synced(&wallet.id, now).await?;

        debug!("Synced wallet {}: net worth {}", wallet.id, networth);
        Ok(())
    }
}

#[async_trait]
impl SyncJob for WalletSyncService {
    async fn run(&self) -> Result<SyncSummary> {
        self.sync_wallets(None).await
    }
}
