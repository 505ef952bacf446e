use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{MemoryDb, Tables};
use crate::errors::StorageError;
use walletquota_core::errors::Result;
use walletquota_core::valuations::{
    ManualObservationUpdate, NewValuationObservation, ValuationObservation,
    ValuationRepositoryTrait, ValuationSource,
};

pub struct ValuationRepository {
    db: Arc<MemoryDb>,
}

impl ValuationRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        ValuationRepository { db }
    }
}

fn find_manual<'a>(
    tables: &'a mut Tables,
    wallet_id: &str,
    observation_id: &str,
) -> std::result::Result<&'a mut ValuationObservation, StorageError> {
    tables
        .observations_mut()
        .iter_mut()
        .find(|o| is_manual(o, wallet_id, observation_id))
        .ok_or_else(|| not_found(observation_id))
}

fn is_manual(observation: &ValuationObservation, wallet_id: &str, observation_id: &str) -> bool {
    observation.id == observation_id
        && observation.wallet_id == wallet_id
        && observation.source == ValuationSource::Manual
}

fn not_found(observation_id: &str) -> StorageError {
    StorageError::NotFound(format!("manual observation {}", observation_id))
}

#[async_trait]
impl ValuationRepositoryTrait for ValuationRepository {
    async fn insert(&self, observation: NewValuationObservation) -> Result<ValuationObservation> {
        let stored = ValuationObservation {
            id: Uuid::new_v4().to_string(),
            wallet_id: observation.wallet_id,
            timestamp: observation.timestamp,
            networth: observation.networth,
            source: observation.source,
            notes: observation.notes,
            created_at: Utc::now(),
        };

        self.db.transaction(|tables| {
            if !tables.wallets.contains_key(&stored.wallet_id) {
                return Err(StorageError::NotFound(format!("wallet {}", stored.wallet_id)).into());
            }
            tables.observations_mut().push(stored.clone());
            Ok(())
        })?;

        Ok(stored)
    }

    async fn update_manual(&self, update: ManualObservationUpdate) -> Result<ValuationObservation> {
        self.db.transaction(|tables| {
            let observation = find_manual(tables, &update.wallet_id, &update.id)?;
            if let Some(timestamp) = update.timestamp {
                observation.timestamp = timestamp;
            }
            if let Some(networth) = update.networth {
                observation.networth = networth;
            }
            if let Some(notes) = update.notes {
                observation.notes = Some(notes);
            }
            Ok(observation.clone())
        })
    }

    async fn delete_manual(&self, wallet_id: &str, observation_id: &str) -> Result<()> {
        self.db.transaction(|tables| {
            let position = tables
                .observations
                .iter()
                .position(|o| is_manual(o, wallet_id, observation_id))
                .ok_or_else(|| not_found(observation_id))?;
            tables.observations_mut().remove(position);
            Ok(())
        })
    }

    fn list(
        &self,
        wallet_id: &str,
        source: Option<ValuationSource>,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<ValuationObservation>> {
        let mut observations: Vec<ValuationObservation> = self.db.read(|tables| {
            tables
                .observations
                .iter()
                .filter(|o| o.wallet_id == wallet_id)
                .filter(|o| source.map_or(true, |s| o.source == s))
                .filter(|o| since.map_or(true, |s| o.timestamp >= s))
                .filter(|o| until.map_or(true, |u| o.timestamp < u))
                .cloned()
                .collect()
        })?;
        observations.sort_by_key(|o| (o.timestamp, o.created_at));
        Ok(observations)
    }
}
