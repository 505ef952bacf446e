use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::ledger::{self, build_quota_series, compute_metrics, price_movement, replay_movements};
use super::ledger_locks::WalletLocks;
use super::quota_errors::QuotaError;
use super::quota_model::{
    CashMovement, HistoryUpdate, LedgerChange, LedgerInitialization, MovementType,
    NewCashMovement, QuotaHistory, QuotaHistoryPoint, RecordedMovement,
};
use super::quota_traits::{QuotaRepositoryTrait, QuotaServiceTrait};
use crate::constants::INITIAL_MOVEMENT_DESCRIPTION;
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::utils::{hour_bucket, window_start};
use crate::valuations::ValuationServiceTrait;
use crate::wallets::{Wallet, WalletRepositoryTrait};

/// Quota ledger service.
///
/// Serializes every ledger operation per wallet and commits each one through
/// a single atomic [`LedgerChange`].
pub struct QuotaService {
    repository: Arc<dyn QuotaRepositoryTrait>,
    wallet_repository: Arc<dyn WalletRepositoryTrait>,
    valuation_service: Arc<dyn ValuationServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    locks: WalletLocks,
}

impl QuotaService {
    pub fn new(
        repository: Arc<dyn QuotaRepositoryTrait>,
        wallet_repository: Arc<dyn WalletRepositoryTrait>,
        valuation_service: Arc<dyn ValuationServiceTrait>,
    ) -> Self {
        Self {
            repository,
            wallet_repository,
            valuation_service,
            event_sink: Arc::new(NoOpDomainEventSink),
            locks: WalletLocks::new(),
        }
    }

    /// Sets the domain event sink for emitting ledger events.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    fn load_wallet(&self, wallet_id: &str) -> Result<Wallet> {
        self.wallet_repository.get_by_id(wallet_id).map_err(|e| {
            if e.is_not_found() {
                QuotaError::NotFound(format!("Wallet {}", wallet_id)).into()
            } else {
                e
            }
        })
    }

    /// Decides how the history cache absorbs a new movement. A movement that
    /// sorts last is appended; a backdated one forces a full replay, which
    /// also rejects withdrawals that would overdraw an earlier prefix.
    fn history_update_for(
        &self,
        wallet_id: &str,
        movement: &CashMovement,
        point: QuotaHistoryPoint,
    ) -> Result<HistoryUpdate> {
        let mut movements = self.repository.list_movements(wallet_id)?;
        let sorts_last = movements
            .iter()
            .all(|m| (m.timestamp, m.created_at) <= (movement.timestamp, movement.created_at));
        if sorts_last {
            return Ok(HistoryUpdate::Append(point));
        }

        debug!(
            "Movement {} is backdated before existing movements of wallet {}, replaying",
            movement.id, wallet_id
        );
        let mut cached = self.repository.list_history_points(wallet_id)?;
        movements.push(movement.clone());
        cached.push(point);
        let replay = replay_movements(wallet_id, &movements, &cached)?;
        Ok(HistoryUpdate::Replace(replay.history))
    }

    /// Replays `movements` and commits the result. Caller holds the lock.
    async fn commit_replay(
        &self,
        wallet_id: &str,
        movements: &[CashMovement],
        remove_movement_id: Option<String>,
    ) -> Result<Decimal> {
        let cached = self.repository.list_history_points(wallet_id)?;
        let replay = replay_movements(wallet_id, movements, &cached).map_err(|e| {
            debug!("Ledger replay for wallet {} rejected: {}", wallet_id, e);
            e
        })?;

        self.repository
            .commit_ledger_change(LedgerChange {
                wallet_id: wallet_id.to_string(),
                unit_quantity: replay.unit_quantity,
                initial_unit_value: None,
                insert_movement: None,
                remove_movement_id,
                history: HistoryUpdate::Replace(replay.history),
            })
            .await?;

        Ok(replay.unit_quantity)
    }
}

#[async_trait]
impl QuotaServiceTrait for QuotaService {
    async fn initialize_ledger(
        &self,
        wallet_id: &str,
        amount: Decimal,
        initial_unit_value: Option<Decimal>,
    ) -> Result<LedgerInitialization> {
        if amount <= Decimal::ZERO {
            return Err(QuotaError::InvalidAmount(amount).into());
        }

        let _guard = self.locks.acquire(wallet_id).await;
        let wallet = self.load_wallet(wallet_id)?;

        if wallet.unit_quantity > Decimal::ZERO {
            debug!(
                "Wallet {} already holds {} units, refusing to initialize",
                wallet_id, wallet.unit_quantity
            );
            return Err(QuotaError::AlreadyInitialized(wallet_id.to_string()).into());
        }

        let unit_value = initial_unit_value.unwrap_or(wallet.initial_unit_value);
        if unit_value <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Initial unit value must be greater than 0, got {}",
                unit_value
            ))));
        }

        let units = amount / unit_value;
        let now = Utc::now();
        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            wallet_id: wallet_id.to_string(),
            timestamp: now,
            movement_type: MovementType::In,
            amount,
            description: Some(INITIAL_MOVEMENT_DESCRIPTION.to_string()),
            unit_value_at_time: unit_value,
            units_issued: units,
            created_at: now,
        };
        let point = QuotaHistoryPoint {
            wallet_id: wallet_id.to_string(),
            movement_id: movement.id.clone(),
            timestamp: now,
            unit_value,
            unit_quantity: units,
            networth: amount,
        };
        let history = self.history_update_for(wallet_id, &movement, point)?;

        self.repository
            .commit_ledger_change(LedgerChange {
                wallet_id: wallet_id.to_string(),
                unit_quantity: units,
                initial_unit_value: Some(unit_value),
                insert_movement: Some(movement.clone()),
                remove_movement_id: None,
                history,
            })
            .await?;

        info!(
            "Initialized quota ledger of wallet {}: {} units at {}",
            wallet_id, units, unit_value
        );
        self.event_sink
            .emit(DomainEvent::ledger_initialized(wallet_id));

        Ok(LedgerInitialization {
            unit_value,
            unit_quantity: units,
            movement,
        })
    }

    async fn record_movement(&self, request: NewCashMovement) -> Result<RecordedMovement> {
        request.validate()?;

        let wallet_id = request.wallet_id.as_str();
        let _guard = self.locks.acquire(wallet_id).await;
        let wallet = self.load_wallet(wallet_id)?;

        let timestamp = request.timestamp.unwrap_or_else(Utc::now);
        let reference = self
            .valuation_service
            .latest_at_or_before(wallet_id, timestamp)?
            .ok_or_else(|| QuotaError::NoValuationData {
                wallet_id: wallet_id.to_string(),
                timestamp,
            })?;

        let pricing = price_movement(
            wallet.unit_quantity,
            wallet.initial_unit_value,
            request.movement_type,
            request.amount,
            reference.networth,
        )
        .map_err(|e| {
            debug!("Rejected '{}' movement for wallet {}: {}", request.movement_type, wallet_id, e);
            e
        })?;

        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            wallet_id: wallet_id.to_string(),
            timestamp,
            movement_type: request.movement_type,
            amount: request.amount,
            description: request.description,
            unit_value_at_time: pricing.unit_value,
            units_issued: pricing.units,
            created_at: Utc::now(),
        };
        let point = QuotaHistoryPoint {
            wallet_id: wallet_id.to_string(),
            movement_id: movement.id.clone(),
            timestamp,
            unit_value: pricing.unit_value,
            unit_quantity: pricing.new_quantity,
            networth: reference.networth,
        };
        let history = self.history_update_for(wallet_id, &movement, point)?;

        self.repository
            .commit_ledger_change(LedgerChange {
                wallet_id: wallet_id.to_string(),
                unit_quantity: pricing.new_quantity,
                initial_unit_value: None,
                insert_movement: Some(movement.clone()),
                remove_movement_id: None,
                history,
            })
            .await?;

        info!(
            "Recorded '{}' movement {} of {} for wallet {}: {} units at {}",
            movement.movement_type,
            movement.id,
            movement.amount,
            wallet_id,
            movement.units_issued,
            movement.unit_value_at_time
        );
        self.event_sink.emit(DomainEvent::movement_recorded(
            wallet_id,
            movement.id.clone(),
            movement.movement_type,
        ));

        Ok(RecordedMovement {
            movement,
            new_unit_quantity: pricing.new_quantity,
            current_unit_value: pricing.unit_value,
        })
    }

    async fn delete_movement(&self, wallet_id: &str, movement_id: &str) -> Result<()> {
        let _guard = self.locks.acquire(wallet_id).await;
        self.load_wallet(wallet_id)?;

        self.repository
            .get_movement(wallet_id, movement_id)
            .map_err(|e| -> Error {
                if e.is_not_found() {
                    QuotaError::NotFound(format!("Movement {}", movement_id)).into()
                } else {
                    e
                }
            })?;

        let remaining: Vec<CashMovement> = self
            .repository
            .list_movements(wallet_id)?
            .into_iter()
            .filter(|m| m.id != movement_id)
            .collect();

        let unit_quantity = self
            .commit_replay(wallet_id, &remaining, Some(movement_id.to_string()))
            .await?;

        info!(
            "Deleted movement {} of wallet {}, {} units outstanding",
            movement_id, wallet_id, unit_quantity
        );
        self.event_sink
            .emit(DomainEvent::movement_deleted(wallet_id, movement_id));
        Ok(())
    }

    async fn rebuild_ledger(&self, wallet_id: &str) -> Result<Decimal> {
        let _guard = self.locks.acquire(wallet_id).await;
        let wallet = self.load_wallet(wallet_id)?;

        let movements = self.repository.list_movements(wallet_id)?;
        let unit_quantity = self.commit_replay(wallet_id, &movements, None).await?;

        if unit_quantity != wallet.unit_quantity {
            warn!(
                "Rebuild of wallet {} corrected unit quantity from {} to {}",
                wallet_id, wallet.unit_quantity, unit_quantity
            );
        }
        self.event_sink.emit(DomainEvent::ledger_rebuilt(wallet_id));
        Ok(unit_quantity)
    }

    async fn get_history(&self, wallet_id: &str, days: i64, limit: usize) -> Result<QuotaHistory> {
        self.get_history_as_of(wallet_id, Utc::now(), days, limit)
            .await
    }

    async fn get_history_as_of(
        &self,
        wallet_id: &str,
        now: DateTime<Utc>,
        days: i64,
        limit: usize,
    ) -> Result<QuotaHistory> {
        let _guard = self.locks.acquire(wallet_id).await;
        let wallet = self.load_wallet(wallet_id)?;

        let since = hour_bucket(window_start(now, days));
        let mut points = self
            .valuation_service
            .get_merged_series_between(wallet_id, Some(since), None)?;
        points.truncate(limit);

        let movements = self.repository.list_movements(wallet_id)?;
        let series = build_quota_series(&points, &movements, wallet.initial_unit_value);

        let current_networth = self
            .valuation_service
            .latest_at_or_before(wallet_id, now)?
            .map_or(Decimal::ZERO, |p| p.networth);

        let metrics = compute_metrics(
            &series,
            &movements,
            current_networth,
            wallet.unit_quantity,
            wallet.initial_unit_value,
        );

        debug!(
            "Computed {} quota points for wallet {} since {}",
            series.len(),
            wallet_id,
            since
        );
        Ok(QuotaHistory { series, metrics })
    }

    fn get_movements(&self, wallet_id: &str) -> Result<Vec<CashMovement>> {
        self.load_wallet(wallet_id)?;
        let mut movements = self.repository.list_movements(wallet_id)?;
        ledger::sort_chronologically(&mut movements);
        movements.reverse();
        Ok(movements)
    }

    fn get_history_points(&self, wallet_id: &str) -> Result<Vec<QuotaHistoryPoint>> {
        self.load_wallet(wallet_id)?;
        self.repository.list_history_points(wallet_id)
    }
}
