use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::MemoryDb;
use crate::errors::StorageError;
use walletquota_core::errors::Result;
use walletquota_core::quota::{
    CashMovement, HistoryUpdate, LedgerChange, QuotaHistoryPoint, QuotaRepositoryTrait,
};

pub struct QuotaRepository {
    db: Arc<MemoryDb>,
}

impl QuotaRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        QuotaRepository { db }
    }
}

#[async_trait]
impl QuotaRepositoryTrait for QuotaRepository {
    fn list_movements(&self, wallet_id: &str) -> Result<Vec<CashMovement>> {
        let mut movements: Vec<CashMovement> = self.db.read(|tables| {
            tables
                .movements
                .iter()
                .filter(|m| m.wallet_id == wallet_id)
                .cloned()
                .collect()
        })?;
        movements.sort_by_key(|m| (m.timestamp, m.created_at));
        Ok(movements)
    }

    fn get_movement(&self, wallet_id: &str, movement_id: &str) -> Result<CashMovement> {
        self.db
            .read(|tables| {
                tables
                    .movements
                    .iter()
                    .find(|m| m.id == movement_id && m.wallet_id == wallet_id)
                    .cloned()
            })?
            .ok_or_else(|| StorageError::NotFound(format!("movement {}", movement_id)).into())
    }

    fn list_history_points(&self, wallet_id: &str) -> Result<Vec<QuotaHistoryPoint>> {
        let mut points: Vec<QuotaHistoryPoint> = self.db.read(|tables| {
            tables
                .history
                .iter()
                .filter(|p| p.wallet_id == wallet_id)
                .cloned()
                .collect()
        })?;
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    async fn commit_ledger_change(&self, change: LedgerChange) -> Result<()> {
        let wallet_id = change.wallet_id.clone();

        self.db.transaction(move |tables| {
            if change.unit_quantity < Decimal::ZERO {
                return Err(StorageError::CheckViolation(format!(
                    "unit_quantity >= 0 (got {})",
                    change.unit_quantity
                ))
                .into());
            }

            let wallet = tables
                .wallets_mut()
                .get_mut(&change.wallet_id)
                .ok_or_else(|| StorageError::NotFound(format!("wallet {}", change.wallet_id)))?;
            wallet.unit_quantity = change.unit_quantity;
            if let Some(value) = change.initial_unit_value {
                wallet.initial_unit_value = value;
            }

            if let Some(movement_id) = &change.remove_movement_id {
                let position = tables
                    .movements
                    .iter()
                    .position(|m| &m.id == movement_id && m.wallet_id == change.wallet_id)
                    .ok_or_else(|| StorageError::NotFound(format!("movement {}", movement_id)))?;
                tables.movements_mut().remove(position);
            }

            if let Some(movement) = change.insert_movement {
                if tables.movements.iter().any(|m| m.id == movement.id) {
                    return Err(
                        StorageError::UniqueViolation(format!("movement {}", movement.id)).into(),
                    );
                }
                tables.movements_mut().push(movement);
            }

            match change.history {
                HistoryUpdate::Append(point) => tables.history_mut().push(point),
                HistoryUpdate::Replace(points) => {
                    let history = tables.history_mut();
                    history.retain(|p| p.wallet_id != change.wallet_id);
                    history.extend(points);
                }
            }
            Ok(())
        })?;

        debug!("Committed ledger change for wallet {}", wallet_id);
        Ok(())
    }
}
