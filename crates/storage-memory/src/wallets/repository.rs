use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::MemoryDb;
use crate::errors::StorageError;
use walletquota_core::errors::Result;
use walletquota_core::wallets::{NewWallet, Wallet, WalletRepositoryTrait};

pub struct WalletRepository {
    db: Arc<MemoryDb>,
}

impl WalletRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        WalletRepository { db }
    }
}

#[async_trait]
impl WalletRepositoryTrait for WalletRepository {
    async fn create(&self, new_wallet: NewWallet) -> Result<Wallet> {
        new_wallet.validate()?;

        let wallet = Wallet {
            id: new_wallet
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            address: new_wallet.address,
            name: new_wallet.name,
            initial_unit_value: new_wallet.initial_unit_value,
            unit_quantity: Decimal::ZERO,
            created_at: Utc::now(),
            last_synced_at: None,
        };

        self.db.transaction(|tables| {
            if tables.wallets.contains_key(&wallet.id) {
                return Err(StorageError::UniqueViolation(format!("wallet {}", wallet.id)).into());
            }
            tables.wallets_mut().insert(wallet.id.clone(), wallet.clone());
            Ok(())
        })?;

        Ok(wallet)
    }

    fn get_by_id(&self, wallet_id: &str) -> Result<Wallet> {
        self.db
            .read(|tables| tables.wallets.get(wallet_id).cloned())?
            .ok_or_else(|| StorageError::NotFound(format!("wallet {}", wallet_id)).into())
    }

    fn list(&self, wallet_ids: Option<&[String]>) -> Result<Vec<Wallet>> {
        self.db.read(|tables| match wallet_ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| tables.wallets.get(id).cloned())
                .collect(),
            None => tables.wallets.values().cloned().collect(),
        })
    }

    async fn mark_synced(&self, wallet_id: &str, synced_at: DateTime<Utc>) -> Result<()> {
        self.db.transaction(|tables| {
            let wallet = tables
                .wallets_mut()
                .get_mut(wallet_id)
                .ok_or_else(|| StorageError::NotFound(format!("wallet {}", wallet_id)))?;
            wallet.last_synced_at = Some(synced_at);
            Ok(())
        })
    }
}
