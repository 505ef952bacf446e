//! The shared in-memory database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use walletquota_core::errors::Result;
use walletquota_core::quota::{CashMovement, QuotaHistoryPoint};
use walletquota_core::valuations::ValuationObservation;
use walletquota_core::wallets::Wallet;

use crate::errors::StorageError;

/// Every table of the store.
///
/// Tables are shared behind `Arc`s so staging a transaction is cheap; a table
/// is copied only when the transaction first writes to it.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub wallets: Arc<BTreeMap<String, Wallet>>,
    pub observations: Arc<Vec<ValuationObservation>>,
    pub movements: Arc<Vec<CashMovement>>,
    pub history: Arc<Vec<QuotaHistoryPoint>>,
    pub settings: Arc<HashMap<String, String>>,
}

impl Tables {
    pub fn wallets_mut(&mut self) -> &mut BTreeMap<String, Wallet> {
        Arc::make_mut(&mut self.wallets)
    }

    pub fn observations_mut(&mut self) -> &mut Vec<ValuationObservation> {
        Arc::make_mut(&mut self.observations)
    }

    pub fn movements_mut(&mut self) -> &mut Vec<CashMovement> {
        Arc::make_mut(&mut self.movements)
    }

    pub fn history_mut(&mut self) -> &mut Vec<QuotaHistoryPoint> {
        Arc::make_mut(&mut self.history)
    }

    pub fn settings_mut(&mut self) -> &mut HashMap<String, String> {
        Arc::make_mut(&mut self.settings)
    }
}

/// In-memory database shared by all repositories.
///
/// Reads run concurrently; writes are serialized and transactional.
#[derive(Debug, Default)]
pub struct MemoryDb {
    tables: RwLock<Tables>,
}

impl MemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T> {
        let tables = self.tables.read().map_err(StorageError::from)?;
        Ok(f(&tables))
    }

    /// Runs `f` against a staged copy of the tables and publishes the copy
    /// only if `f` succeeds. Only the tables `f` writes to are duplicated.
    pub fn transaction<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = self.tables.write().map_err(StorageError::from)?;
        let mut staged = tables.clone();
        let value = f(&mut staged)?;
        *tables = staged;
        Ok(value)
    }
}
