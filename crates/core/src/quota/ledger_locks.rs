//! Per-wallet ledger locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// One async mutex per wallet, created on first use and dropped again once
/// nobody holds or waits for it.
///
/// Holding the guard gives exclusive access to that wallet's ledger for the
/// whole read-compute-commit cycle, including across `.await` points.
#[derive(Default)]
pub struct WalletLocks {
    locks: Arc<LockTable>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, wallet_id: &str) -> WalletGuard {
        let lock = self
            .locks
            .entry(wallet_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        WalletGuard {
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
            wallet_id: wallet_id.to_string(),
        }
    }
}

/// Exclusive access to one wallet's ledger, released on drop.
pub struct WalletGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
    wallet_id: String,
}

impl Drop for WalletGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The table's own reference is the last one: no holder, no waiter.
        self.locks
            .remove_if(self.wallet_id.as_str(), |_, lock| Arc::strong_count(lock) == 1);
    }
}
