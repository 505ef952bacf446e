//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::quota::MovementType;

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about ledger and valuation changes. Hosts
/// translate them into their own actions (cache invalidation, notifications,
/// audit logs).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A wallet's ledger was seeded with its first units.
    LedgerInitialized { wallet_id: String },

    /// A cash movement was recorded against a wallet.
    MovementRecorded {
        wallet_id: String,
        movement_id: String,
        movement_type: MovementType,
    },

    /// A cash movement was removed and the ledger replayed.
    MovementDeleted {
        wallet_id: String,
        movement_id: String,
    },

    /// A wallet's unit quantity and quota history were recomputed from its
    /// movements.
    LedgerRebuilt { wallet_id: String },

    /// Observations were added, corrected or removed.
    ValuationsChanged { wallet_ids: Vec<String> },

    /// A sync run finished.
    WalletsSynced {
        wallet_ids: Vec<String>,
        failed: usize,
    },
}

impl DomainEvent {
    /// Creates a LedgerInitialized event.
    pub fn ledger_initialized(wallet_id: impl Into<String>) -> Self {
        Self::LedgerInitialized {
            wallet_id: wallet_id.into(),
        }
    }

    /// Creates a MovementRecorded event.
    pub fn movement_recorded(
        wallet_id: impl Into<String>,
        movement_id: impl Into<String>,
        movement_type: MovementType,
    ) -> Self {
        Self::MovementRecorded {
            wallet_id: wallet_id.into(),
            movement_id: movement_id.into(),
            movement_type,
        }
    }

    /// Creates a MovementDeleted event.
    pub fn movement_deleted(wallet_id: impl Into<String>, movement_id: impl Into<String>) -> Self {
        Self::MovementDeleted {
            wallet_id: wallet_id.into(),
            movement_id: movement_id.into(),
        }
    }

    /// Creates a LedgerRebuilt event.
    pub fn ledger_rebuilt(wallet_id: impl Into<String>) -> Self {
        Self::LedgerRebuilt {
            wallet_id: wallet_id.into(),
        }
    }

    /// Creates a ValuationsChanged event.
    pub fn valuations_changed(wallet_ids: Vec<String>) -> Self {
        Self::ValuationsChanged { wallet_ids }
    }

    /// Creates a WalletsSynced event.
    pub fn wallets_synced(wallet_ids: Vec<String>, failed: usize) -> Self {
        Self::WalletsSynced { wallet_ids, failed }
    }
}
