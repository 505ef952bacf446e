//! In-memory storage implementation for the wallet quota engine.
//!
//! Implements every repository trait defined in `walletquota-core` on top of
//! a single [`MemoryDb`]. All writes go through one transaction primitive, so
//! a ledger commit either lands completely or not at all.
//!
//! ```text
//!   core services
//!         │
//!         ▼
//!  storage-memory (this crate)
//!         │
//!         ▼
//!  MemoryDb (RwLock<Tables>)
//! ```

pub mod db;
pub mod errors;

// Repository implementations
pub mod quota;
pub mod settings;
pub mod valuations;
pub mod wallets;

pub use db::MemoryDb;
pub use errors::StorageError;

pub use quota::QuotaRepository;
pub use settings::SettingsRepository;
pub use valuations::ValuationRepository;
pub use wallets::WalletRepository;

// Re-export from walletquota-core for convenience
pub use walletquota_core::errors::{DatabaseError, Error, Result};
