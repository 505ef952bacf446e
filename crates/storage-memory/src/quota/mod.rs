//! In-memory storage implementation for the quota ledger.

mod repository;

pub use repository::QuotaRepository;

// Re-export trait from core for convenience
pub use walletquota_core::quota::QuotaRepositoryTrait;
