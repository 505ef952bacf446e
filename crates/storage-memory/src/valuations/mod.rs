//! In-memory storage implementation for valuation observations.

mod repository;

pub use repository::ValuationRepository;

// Re-export trait from core for convenience
pub use walletquota_core::valuations::ValuationRepositoryTrait;
