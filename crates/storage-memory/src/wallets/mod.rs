//! In-memory storage implementation for wallets.

mod repository;

pub use repository::WalletRepository;

// Re-export trait from core for convenience
pub use walletquota_core::wallets::WalletRepositoryTrait;
