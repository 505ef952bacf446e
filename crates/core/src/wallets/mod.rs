//! Wallets module - domain models and repository trait.

mod wallets_model;
mod wallets_traits;


pub use wallets_model::{LedgerState, NewWallet, Wallet};
pub use wallets_traits::WalletRepositoryTrait;
