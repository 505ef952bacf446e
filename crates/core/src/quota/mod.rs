//! Quota ledger: unitized accounting of a wallet's deposits and withdrawals.
//!
//! Each wallet is a pool divided into units. Deposits issue units and
//! withdrawals redeem them at the unit value prevailing at the time, so the
//! unit value tracks performance independently of cash flows.

pub mod ledger;
mod ledger_locks;
mod quota_errors;
mod quota_model;
mod quota_service;
mod quota_traits;


pub use ledger_locks::{WalletGuard, WalletLocks};
pub use quota_errors::QuotaError;
pub use quota_model::*;
pub use quota_service::QuotaService;
pub use quota_traits::{QuotaRepositoryTrait, QuotaServiceTrait};
