//! Wallet Quota Core - Domain entities, services, and traits.
//!
//! This crate contains the quota accounting engine: valuation timelines,
//! the unitized cash-flow ledger and sync scheduling. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-memory` crate or by a host-provided store.

pub mod constants;
pub mod errors;
pub mod events;
pub mod quota;
pub mod settings;
pub mod sync;
pub mod utils;
pub mod valuations;
pub mod wallets;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
