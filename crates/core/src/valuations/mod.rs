//! Valuations module - net worth observations and the merged timeline.
//!
//! Automatic (synced) and manual (backfilled) observations are bucketed by
//! hour and merged into one series per wallet, with automatic data winning
//! every conflict. Several wallets can be combined into a forward-filled
//! total.

mod timeline;
mod valuations_model;
mod valuations_service;
mod valuations_traits;



pub use timeline::{
    aggregate_series, aggregate_stats, latest_at_or_before, merge_mixed, merge_observations,
};
pub use valuations_model::*;
pub use valuations_service::ValuationService;
pub use valuations_traits::{ValuationRepositoryTrait, ValuationServiceTrait};
