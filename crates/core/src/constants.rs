use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Unit price used to seed a ledger when the caller does not pick one.
pub const DEFAULT_INITIAL_UNIT_VALUE: Decimal = dec!(1.0);

/// Default lookback window (days) for history queries
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Default maximum number of points returned by history queries
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default interval between automatic wallet syncs
pub const DEFAULT_SYNC_INTERVAL_HOURS: u64 = 12;

/// Longest accepted interval between automatic wallet syncs (one year)
pub const MAX_SYNC_INTERVAL_HOURS: u64 = 24 * 365;

/// Description attached to the movement created by ledger initialization
pub const INITIAL_MOVEMENT_DESCRIPTION: &str = "Initial investment";
