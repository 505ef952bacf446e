use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HISTORY_DAYS, DEFAULT_HISTORY_LIMIT, DEFAULT_INITIAL_UNIT_VALUE,
    DEFAULT_SYNC_INTERVAL_HOURS,
};

pub const SYNC_INTERVAL_HOURS_KEY: &str = "sync_interval_hours";
pub const DEFAULT_INITIAL_UNIT_VALUE_KEY: &str = "default_initial_unit_value";
pub const HISTORY_DAYS_KEY: &str = "history_days";
pub const HISTORY_LIMIT_KEY: &str = "history_limit";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub sync_interval_hours: u64,
    pub default_initial_unit_value: Decimal,
    pub history_days: i64,
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sync_interval_hours: DEFAULT_SYNC_INTERVAL_HOURS,
            default_initial_unit_value: DEFAULT_INITIAL_UNIT_VALUE,
            history_days: DEFAULT_HISTORY_DAYS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub sync_interval_hours: Option<u64>,
    pub default_initial_unit_value: Option<Decimal>,
    pub history_days: Option<i64>,
    pub history_limit: Option<usize>,
}
