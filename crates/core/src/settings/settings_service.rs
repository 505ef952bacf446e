use super::settings_model::{
    DEFAULT_INITIAL_UNIT_VALUE_KEY, HISTORY_DAYS_KEY, HISTORY_LIMIT_KEY, SYNC_INTERVAL_HOURS_KEY,
};
use super::SettingsRepositoryTrait;
use crate::errors::{DatabaseError, Error, Result};
use crate::settings::{Settings, SettingsUpdate};
use crate::sync::{interval_from_hours, SyncScheduler};
use async_trait::async_trait;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    fn get_settings(&self) -> Result<Settings>;

    async fn update_settings(&self, new_settings: &SettingsUpdate) -> Result<()>;

    fn get_sync_interval_hours(&self) -> Result<u64>;

    fn get_default_initial_unit_value(&self) -> Result<Decimal>;

    fn get_history_days(&self) -> Result<i64>;

    fn get_history_limit(&self) -> Result<usize>;

    /// Get a single setting value by key. Returns None if not found.
    fn get_setting_value(&self, key: &str) -> Result<Option<String>>;

    /// Set a single setting value by key. Known keys are validated.
    async fn set_setting_value(&self, key: &str, value: &str) -> Result<()>;
}

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
    scheduler: Option<Arc<SyncScheduler>>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        SettingsService {
            settings_repository,
            scheduler: None,
        }
    }

    /// Reconfigures this scheduler whenever the sync interval changes.
    pub fn with_scheduler(mut self, scheduler: Arc<SyncScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    fn parsed_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.settings_repository.get_setting(key) {
            Ok(value) => Ok(value.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring unparsable value '{}' for setting {}", value, key);
                default
            })),
            Err(Error::Database(DatabaseError::NotFound(_))) => Ok(default),
            Err(e) => Err(e),
        }
    }

    async fn update_sync_interval(&self, hours: u64) -> Result<()> {
        let period = interval_from_hours(hours)?;
        self.settings_repository
            .update_setting(SYNC_INTERVAL_HOURS_KEY, &hours.to_string())
            .await?;

        if let Some(scheduler) = &self.scheduler {
            if scheduler.is_running().await {
                scheduler.reconfigure(period).await?;
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, value: impl std::fmt::Display) -> Error {
    Error::InvalidConfigValue(format!("Invalid value '{}' for setting {}", value, key))
}

fn validate(key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    let valid = match key {
        SYNC_INTERVAL_HOURS_KEY => value
            .parse::<u64>()
            .is_ok_and(|v| interval_from_hours(v).is_ok()),
        DEFAULT_INITIAL_UNIT_VALUE_KEY => {
            Decimal::from_str(value).is_ok_and(|v| v > Decimal::ZERO)
        }
        HISTORY_DAYS_KEY => value.parse::<i64>().is_ok_and(|v| v > 0),
        HISTORY_LIMIT_KEY => value.parse::<usize>().is_ok_and(|v| v > 0),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(invalid(key, value))
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_settings(&self) -> Result<Settings> {
        Ok(Settings {
            sync_interval_hours: self.get_sync_interval_hours()?,
            default_initial_unit_value: self.get_default_initial_unit_value()?,
            history_days: self.get_history_days()?,
            history_limit: self.get_history_limit()?,
        })
    }

    async fn update_settings(&self, new_settings: &SettingsUpdate) -> Result<()> {
        // Validate everything first so a bad field leaves all settings untouched.
        if let Some(hours) = new_settings.sync_interval_hours {
            validate(SYNC_INTERVAL_HOURS_KEY, &hours.to_string())?;
        }
        if let Some(value) = new_settings.default_initial_unit_value {
            validate(DEFAULT_INITIAL_UNIT_VALUE_KEY, &value.to_string())?;
        }
        if let Some(days) = new_settings.history_days {
            validate(HISTORY_DAYS_KEY, &days.to_string())?;
        }
        if let Some(limit) = new_settings.history_limit {
            validate(HISTORY_LIMIT_KEY, &limit.to_string())?;
        }

        if let Some(value) = new_settings.default_initial_unit_value {
            self.settings_repository
                .update_setting(DEFAULT_INITIAL_UNIT_VALUE_KEY, &value.to_string())
                .await?;
        }
        if let Some(days) = new_settings.history_days {
            self.settings_repository
                .update_setting(HISTORY_DAYS_KEY, &days.to_string())
                .await?;
        }
        if let Some(limit) = new_settings.history_limit {
            self.settings_repository
                .update_setting(HISTORY_LIMIT_KEY, &limit.to_string())
                .await?;
        }

        let current_interval = self.get_sync_interval_hours()?;
        if let Some(hours) = new_settings.sync_interval_hours {
            if hours != current_interval {
                debug!(
                    "Sync interval changed from {}h to {}h",
                    current_interval, hours
                );
                self.update_sync_interval(hours).await?;
            }
        }
        Ok(())
    }

    fn get_sync_interval_hours(&self) -> Result<u64> {
        self.parsed_or(SYNC_INTERVAL_HOURS_KEY, Settings::default().sync_interval_hours)
    }

    fn get_default_initial_unit_value(&self) -> Result<Decimal> {
        self.parsed_or(
            DEFAULT_INITIAL_UNIT_VALUE_KEY,
            Settings::default().default_initial_unit_value,
        )
    }

    fn get_history_days(&self) -> Result<i64> {
        self.parsed_or(HISTORY_DAYS_KEY, Settings::default().history_days)
    }

    fn get_history_limit(&self) -> Result<usize> {
        self.parsed_or(HISTORY_LIMIT_KEY, Settings::default().history_limit)
    }

    fn get_setting_value(&self, key: &str) -> Result<Option<String>> {
        match self.settings_repository.get_setting(key) {
            Ok(value) => Ok(Some(value)),
            Err(Error::Database(DatabaseError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_setting_value(&self, key: &str, value: &str) -> Result<()> {
        validate(key, value)?;
        if key == SYNC_INTERVAL_HOURS_KEY {
            let hours = value.trim().parse().map_err(|_| invalid(key, value))?;
            return self.update_sync_interval(hours).await;
        }
        self.settings_repository.update_setting(key, value).await
    }
}
