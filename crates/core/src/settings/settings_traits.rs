//! Repository traits for settings.

use async_trait::async_trait;

use crate::errors::Result;

/// Key-value store for engine settings.
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    /// Get a single setting value by key.
    ///
    /// Returns `DatabaseError::NotFound` when the key was never set.
    fn get_setting(&self, setting_key: &str) -> Result<String>;

    /// Insert or update a single setting.
    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()>;
}
