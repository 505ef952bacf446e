use async_trait::async_trait;
use std::sync::Arc;

use crate::db::MemoryDb;
use crate::errors::StorageError;
use walletquota_core::errors::Result;
use walletquota_core::settings::SettingsRepositoryTrait;

pub struct SettingsRepository {
    db: Arc<MemoryDb>,
}

impl SettingsRepository {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        SettingsRepository { db }
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    fn get_setting(&self, setting_key: &str) -> Result<String> {
        self.db
            .read(|tables| tables.settings.get(setting_key).cloned())?
            .ok_or_else(|| StorageError::NotFound(format!("setting {}", setting_key)).into())
    }

    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()> {
        self.db.transaction(|tables| {
            tables
                .settings_mut()
                .insert(setting_key.to_string(), setting_value.to_string());
            Ok(())
        })
    }
}
