//! Settings Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::settings::{ProcessingSettings, SettingsPatch, SettingsProvider};

/// GetSettings Handler - 返回当前设置（API key 已隐藏）
pub struct GetSettingsHandler {
    settings: Arc<SettingsProvider>,
}

impl GetSettingsHandler {
    pub fn new(settings: Arc<SettingsProvider>) -> Self {
        Self { settings }
    }

    pub fn handle(&self) -> Result<ProcessingSettings, ApplicationError> {
        Ok(self.settings.current()?.masked())
    }
}

/// UpdateSettings Handler - 部分更新设置
pub struct UpdateSettingsHandler {
    settings: Arc<SettingsProvider>,
}

impl UpdateSettingsHandler {
    pub fn new(settings: Arc<SettingsProvider>) -> Self {
        Self { settings }
    }

    pub fn handle(&self, patch: SettingsPatch) -> Result<ProcessingSettings, ApplicationError> {
        Ok(self.settings.update(patch)?.masked())
    }

    /// 恢复默认设置
    pub fn reset(&self) -> Result<ProcessingSettings, ApplicationError> {
        Ok(self.settings.reset()?.masked())
    }
}
