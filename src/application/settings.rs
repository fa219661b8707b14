//! Processing Settings - 持久化的处理设置
//!
//! 每个字段单独存储（key = 字段名，value = JSON），未保存的字段回落到配置默认值

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

use crate::application::error::ApplicationError;
use crate::application::ports::{SettingsError, SettingsStorePort};
use crate::domain::{mask_secret, ApiCredentials, ProcessingConfig, SplitStrategy, SplitType};

/// 处理设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSettings {
    pub api_key: String,
    pub api_base_url: String,
    pub split_type: SplitType,
    pub split_length: usize,
    pub split_char: String,
    pub lines_per_segment: usize,
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ProcessingSettings {
    /// 转换为运行配置并校验
    pub fn to_processing_config(&self) -> Result<ProcessingConfig, ApplicationError> {
        if self.model.trim().is_empty() {
            return Err(ApplicationError::config("模型不能为空"));
        }
        if self.max_tokens == 0 {
            return Err(ApplicationError::config("max_tokens 必须大于 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ApplicationError::config("temperature 必须在 0 到 2 之间"));
        }

        let config = ProcessingConfig {
            split: SplitStrategy::from_settings(
                self.split_type,
                self.split_length,
                &self.split_char,
                self.lines_per_segment,
            ),
            system_prompt: self.system_prompt.clone(),
            user_prompt: self.user_prompt.clone(),
            model: self.model.trim().to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            credentials: ApiCredentials::new(self.api_key.trim(), self.api_base_url.trim()),
        };
        config.validate()?;
        Ok(config)
    }

    /// 用于展示的副本，API key 被隐藏
    pub fn masked(&self) -> Self {
        Self {
            api_key: mask_secret(&self.api_key),
            ..self.clone()
        }
    }

    /// 应用部分更新
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.api_key {
            self.api_key = v;
        }
        if let Some(v) = patch.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = patch.split_type {
            self.split_type = v;
        }
        if let Some(v) = patch.split_length {
            self.split_length = v;
        }
        if let Some(v) = patch.split_char {
            self.split_char = v;
        }
        if let Some(v) = patch.lines_per_segment {
            self.lines_per_segment = v;
        }
        if let Some(v) = patch.system_prompt {
            self.system_prompt = v;
        }
        if let Some(v) = patch.user_prompt {
            self.user_prompt = v;
        }
        if let Some(v) = patch.model {
            self.model = v;
        }
        if let Some(v) = patch.max_tokens {
            self.max_tokens = v;
        }
        if let Some(v) = patch.temperature {
            self.temperature = v;
        }
    }
}

/// 设置的部分更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub split_type: Option<SplitType>,
    pub split_length: Option<usize>,
    pub split_char: Option<String>,
    pub lines_per_segment: Option<usize>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// 设置读写：存储中的字段覆盖默认值
///
/// 只保存用户修改过的字段，其余字段始终跟随配置默认值
pub struct SettingsProvider {
    store: Arc<dyn SettingsStorePort>,
    defaults: ProcessingSettings,
    /// 串行化 update / reset 的读改写
    write_lock: Mutex<()>,
}

fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, SettingsError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SettingsError::SerializationError(
            "settings must serialize to an object".to_string(),
        )),
        Err(e) => Err(SettingsError::SerializationError(e.to_string())),
    }
}

impl SettingsProvider {
    pub fn new(store: Arc<dyn SettingsStorePort>, defaults: ProcessingSettings) -> Self {
        Self {
            store,
            defaults,
            write_lock: Mutex::new(()),
        }
    }

    /// 读取当前设置，无法解析的字段单独回落到默认值
    pub fn current(&self) -> Result<ProcessingSettings, ApplicationError> {
        let defaults = to_fields(&self.defaults)?;
        let mut fields = defaults.clone();

        for (key, default_value) in &defaults {
            let Some(raw) = self.store.get(key)? else {
                continue;
            };
            let stored = match serde_json::from_str::<Value>(&raw) {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Ignoring unreadable setting");
                    continue;
                }
            };

            fields.insert(key.clone(), stored);
            if let Err(e) = serde_json::from_value::<ProcessingSettings>(Value::Object(fields.clone())) {
                tracing::warn!(key = %key, error = %e, "Ignoring invalid setting");
                fields.insert(key.clone(), default_value.clone());
            }
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| ApplicationError::internal(e.to_string()))
    }

    /// 应用部分更新并保存，无效的设置不会被写入
    pub fn update(&self, patch: SettingsPatch) -> Result<ProcessingSettings, ApplicationError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ApplicationError::internal("settings lock poisoned"))?;

        let changed = to_fields(&patch)?;
        let mut settings = self.current()?;
        settings.apply(patch);
        settings.to_processing_config()?;

        for (key, value) in changed {
            if !value.is_null() {
                self.store.set(&key, &value.to_string())?;
            }
        }

        tracing::info!(
            model = %settings.model,
            split_type = settings.split_type.as_str(),
            "Settings updated"
        );
        Ok(settings)
    }

    /// 删除所有已保存的字段，恢复默认值
    pub fn reset(&self) -> Result<ProcessingSettings, ApplicationError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ApplicationError::internal("settings lock poisoned"))?;

        for key in to_fields(&self.defaults)?.keys() {
            self.store.remove(key)?;
        }
        Ok(self.defaults.clone())
    }
}
