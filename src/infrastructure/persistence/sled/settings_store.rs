//! Sled-based Settings Store

use sled::Db;
use std::path::Path;

use super::open_db;
use crate::application::ports::{SettingsError, SettingsStorePort};

const SETTINGS_PREFIX: &str = "settings:";

/// Sled 设置存储
pub struct SledSettingsStore {
    db: Db,
}

impl SledSettingsStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let db = open_db(path).map_err(|e| SettingsError::DatabaseError(e.to_string()))?;
        Ok(Self::new(db))
    }

    fn key(key: &str) -> String {
        format!("{}{}", SETTINGS_PREFIX, key)
    }
}

impl SettingsStorePort for SledSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        match self.db.get(Self::key(key)) {
            Ok(Some(data)) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| SettingsError::SerializationError(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(SettingsError::DatabaseError(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.db
            .insert(Self::key(key), value.as_bytes())
            .map_err(|e| SettingsError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.db
            .remove(Self::key(key))
            .map_err(|e| SettingsError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
