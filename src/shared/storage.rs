use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;
use redb::{Database, TableDefinition};
use serde_json::Value;

use super::error::{AppError, AppResult};

/// Redb table holding the front end's key-value store.
/// Key: item name, Value: serialized JSON document
const STORAGE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("converter_storage");

/// Well-known keys written by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    ExchangeRates,
    SelectedTimeInterval,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::ExchangeRates => "exchangeRates",
            StorageKey::SelectedTimeInterval => "selectedTimeInterval",
        }
    }
}

/// Key-value persistence boundary.
///
/// `set_object` overwrites the whole value; there is no partial update.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> AppResult<Option<Value>>;
    fn set_object(&self, key: &str, value: &Value) -> AppResult<()>;
}

/// Redb-based storage implementation
pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    /// Open the store in the platform data directory.
    pub fn new() -> AppResult<Self> {
        let proj_dirs = ProjectDirs::from("com", "antigravity", "currency-converter")
            .ok_or_else(|| AppError::Storage("Failed to get project directories".to_string()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .map_err(|e| AppError::Storage(format!("Failed to create data directory: {}", e)))?;

        Self::open(&data_dir.join("converter_storage.redb"))
    }

    pub fn open(path: &Path) -> AppResult<Self> {
        let db = Database::create(path)
            .map_err(|e| AppError::Storage(format!("Failed to create database: {}", e)))?;

        // Initialize table so reads never see a missing table
        {
            let write_txn = db.begin_write()
                .map_err(|e| AppError::Storage(format!("Failed to begin write transaction: {}", e)))?;
            {
                let _table = write_txn.open_table(STORAGE_TABLE)
                    .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;
            }
            write_txn.commit()
                .map_err(|e| AppError::Storage(format!("Failed to commit transaction: {}", e)))?;
        }

        log::info!("[Storage] Opened {}", path.display());
        Ok(Self { db })
    }
}

impl Storage for RedbStorage {
    fn get_item(&self, key: &str) -> AppResult<Option<Value>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| AppError::Storage(format!("Failed to begin read: {}", e)))?;

        let table = read_txn.open_table(STORAGE_TABLE)
            .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

        let Some(raw) = table.get(key)
            .map_err(|e| AppError::Storage(format!("Failed to read entry: {}", e)))?
        else {
            return Ok(None);
        };

        let value = serde_json::from_str(raw.value())
            .map_err(|e| AppError::Storage(format!("Deserialization error: {}", e)))?;
        Ok(Some(value))
    }

    fn set_object(&self, key: &str, value: &Value) -> AppResult<()> {
        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::Storage(format!("Serialization error: {}", e)))?;

        let write_txn = self.db.begin_write()
            .map_err(|e| AppError::Storage(format!("Failed to begin write: {}", e)))?;

        {
            let mut table = write_txn.open_table(STORAGE_TABLE)
                .map_err(|e| AppError::Storage(format!("Failed to open table: {}", e)))?;

            table.insert(key, serialized.as_str())
                .map_err(|e| AppError::Storage(format!("Failed to insert: {}", e)))?;
        }

        write_txn.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit: {}", e)))?;

        Ok(())
    }
}

/// In-memory storage, used in tests and when the database cannot be opened.
#[derive(Default)]
pub struct InMemoryStorage {
    items: Mutex<HashMap<String, Value>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn get_item(&self, key: &str) -> AppResult<Option<Value>> {
        let items = self.items.lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        Ok(items.get(key).cloned())
    }

    fn set_object(&self, key: &str, value: &Value) -> AppResult<()> {
        let mut items = self.items.lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        items.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Open the on-disk store, falling back to memory if that fails.
pub fn open_default_storage() -> Arc<dyn Storage> {
    match RedbStorage::new() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            log::warn!("[Storage] Failed to initialize database: {}, using in-memory fallback", e);
            Arc::new(InMemoryStorage::new())
        }
    }
}
