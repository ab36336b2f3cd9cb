use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Port over the session-scoped slot the cart persists into. Reads and
/// writes are synchronous and capacity-bounded, like the browser storage
/// this stands in for; the cart engine treats every failure as
/// non-fatal.
pub trait StoragePort: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Default per-session quota; generous for a cart blob, small enough to
/// bound what an abusive session can pin in memory.
pub const DEFAULT_QUOTA_BYTES: usize = 64 * 1024;

/// In-memory storage slot, one per session. Dropped with the session,
/// which is what clears the cart when the session ends.
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
    quota_bytes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            quota_bytes,
        }
    }

    fn used_bytes_without(&self, slots: &HashMap<String, String>, key: &str) -> usize {
        slots
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let used = self.used_bytes_without(&slots, key);
        if used + key.len() + value.len() > self.quota_bytes {
            return Err(StorageError::QuotaExceeded);
        }
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.remove(key);
        Ok(())
    }
}
