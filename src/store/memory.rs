//! In-memory store
//!
//! HashMap behind a RwLock, with the same truncation rules as the file store.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;

use super::{pad, unpad, Store, StoreLayout};

/// Volatile [`Store`] used by tests and benchmarks
#[derive(Default)]
pub struct MemoryStore {
    layout: StoreLayout,
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store with the default layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store truncating to `layout`
    pub fn with_layout(layout: StoreLayout) -> Self {
        Self {
            layout,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn normalize_key(&self, key: &[u8]) -> Vec<u8> {
        unpad(&pad(key, self.layout.key_size as usize)).to_vec()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let key = self.normalize_key(key);
        Ok(self.data.read().get(&key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let key = self.normalize_key(key);
        let value = unpad(&pad(value, self.layout.value_size as usize)).to_vec();
        self.data.write().insert(key, value);
        Ok(())
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}
