//! Store Module
//!
//! Persistent key-value engine behind the reader/writer gate.
//!
//! ## Responsibilities
//! - Point lookups and in-place overwrites of fixed-size records
//! - A single database file, opened once and closed once per process
//! - Internal locking of its own file handle only; reader/writer exclusion
//!   across requests is the engine's job
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │ Header (bincode, fixed size)                   │
//! │ ┌──────────┬──────────┬─────────┬────────────┐ │
//! │ │Magic (4) │Version(2)│ Buckets │ Key/Val sz │ │
//! │ └──────────┴──────────┴─────────┴────────────┘ │
//! ├────────────────────────────────────────────────┤
//! │ Hash table 1: (buckets + 1) × u64 offsets      │
//! │   last slot → offset of hash table 2 (0: none) │
//! ├────────────────────────────────────────────────┤
//! │ Records: key (key_size) + value (value_size)   │
//! │ ... interleaved with further hash tables       │
//! └────────────────────────────────────────────────┘
//! ```

mod hash;
mod memory;

pub use hash::{HashStore, StoreHeader, MAGIC, VERSION};
pub use memory::MemoryStore;

use crate::error::Result;

/// The operations the server needs from a storage engine
pub trait Store: Send + Sync + 'static {
    /// Look up `key`
    ///
    /// Returns `Ok(None)` when the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite `key`
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Flush and release the store
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// How to treat a missing database file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file if it does not exist
    Create,

    /// Fail if the file does not exist
    Existing,
}

/// Fixed geometry of a store, chosen when the file is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLayout {
    pub hash_buckets: u64,
    pub key_size: u64,
    pub value_size: u64,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            hash_buckets: 1024,
            key_size: 128,
            value_size: 1024,
        }
    }
}

/// Cut `data` to `size` bytes and zero-pad the rest
pub(crate) fn pad(data: &[u8], size: usize) -> Vec<u8> {
    let mut padded = vec![0u8; size];
    let len = data.len().min(size);
    padded[..len].copy_from_slice(&data[..len]);
    padded
}

/// Drop the zero padding written by [`pad`]
pub(crate) fn unpad(data: &[u8]) -> &[u8] {
    let end = data.iter().position(|b| *b == 0).unwrap_or(data.len());
    &data[..end]
}
