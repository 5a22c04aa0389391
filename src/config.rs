//! Configuration for mtkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};
use crate::store::StoreLayout;

/// Main configuration for an mtkv server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the single hash table file
    pub db_path: PathBuf,

    /// Number of buckets per hash table page (fixed at creation)
    pub hash_buckets: usize,

    /// Maximum key size in bytes; longer keys are truncated
    pub max_key_size: usize,

    /// Maximum value size in bytes; longer values are truncated
    pub max_value_size: usize,

    // -------------------------------------------------------------------------
    // Concurrency Configuration
    // -------------------------------------------------------------------------
    /// Number of worker threads serving requests
    pub worker_threads: usize,

    /// Capacity of the pending connection queue
    pub queue_capacity: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Largest request frame accepted (payload bytes)
    pub max_frame_size: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("mydb.db"),
            hash_buckets: 1024,
            max_key_size: 128,
            max_value_size: 1024,
            worker_threads: 8,
            queue_capacity: 100,
            listen_addr: "0.0.0.0:6767".to_string(),
            max_frame_size: 64 * 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Store geometry derived from the size settings
    pub fn store_layout(&self) -> StoreLayout {
        StoreLayout {
            hash_buckets: self.hash_buckets as u64,
            key_size: self.max_key_size as u64,
            value_size: self.max_value_size as u64,
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        let checks: [(bool, &str); 6] = [
            (self.worker_threads == 0, "worker_threads must be at least 1"),
            (self.queue_capacity == 0, "queue_capacity must be at least 1"),
            (self.hash_buckets == 0, "hash_buckets must be at least 1"),
            (self.max_key_size == 0, "max_key_size must be at least 1"),
            (self.max_value_size == 0, "max_value_size must be at least 1"),
            (self.max_frame_size == 0, "max_frame_size must be at least 1"),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, msg)) => Err(KvError::Config(msg.to_string())),
            None => Ok(()),
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the number of hash buckets per table page
    pub fn hash_buckets(mut self, buckets: usize) -> Self {
        self.config.hash_buckets = buckets;
        self
    }

    /// Set the maximum key size (in bytes)
    pub fn max_key_size(mut self, size: usize) -> Self {
        self.config.max_key_size = size;
        self
    }

    /// Set the maximum value size (in bytes)
    pub fn max_value_size(mut self, size: usize) -> Self {
        self.config.max_value_size = size;
        self
    }

    /// Set the number of worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the pending connection queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the largest accepted request frame (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
