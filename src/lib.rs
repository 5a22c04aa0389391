//! # mtkv
//!
//! A multi-threaded key-value server with:
//! - One request per TCP connection, length-prefixed text messages
//! - A bounded queue between the acceptor and a fixed worker pool
//! - Many-readers/single-writer gating of the store
//! - A single-file persistent hash table
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Acceptor                              │
//! │              (accept → timestamp → enqueue)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ blocks when full
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Bounded Queue                             │
//! │              (FIFO, capacity C, monitor)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ blocks when empty
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Worker Pool (N)                           │
//! │        (read frame → parse → execute → reply → stats)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  GET: read  │          │ PUT: write  │
//!   │  (shared)   │          │ (exclusive) │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬────────────┘
//!                       ▼
//!               ┌─────────────┐
//!               │    Store    │
//!               │ (hash file) │
//!               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod sync;
pub mod store;
pub mod engine;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, ParseError, Result};
pub use config::Config;
pub use engine::Engine;
pub use client::Client;
pub use network::{Server, ShutdownHandle, StatsSnapshot};
pub use store::{HashStore, MemoryStore, OpenMode, Store, StoreLayout};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mtkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
