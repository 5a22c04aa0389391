//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread stamping and enqueueing connections
//! - Bounded queue providing backpressure to the acceptor
//! - Fixed worker pool, one request per dequeued connection
//! - Requests routed through the Engine's reader/writer gate

mod connection;
mod receiving;
mod server;
mod shutdown;
mod stats;
mod worker;

pub use connection::{Connection, Outcome, PendingConnection};
pub use receiving::{ReceivingGuard, ReceivingSet};
pub use server::{Server, ServerContext};
pub use shutdown::ShutdownHandle;
pub use stats::{Statistics, StatsSnapshot};
pub use worker::WorkerPool;
