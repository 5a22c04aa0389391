//! Synchronization Module
//!
//! Blocking primitives shared by the acceptor and the worker pool.
//!
//! ## Components
//! - [`BoundedQueue`]: fixed-capacity FIFO monitor between the acceptor
//!   (single producer) and the workers (many consumers)
//! - [`RwGate`]: many concurrent readers XOR one writer in front of the store
//!
//! Both are monitors: one `parking_lot::Mutex` guarding the state, with
//! condition variables for each predicate a thread can wait on. Every wait
//! sits in a `while` loop that re-checks its predicate after waking.

mod gate;
mod queue;

pub use gate::{GateState, ReadGuard, RwGate, WriteGuard};
pub use queue::{BoundedQueue, QueueClosed};
