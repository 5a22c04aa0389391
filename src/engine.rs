//! Engine Module
//!
//! Executes parsed requests against the store.
//!
//! ## Responsibilities
//! - Route GET/PUT requests to the store
//! - Hold the reader/writer gate for exactly the duration of the store access
//! - Map store outcomes to wire responses
//! - Close the store on shutdown

use crate::error::Result;
use crate::protocol::{Request, Response};
use crate::store::Store;
use crate::sync::{GateState, RwGate};

/// The request execution engine
///
/// ## Concurrency Model: Many Readers / Single Writer
///
/// - **GET**: enters the gate as a reader, any number run together
/// - **PUT**: enters the gate as the writer, waiting for in-flight GETs to
///   drain and excluding every other request while it runs
///
/// The store is shared by all workers; it is not assumed to be safe for
/// concurrent reads and writes on its own.
pub struct Engine<S: Store> {
    /// Persistent store shared by all workers
    store: S,

    /// Reader/writer exclusion over `store`
    gate: RwGate,
}

impl<S: Store> Engine<S> {
    /// Create an engine over an opened store
    pub fn new(store: S) -> Self {
        Self {
            store,
            gate: RwGate::new(),
        }
    }

    /// Execute a request
    ///
    /// Store failures become the operation's `*_ERROR` response; they never
    /// propagate to the caller.
    pub fn execute(&self, request: &Request) -> Response {
        match request {
            Request::Get { key } => {
                let _reader = self.gate.read();
                match self.store.get(key) {
                    Ok(Some(value)) => Response::GetOk(value),
                    Ok(None) => Response::GetError,
                    Err(e) => {
                        tracing::warn!("Lookup of {} failed: {}", request.key_lossy(), e);
                        Response::GetError
                    }
                }
            }
            Request::Put { key, value } => {
                let _writer = self.gate.write();
                match self.store.put(key, value) {
                    Ok(()) => Response::PutOk,
                    Err(e) => {
                        tracing::warn!("Write of {} failed: {}", request.key_lossy(), e);
                        Response::PutError
                    }
                }
            }
        }
    }

    /// Close the engine, closing the store
    pub fn close(self) -> Result<()> {
        self.store.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the reader/writer gate
    pub fn gate(&self) -> &RwGate {
        &self.gate
    }

    /// Current reader/writer state
    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }
}
