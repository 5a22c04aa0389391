//! Worker Pool
//!
//! Fixed set of long-lived threads draining the connection queue.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::error::Result;
use crate::store::Store;

use super::connection::{Connection, Outcome, PendingConnection};
use super::server::ServerContext;

/// Handles of the spawned worker threads
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `config.worker_threads` workers over `ctx`
    pub fn spawn<S: Store>(ctx: &Arc<ServerContext<S>>) -> Result<Self> {
        let count = ctx.config().worker_threads;
        let mut handles = Vec::with_capacity(count);

        for id in 0..count {
            let ctx = Arc::clone(ctx);
            let handle = thread::Builder::new()
                .name(format!("mtkv-worker-{}", id))
                .spawn(move || run_worker(id, ctx))?;
            handles.push(handle);
        }

        tracing::debug!("Spawned {} workers", count);
        Ok(Self { handles })
    }

    /// Number of workers in the pool
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to finish its current request and exit
    pub fn join(self) {
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                tracing::error!("{} panicked", name);
            }
        }
    }
}

/// Worker loop: dequeue, serve, account, until the server stops
fn run_worker<S: Store>(id: usize, ctx: Arc<ServerContext<S>>) {
    let span = tracing::debug_span!("worker", id);
    let _entered = span.enter();

    while !ctx.is_stopping() {
        let pending = match ctx.queue().dequeue() {
            Some(pending) => pending,
            None => break,
        };

        let dequeued_at = Instant::now();
        let waited = dequeued_at.saturating_duration_since(pending.arrived_at());

        match serve(&ctx, pending) {
            Outcome::Served(response) => {
                ctx.stats().record_served(waited, dequeued_at.elapsed());
                tracing::trace!("Replied {}", response);
            }
            Outcome::Rejected => ctx.stats().record_rejected(),
            Outcome::Dropped => {}
        }
    }

    tracing::debug!("Worker exiting");
}

/// Serve one dequeued connection; the stream closes when this returns
fn serve<S: Store>(ctx: &ServerContext<S>, pending: PendingConnection) -> Outcome {
    let peer_addr = pending.peer_addr();
    let config = ctx.config();

    let mut connection = match Connection::new(pending.into_stream(), peer_addr) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Could not set up connection from {}: {}", peer_addr, e);
            return Outcome::Dropped;
        }
    };

    if let Err(e) = connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms) {
        tracing::warn!("Could not set timeouts for {}: {}", peer_addr, e);
    }

    connection.serve(
        ctx.engine(),
        ctx.receiving(),
        ctx.limits(),
        config.max_frame_size,
    )
}
