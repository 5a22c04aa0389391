//! TCP Server
//!
//! Accepts connections and hands them to the worker pool through the
//! bounded queue.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::FieldLimits;
use crate::store::Store;
use crate::sync::{BoundedQueue, QueueClosed};

use super::connection::PendingConnection;
use super::receiving::ReceivingSet;
use super::shutdown::ShutdownHandle;
use super::stats::{Statistics, StatsSnapshot};
use super::worker::WorkerPool;

/// Everything the acceptor and the workers share
///
/// Owned through an `Arc` by the server and by each worker thread.
pub struct ServerContext<S: Store> {
    config: Config,
    limits: FieldLimits,
    queue: Arc<BoundedQueue<PendingConnection>>,
    engine: Engine<S>,
    stats: Arc<Statistics>,
    receiving: Arc<ReceivingSet>,
    stop: Arc<AtomicBool>,
}

impl<S: Store> ServerContext<S> {
    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Key/value size limits applied by the parser
    pub fn limits(&self) -> FieldLimits {
        self.limits
    }

    /// Pending connection queue
    pub fn queue(&self) -> &BoundedQueue<PendingConnection> {
        &self.queue
    }

    /// Request execution engine
    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    /// Shared statistics
    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Connections whose request is still being read
    pub fn receiving(&self) -> &ReceivingSet {
        &self.receiving
    }

    /// Whether shutdown was requested
    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// TCP server for mtkv
///
/// ## Threads
/// - the caller of [`Server::run`] becomes the acceptor
/// - `config.worker_threads` workers serve dequeued connections
pub struct Server<S: Store> {
    listener: TcpListener,
    local_addr: SocketAddr,
    context: Arc<ServerContext<S>>,
    shutdown: ShutdownHandle,
}

impl<S: Store> Server<S> {
    /// Validate the config and bind the listening socket
    ///
    /// # Errors
    /// `KvError::Config` for an invalid config, `KvError::Network` if the
    /// socket cannot be bound.
    pub fn bind(config: Config, store: S) -> Result<Self> {
        config.validate()?;

        let listener =
            TcpListener::bind(&config.listen_addr).map_err(|e| KvError::network("bind()", e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| KvError::network("getsockname()", e))?;

        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let stop = Arc::new(AtomicBool::new(false));
        let receiving = Arc::new(ReceivingSet::new());
        let shutdown = ShutdownHandle::new(
            Arc::clone(&stop),
            Arc::clone(&queue),
            Arc::clone(&receiving),
            local_addr,
        );

        let limits = FieldLimits {
            max_key_size: config.max_key_size,
            max_value_size: config.max_value_size,
        };

        let context = Arc::new(ServerContext {
            config,
            limits,
            queue,
            engine: Engine::new(store),
            stats: Arc::new(Statistics::new()),
            receiving,
            stop,
        });

        Ok(Self {
            listener,
            local_addr,
            context,
            shutdown,
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that stops the server from any thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Live statistics, readable while the server runs
    pub fn stats_handle(&self) -> Arc<Statistics> {
        Arc::clone(&self.context.stats)
    }

    /// Run until shutdown (blocking)
    ///
    /// Spawns the worker pool and accepts on the calling thread. Once stopped,
    /// waits for in-flight requests, closes the store and returns the final
    /// statistics.
    ///
    /// # Errors
    /// - `KvError::Network` if `accept` fails; the workers are still stopped
    ///   and joined first
    /// - `KvError::Store` if the store cannot be closed
    pub fn run(self) -> Result<StatsSnapshot> {
        let pool = match WorkerPool::spawn(&self.context) {
            Ok(pool) => pool,
            Err(e) => {
                self.shutdown.trigger();
                return Err(e);
            }
        };

        tracing::info!(
            "Listening for new connections on {} ({} workers, queue capacity {})",
            self.local_addr,
            pool.size(),
            self.context.queue().capacity()
        );

        let accepted = self.accept_loop();

        self.shutdown.trigger();
        pool.join();

        let stats = self.context.stats().snapshot();

        match Arc::try_unwrap(self.context) {
            Ok(context) => context.engine.close()?,
            Err(_) => {
                return Err(KvError::Store(
                    "store still shared after workers exited, not closed".to_string(),
                ))
            }
        }

        accepted.map(|_| stats)
    }

    /// Accept connections, stamp them and enqueue them until stopped
    fn accept_loop(&self) -> Result<()> {
        loop {
            let (stream, peer_addr) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::ConnectionAborted => {
                    tracing::debug!("Connection aborted before accept: {}", e);
                    continue;
                }
                Err(e) => {
                    if self.context.is_stopping() {
                        return Ok(());
                    }
                    tracing::error!("accept() failed: {}", e);
                    return Err(KvError::network("accept()", e));
                }
            };

            if self.context.is_stopping() {
                tracing::debug!("Acceptor stopping");
                return Ok(());
            }

            let pending = PendingConnection::new(stream, peer_addr);
            tracing::debug!("Got connection from '{}'", peer_addr);

            // Blocks while the queue is full
            if let Err(QueueClosed(_)) = self.context.queue().enqueue(pending) {
                tracing::debug!("Queue closed, acceptor stopping");
                return Ok(());
            }
        }
    }
}
