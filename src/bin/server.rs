//! mtkv Server Binary
//!
//! Starts the TCP server for mtkv.

use clap::Parser;
use mtkv::{Config, HashStore, OpenMode, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// mtkv Server
#[derive(Parser, Debug)]
#[command(name = "mtkv-server")]
#[command(about = "Multi-threaded key-value server")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(short, long, default_value = "mydb.db")]
    db: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:6767")]
    listen: String,

    /// Number of worker threads
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// Capacity of the pending connection queue
    #[arg(short, long, default_value = "100")]
    queue_capacity: usize,

    /// Hash buckets per table page (fixed when the file is created)
    #[arg(long, default_value = "1024")]
    hash_buckets: usize,

    /// Maximum key size in bytes
    #[arg(long, default_value = "128")]
    max_key_size: usize,

    /// Maximum value size in bytes
    #[arg(long, default_value = "1024")]
    max_value_size: usize,

    /// Largest accepted request frame in bytes
    #[arg(long, default_value = "65536")]
    max_frame_size: usize,

    /// Per-connection read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Per-connection write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mtkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("mtkv Server v{}", mtkv::VERSION);
    tracing::info!("Database file: {}", args.db);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .db_path(&args.db)
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .queue_capacity(args.queue_capacity)
        .hash_buckets(args.hash_buckets)
        .max_key_size(args.max_key_size)
        .max_value_size(args.max_value_size)
        .max_frame_size(args.max_frame_size)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    // Open store
    let store = match HashStore::open(&config.db_path, OpenMode::Create, config.store_layout()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Cannot open the database: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Store opened successfully");

    let server = match Server::bind(config, store) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Ctrl+C / SIGTERM stop the server from ctrlc's own thread
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Termination signal received, shutting down...");
        shutdown.trigger();
    }) {
        tracing::error!("Failed to install signal handler: {}", e);
        std::process::exit(1);
    }

    match server.run() {
        Ok(stats) => {
            eprintln!("{}", stats);
            tracing::info!("Server stopped");
        }
        Err(e) => {
            tracing::error!("Server error: {}", e);
        }
    }

    // Terminated by signal (or fatal error): non-zero either way
    std::process::exit(1);
}
