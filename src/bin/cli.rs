//! mtkv CLI Client
//!
//! Command-line interface and load generator for an mtkv server.

use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use mtkv::{Client, KvError, Result};
use rand::Rng;
use tracing_subscriber::{fmt, EnvFilter};

/// Highest station id used by the sweep and bench workloads
const MAX_STATION_ID: u32 = 128;

/// mtkv CLI
#[derive(Parser, Debug)]
#[command(name = "mtkv-cli")]
#[command(about = "CLI for the mtkv key-value server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6767")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Send a raw operation, e.g. `PUT:key:value` or `GET:key`
    Send {
        /// The operation text
        operation: String,
    },

    /// Issue one request per station id, 0 through 128
    Sweep {
        /// Repeatedly GET or repeatedly PUT random readings
        #[arg(short, long, value_enum)]
        mode: SweepMode,

        /// Number of passes over all stations
        #[arg(short, long, default_value = "1")]
        iterations: u32,
    },

    /// Fire random GET/PUT requests from parallel threads
    Bench {
        /// Number of client threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Requests sent by each thread
        #[arg(short, long, default_value = "1")]
        requests: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SweepMode {
    Get,
    Put,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let client = Client::new(args.server.as_str())?;

    match args.command {
        Commands::Get { key } => talk(&client, &format!("GET:{}", key)),
        Commands::Put { key, value } => talk(&client, &format!("PUT:{}:{}", key, value)),
        Commands::Send { operation } => talk(&client, &operation),
        Commands::Sweep { mode, iterations } => {
            let mut rng = rand::thread_rng();
            for _ in 0..iterations {
                for station in 0..=MAX_STATION_ID {
                    let operation = match mode {
                        SweepMode::Get => format!("GET:station.{}", station),
                        SweepMode::Put => {
                            format!("PUT:station.{}:{}", station, random_reading(&mut rng))
                        }
                    };
                    talk(&client, &operation)?;
                }
            }
            Ok(())
        }
        Commands::Bench { threads, requests } => bench(&client, threads, requests),
    }
}

/// Send one operation and print the exchange
fn talk(client: &Client, operation: &str) -> Result<()> {
    println!("Operation: {}", operation);
    let response = client.send(operation.as_bytes())?;
    println!("Result: {}", response);
    Ok(())
}

/// Random reading in -20..=44, the range the station workload uses
fn random_reading<R: Rng>(rng: &mut R) -> i32 {
    rng.gen_range(-20..=44)
}

fn random_operation<R: Rng>(rng: &mut R) -> String {
    let station = rng.gen_range(0..=MAX_STATION_ID);
    if rng.gen_bool(0.5) {
        format!("GET:station.{}", station)
    } else {
        format!("PUT:station.{}:{}", station, random_reading(rng))
    }
}

fn bench(client: &Client, threads: usize, requests: usize) -> Result<()> {
    let start = Instant::now();

    let results = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|_| -> Result<()> {
                    let mut rng = rand::thread_rng();
                    for _ in 0..requests {
                        talk(client, &random_operation(&mut rng))?;
                    }
                    Ok(())
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|_| Err(thread_panicked())))
            .collect::<Vec<_>>()
    })
    .map_err(|_| thread_panicked())?;

    println!("Total time (nanosec): {}", start.elapsed().as_nanos());

    results.into_iter().collect()
}

fn thread_panicked() -> KvError {
    KvError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "bench thread panicked",
    ))
}
