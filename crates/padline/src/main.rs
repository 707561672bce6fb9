//! padline binary.
//!
//! # Usage
//!
//! ```bash
//! # Serve the HTTP driver
//! padline serve --host 0.0.0.0 --port 8000
//!
//! # Run the default Monte Carlo sweep, reproducibly
//! padline simulate --iterations 1000 --seed 7
//!
//! # Stress a single configuration
//! padline simulate --capacity 200 --margin 10
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use padline::service::SessionService;
use padline::simulation::{DEFAULT_SWEEP, SimulationConfig, run_sweep};
use padline::transport::{ServerConfig, serve};

/// Three-party pad allocation server and stress harness
#[derive(Parser, Debug)]
#[command(name = "padline")]
#[command(about = "Three-party one-time-pad index allocation")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP JSON driver
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Run Monte Carlo stress simulations
    Simulate {
        /// Pad line capacity; with --margin, replaces the default sweep
        #[arg(long)]
        capacity: Option<i64>,

        /// Safety margin; with --capacity, replaces the default sweep
        #[arg(long)]
        margin: Option<i64>,

        /// Sessions to simulate per configuration
        #[arg(long, default_value_t = 1000)]
        iterations: u32,

        /// Sweep seed; drawn randomly when absent
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Command::Serve { host, port } => {
            let service = Arc::new(SessionService::new());
            serve(ServerConfig { host, port }, service).await
        }
        Command::Simulate {
            capacity,
            margin,
            iterations,
            seed,
        } => {
            let configs: Vec<SimulationConfig> = match (capacity, margin) {
                (Some(capacity), Some(margin)) => vec![SimulationConfig { capacity, margin }],
                (None, None) => DEFAULT_SWEEP.to_vec(),
                _ => anyhow::bail!("--capacity and --margin must be given together"),
            };
            let seed = seed.unwrap_or_else(rand::random);

            tracing::info!(seed, iterations, "starting simulation sweep");
            let summaries = run_sweep(&configs, iterations, seed)?;

            for summary in summaries {
                tracing::info!(
                    capacity = summary.config.capacity,
                    margin = summary.config.margin,
                    mean = summary.mean_waste_pct,
                    median = summary.median_waste_pct,
                    stddev = summary.stddev_waste_pct,
                    min = summary.min_waste_pct,
                    max = summary.max_waste_pct,
                    deadlocks = summary.deadlocks,
                    exhausted = summary.exhausted,
                    "waste percentage"
                );
            }
            Ok(())
        }
    }
}
