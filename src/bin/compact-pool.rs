//! Compact Pool command-line driver
//!
//! Runs synthetic workloads against a pool and reports its shape:
//! - Mesh-like insert/erase churn
//! - Replay of a JSON operation script
//! - Effective configuration dump
//!
//! # Examples
//!
//! ```bash
//! # Churn 100k vertices, erasing every third one, for 5 rounds
//! compact-pool churn --count 100000 --erase-every 3 --rounds 5
//!
//! # Replay a script with a constant growth policy
//! compact-pool --config pool.toml replay ops.json
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use compact_pool::pool::{CompactPool, GrowthConfig, Index, PoolStats};
use compact_pool::PoolConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact Pool - index-addressed object storage
#[derive(Parser, Debug)]
#[command(name = "compact-pool")]
#[command(version = compact_pool::VERSION)]
#[command(about = "Exercise a compact index-addressed pool", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Pool configuration file (TOML)
    #[arg(long, global = true, env = "COMPACT_POOL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert vertices and erase a fraction of them, repeatedly
    Churn {
        /// Vertices inserted per round
        #[arg(short, long, default_value = "10000")]
        count: usize,

        /// Erase every n-th live vertex after each round
        #[arg(short, long, default_value = "3")]
        erase_every: usize,

        /// Number of rounds
        #[arg(short, long, default_value = "4")]
        rounds: usize,
    },

    /// Replay a JSON script of insert/erase operations
    Replay {
        /// Script path
        script: PathBuf,
    },

    /// Print the effective pool configuration
    Config,

    /// Show version
    Version,
}

/// One step of a replay script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Operation {
    Insert { value: serde_json::Value },
    Erase { index: Index },
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    records: Vec<(Index, serde_json::Value)>,
    stats: PoolStats,
    failed_operations: usize,
}

/// Record stored by the churn workload
#[derive(Debug, Clone)]
struct Vertex {
    position: [f64; 3],
    next: Index,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let config = PoolConfig::load(cli.config.as_deref())
        .with_context(|| "Failed to load pool configuration")?;
    debug!(?config, "Pool configuration loaded");

    match cli.command {
        Commands::Churn {
            count,
            erase_every,
            rounds,
        } => churn_command(&config, count, erase_every, rounds),
        Commands::Replay { script } => replay_command(&config, &script),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Version => {
            println!("compact-pool {}", compact_pool::VERSION);
            Ok(())
        }
    }
}

/// Setup console logging
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Churn command - mesh-like growth and erosion
fn churn_command(
    config: &PoolConfig,
    count: usize,
    erase_every: usize,
    rounds: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(erase_every > 0, "--erase-every must be at least 1");

    let mut pool: CompactPool<Vertex, GrowthConfig> = CompactPool::with_config(config)?;
    info!(count, erase_every, rounds, "Starting churn workload");

    for round in 0..rounds {
        let mut previous = Index::default();
        for i in 0..count {
            let x = (round * count + i) as f64;
            previous = pool.emplace_with(|_| Vertex {
                position: [x, x * 0.5, 0.0],
                next: previous,
            })?;
        }

        let victims: Vec<Index> = pool.indices().step_by(erase_every).collect();
        for victim in victims {
            pool.erase(victim)?;
        }

        let stats = pool.stats();
        info!(
            round,
            len = stats.len,
            capacity = stats.capacity,
            free = stats.free,
            "Round complete"
        );
    }

    pool.check_invariants()?;

    let dangling = pool
        .values()
        .filter(|vertex| vertex.next.is_valid() && !pool.contains(vertex.next))
        .count();
    let extent = pool
        .values()
        .map(|vertex| vertex.position[0])
        .fold(0.0_f64, f64::max);
    info!(dangling, extent, "Links to erased vertices");

    println!("{}", serde_json::to_string_pretty(&pool.stats())?);
    Ok(())
}

/// Replay command - apply a script and print the resulting pool
fn replay_command(config: &PoolConfig, script: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let operations: Vec<Operation> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid script {}", script.display()))?;

    let mut pool: CompactPool<serde_json::Value, GrowthConfig> = CompactPool::with_config(config)?;
    let mut failed_operations = 0;

    for (step, operation) in operations.into_iter().enumerate() {
        match operation {
            Operation::Insert { value } => {
                let index = pool.insert(value)?;
                debug!(step, %index, "insert");
            }
            Operation::Erase { index } => {
                if let Err(e) = pool.erase(index) {
                    warn!(step, %index, error = %e, "Erase rejected");
                    failed_operations += 1;
                }
            }
        }
    }

    pool.check_invariants()?;

    let report = ReplayReport {
        stats: pool.stats(),
        records: pool.into_iter().collect(),
        failed_operations,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
