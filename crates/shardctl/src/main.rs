//! shardctl - inspect key placement and exercise a sharded cache in-process

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shardcache::ShardConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file (replicas, shard_capacity, nodes)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node ID, repeatable; appended to the config's nodes
    #[arg(short, long = "node")]
    nodes: Vec<String>,

    /// Ring positions per node (overrides config)
    #[arg(short, long)]
    replicas: Option<usize>,

    /// Entries per shard, 0 for unbounded (overrides config)
    #[arg(long)]
    capacity: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the owning node of each key
    Locate {
        /// Keys to look up
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Show how `key-0..key-N` spread across nodes
    Distribution {
        /// Number of sample keys
        #[arg(short, long, default_value_t = 100_000)]
        samples: usize,
    },

    /// Run a read-through workload and print cache stats as JSON
    Simulate {
        /// Distinct keys in the workload
        #[arg(short, long, default_value_t = 10_000)]
        keys: u64,

        /// Operations to run
        #[arg(short, long, default_value_t = 100_000)]
        ops: u64,

        /// RNG seed
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    info!(
        nodes = config.nodes.len(),
        replicas = config.replicas,
        shard_capacity = config.shard_capacity,
        "config loaded"
    );

    match args.command {
        Command::Locate { keys } => commands::locate(&config, &keys),
        Command::Distribution { samples } => commands::distribution(&config, samples),
        Command::Simulate { keys, ops, seed } => commands::simulate(config, keys, ops, seed),
    }
}

fn load_config(args: &Args) -> Result<ShardConfig> {
    let mut config = match &args.config {
        Some(path) => ShardConfig::from_file(path)?,
        None => ShardConfig::default(),
    };

    config.nodes.extend(args.nodes.iter().cloned());
    if let Some(replicas) = args.replicas {
        config.replicas = replicas;
    }
    if let Some(capacity) = args.capacity {
        config.shard_capacity = capacity;
    }

    config.validate()?;
    Ok(config)
}
