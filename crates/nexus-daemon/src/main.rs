// crates/nexus-daemon/src/main.rs
//
// Binary entrypoint for the NexusLink PoTC simulator daemon.
//
// Initializes tracing, parses CLI arguments, loads configuration, opens the
// store, seeds demo data, and runs the HTTP API alongside the consensus and
// live-update simulations until Ctrl-C.

mod config;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::{DaemonConfig, StorageBackend};
use nexus_consensus::{ConsensusSimulationTask, PotcEngine};
use nexus_core::NexusStore;
use nexus_rpc::{live_channel, AppState, LiveUpdateTask, RpcConfig};
use nexus_store::{seed_demo_data, MemoryStore, RocksStore};
use scheduler::TaskScheduler;

/// NexusLink daemon: serves the dashboard API and runs the PoTC simulation.
#[derive(Parser, Debug)]
#[command(name = "nexus-daemon", version = "0.1.0", about = "NexusLink PoTC simulator daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.nexus/config.toml")]
    config: String,

    /// Storage backend, overriding the config file.
    #[arg(long, value_enum)]
    storage: Option<StorageBackend>,

    /// HTTP port, overriding the config file.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load before installing the subscriber so the configured log level applies.
    let loaded = DaemonConfig::load(&args.config);
    let fallback_level = loaded
        .as_ref()
        .map(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|_| DaemonConfig::default().log_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&fallback_level)),
        )
        .init();

    let mut daemon_config = match loaded {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", args.config);
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                args.config,
                e
            );
            DaemonConfig::default()
        }
    };

    // CLI flags override the config file.
    if let Some(storage) = args.storage {
        daemon_config.storage = storage;
    }
    if let Some(port) = args.port {
        daemon_config.rpc_port = port;
    }

    tracing::info!("NexusLink PoTC Daemon v0.1.0");
    tracing::info!("Storage: {:?}", daemon_config.storage);
    tracing::info!(
        "HTTP endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );
    tracing::info!(
        "Round interval: {}s, live update interval: {}s",
        daemon_config.round_interval_secs,
        daemon_config.live_update_interval_secs
    );

    // ---------------------------------------------------------------
    // Storage and demo data
    // ---------------------------------------------------------------
    let store = open_store(&daemon_config)?;

    if daemon_config.seed_demo_data {
        let mut seed_rng = make_rng(daemon_config.rng_seed, 0);
        let summary = seed_demo_data(store.as_ref(), &mut seed_rng).await?;
        if summary.skipped {
            tracing::info!("Store already populated, skipping demo data");
        } else {
            tracing::info!(
                "Seeded {} nodes, {} training jobs, {} commitments, {} validators",
                summary.nodes,
                summary.training_jobs,
                summary.commitments,
                summary.validators
            );
        }
    }

    // ---------------------------------------------------------------
    // Consensus engine and live channel
    // ---------------------------------------------------------------
    let params = daemon_config.consensus.clone();
    let engine: Arc<PotcEngine<dyn NexusStore>> = Arc::new(match daemon_config.rng_seed {
        Some(seed) => PotcEngine::with_seed(store.clone(), params, seed.wrapping_add(1)),
        None => PotcEngine::new(store.clone(), params),
    });
    let resumed = engine.resume_round_counter().await?;
    if resumed > 0 {
        tracing::info!("Resuming after round {}", resumed);
    }

    let live_tx = live_channel();
    let state = AppState::new(store.clone(), engine.clone(), live_tx.clone());

    // ---------------------------------------------------------------
    // HTTP server
    // ---------------------------------------------------------------
    let rpc_config = RpcConfig {
        host: daemon_config.rpc_host.clone(),
        port: daemon_config.rpc_port,
    };
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };
        nexus_rpc::serve(&rpc_config, state, shutdown).await
    });

    // ---------------------------------------------------------------
    // Periodic simulations
    // ---------------------------------------------------------------
    let mut scheduler = TaskScheduler::new();
    scheduler.add(
        Arc::new(ConsensusSimulationTask::new(engine.clone())),
        Duration::from_secs(daemon_config.round_interval_secs),
    );
    scheduler.add(
        Arc::new(LiveUpdateTask::new(
            store.clone(),
            live_tx,
            make_rng(daemon_config.rng_seed, 2),
        )),
        Duration::from_secs(daemon_config.live_update_interval_secs),
    );
    tracing::info!("Starting {} periodic tasks", scheduler.task_count());
    let tasks = scheduler.start();

    // Run until Ctrl-C or the server exits on its own.
    let server_result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
            None
        }
        result = &mut server => Some(result),
    };

    tasks.stop().await;

    let server_result = match server_result {
        Some(result) => result,
        None => {
            let _ = shutdown_tx.send(());
            server.await
        }
    };

    match server_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!("HTTP server error: {}", e);
            return Err(e.into());
        }
        Err(e) => {
            tracing::error!("HTTP server task failed: {}", e);
            return Err(e.into());
        }
    }

    tracing::info!("NexusLink daemon shut down gracefully");
    Ok(())
}

/// Open the configured store behind the combined store trait.
fn open_store(config: &DaemonConfig) -> Result<Arc<dyn NexusStore>, Box<dyn std::error::Error>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory store");
            let store: Arc<dyn NexusStore> = Arc::new(MemoryStore::new());
            Ok(store)
        }
        StorageBackend::Rocksdb => {
            let data_dir = config.resolved_data_dir();
            std::fs::create_dir_all(&data_dir)?;
            let path = format!("{}/rocksdb", data_dir);
            let store = RocksStore::open(&path)
                .map_err(|e| format!("Failed to open RocksDB at {}: {}", path, e))?;
            tracing::info!("RocksDB store opened at {}", path);
            let store: Arc<dyn NexusStore> = Arc::new(store);
            Ok(store)
        }
    }
}

/// Deterministic RNG when a seed is configured, entropy otherwise. `offset`
/// keeps the independent simulations on distinct streams.
fn make_rng(seed: Option<u64>, offset: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(offset)),
        None => StdRng::from_entropy(),
    }
}
