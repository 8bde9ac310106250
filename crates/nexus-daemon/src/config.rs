// crates/nexus-daemon/src/config.rs
//
// Runtime configuration for the NexusLink daemon.
// Loaded from a TOML file or populated with sensible defaults.

use std::fs;

use clap::ValueEnum;
use nexus_consensus::ConsensusParams;
use serde::Deserialize;

/// Which store backs the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Everything lives in process memory and is lost on exit.
    Memory,
    /// RocksDB under `data_dir`.
    Rocksdb,
}

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory for local data storage (RocksDB).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Storage backend: "memory" or "rocksdb".
    #[serde(default = "default_storage")]
    pub storage: StorageBackend,

    /// Host address for the HTTP server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the HTTP server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Populate an empty store with the demo network on startup.
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,

    /// Seconds between simulated consensus rounds.
    #[serde(default = "default_round_interval_secs")]
    pub round_interval_secs: u64,

    /// Seconds between live dashboard updates.
    #[serde(default = "default_live_update_interval_secs")]
    pub live_update_interval_secs: u64,

    /// Fixed RNG seed for reproducible runs. Entropy when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// `[consensus]` table.
    #[serde(default)]
    pub consensus: ConsensusParams,
}

fn default_data_dir() -> String {
    "~/.nexus/data".to_string()
}

fn default_storage() -> StorageBackend {
    StorageBackend::Memory
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_seed_demo_data() -> bool {
    true
}

fn default_round_interval_secs() -> u64 {
    15
}

fn default_live_update_interval_secs() -> u64 {
    3
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage: default_storage(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            seed_demo_data: default_seed_demo_data(),
            round_interval_secs: default_round_interval_secs(),
            live_update_interval_secs: default_live_update_interval_secs(),
            rng_seed: None,
            consensus: ConsensusParams::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: DaemonConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// `data_dir` with a leading `~/` resolved against the home directory.
    pub fn resolved_data_dir(&self) -> String {
        expand_tilde(&self.data_dir)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
