// crates/nexus-cli/src/main.rs
//
// CLI entrypoint for the NexusLink PoTC simulator.
//
// Talks to a running nexus-daemon over its JSON API: validator registry,
// consensus rounds and slashing, network dashboard views, and the terminal
// commands the web dashboard exposes.

mod api_client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::consensus::ConsensusCmd;
use commands::network::NetworkCmd;
use commands::validators::ValidatorsCmd;

use api_client::ApiClient;
use output::OutputFormat;

/// NexusLink CLI: inspect and drive the PoTC consensus simulator.
#[derive(Parser, Debug)]
#[command(
    name = "nexus",
    version = "0.1.0",
    about = "NexusLink CLI for the Proof of Temporal Commitment simulator"
)]
struct Cli {
    /// Base URL of the nexus-daemon HTTP API.
    #[arg(long, global = true, default_value = "http://localhost:5000")]
    api: String,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Validator registry: list, create.
    #[command(subcommand)]
    Validators(ValidatorsCmd),

    /// Consensus rounds, votes, simulation control, slashing.
    #[command(subcommand)]
    Consensus(ConsensusCmd),

    /// Nodes, training jobs, temporal commitments, metrics.
    #[command(subcommand)]
    Network(NetworkCmd),

    /// Run a dashboard terminal command (e.g. `exec node status`).
    Exec {
        /// Command name: node, potc, training, consensus.
        command: String,
        /// Remaining words, e.g. `status`.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.api);
    let format = OutputFormat::from_json_flag(cli.json);

    match &cli.command {
        Commands::Validators(cmd) => commands::validators::run(cmd, &client, format).await?,
        Commands::Consensus(cmd) => commands::consensus::run(cmd, &client, format).await?,
        Commands::Network(cmd) => commands::network::run(cmd, &client, format).await?,
        Commands::Exec { command, args } => {
            commands::exec::run(command, args, &client, format).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["nexus", "consensus", "stats"]).unwrap();
        assert_eq!(cli.api, "http://localhost:5000");
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::Consensus(ConsensusCmd::Stats)));
    }

    #[test]
    fn test_parse_validator_create() {
        let cli = Cli::try_parse_from([
            "nexus",
            "--json",
            "validators",
            "create",
            "--id",
            "validator_9",
            "--node",
            "node_9",
            "--stake",
            "50000",
            "--duration",
            "1440",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Validators(ValidatorsCmd::Create {
                id,
                stake,
                duration,
                uptime,
                ..
            }) => {
                assert_eq!(id, "validator_9");
                assert_eq!(stake, 50_000);
                assert_eq!(duration, 1440);
                assert_eq!(uptime, 100.0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_exec_collects_args() {
        let cli = Cli::try_parse_from(["nexus", "exec", "potc", "commit"]).unwrap();
        match cli.command {
            Commands::Exec { command, args } => {
                assert_eq!(command, "potc");
                assert_eq!(args, vec!["commit".to_string()]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_slash_requires_reason() {
        assert!(Cli::try_parse_from(["nexus", "consensus", "slash", "validator_1"]).is_err());
        assert!(Cli::try_parse_from([
            "nexus",
            "consensus",
            "slash",
            "validator_1",
            "--reason",
            "downtime"
        ])
        .is_ok());
    }
}
