// crates/nexus-cli/src/commands/validators.rs
//
// `nexus validators {list, create}`: validator registry commands.

use clap::Subcommand;
use nexus_core::{NewValidator, Validator, ValidatorStatus};
use tabled::Tabled;

use crate::api_client::ApiClient;
use crate::output::{format_json, format_table, print_list, FieldRow, OutputFormat};

/// Validator subcommands.
#[derive(Debug, Subcommand)]
pub enum ValidatorsCmd {
    /// List validators.
    List {
        /// Only active validators with an open commitment, highest score first.
        #[arg(long)]
        active: bool,
    },
    /// Register a new validator.
    Create {
        /// Unique validator id (e.g. validator_9).
        #[arg(long)]
        id: String,
        /// Backing node id.
        #[arg(long)]
        node: String,
        /// Stake in whole tokens.
        #[arg(long)]
        stake: u64,
        /// Commitment duration in minutes.
        #[arg(long)]
        duration: u64,
        /// Uptime percentage.
        #[arg(long, default_value_t = 100.0)]
        uptime: f64,
        /// Reputation score.
        #[arg(long, default_value_t = 100.0)]
        reputation: f64,
    },
}

/// A row in the validator table.
#[derive(Tabled)]
pub struct ValidatorRow {
    #[tabled(rename = "Validator")]
    pub validator_id: String,
    #[tabled(rename = "Node")]
    pub node_id: String,
    #[tabled(rename = "Stake")]
    pub stake: u64,
    #[tabled(rename = "Commit (min)")]
    pub duration: u64,
    #[tabled(rename = "Uptime")]
    pub uptime: String,
    #[tabled(rename = "Reputation")]
    pub reputation: String,
    #[tabled(rename = "PoTC Score")]
    pub score: u64,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Proposed")]
    pub proposed: u64,
    #[tabled(rename = "Validated")]
    pub validated: u64,
    #[tabled(rename = "Slashes")]
    pub slashes: u32,
}

impl From<&Validator> for ValidatorRow {
    fn from(v: &Validator) -> Self {
        Self {
            validator_id: v.validator_id.clone(),
            node_id: v.node_id.clone(),
            stake: v.stake_amount,
            duration: v.commitment_duration,
            uptime: format!("{:.1}%", v.uptime),
            reputation: format!("{:.1}", v.reputation),
            score: v.potc_score,
            status: v.status.to_string(),
            proposed: v.blocks_proposed,
            validated: v.blocks_validated,
            slashes: v.slashing_events,
        }
    }
}

/// Run the validators subcommand.
pub async fn run(
    cmd: &ValidatorsCmd,
    client: &ApiClient,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ValidatorsCmd::List { active } => {
            let path = if *active {
                "/api/validators/active"
            } else {
                "/api/validators"
            };
            let validators: Vec<Validator> = client.get(path).await?;
            print_list(
                format,
                &validators,
                |v| ValidatorRow::from(v),
                "No validators registered.",
            );
        }
        ValidatorsCmd::Create {
            id,
            node,
            stake,
            duration,
            uptime,
            reputation,
        } => {
            let request = NewValidator {
                validator_id: id.clone(),
                node_id: node.clone(),
                stake_amount: *stake,
                commitment_duration: *duration,
                end_time: None,
                uptime: *uptime,
                reputation: *reputation,
                status: ValidatorStatus::Active,
            };
            let created: Validator = client.post("/api/validators", &request).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&created)),
                OutputFormat::Table => {
                    println!("Validator registered.");
                    println!("{}", format_table(&validator_details(&created)));
                }
            }
        }
    }

    Ok(())
}

/// Key/value view of a single validator.
pub fn validator_details(v: &Validator) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Validator", &v.validator_id),
        FieldRow::new("Node", &v.node_id),
        FieldRow::new("Stake", v.stake_amount),
        FieldRow::new("Commitment (min)", v.commitment_duration),
        FieldRow::new("Start", v.start_time.to_rfc3339()),
        FieldRow::new("End", v.end_time.to_rfc3339()),
        FieldRow::new("Uptime", format!("{:.1}%", v.uptime)),
        FieldRow::new("Reputation", format!("{:.1}", v.reputation)),
        FieldRow::new("Status", v.status),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample() -> Validator {
        let now = Utc::now();
        Validator {
            id: 1,
            validator_id: "validator_1".to_string(),
            node_id: "node_1".to_string(),
            stake_amount: 100_000,
            commitment_duration: 1440,
            start_time: now,
            end_time: now + Duration::minutes(1440),
            uptime: 99.5,
            reputation: 87.3,
            potc_score: 6_250,
            status: ValidatorStatus::Active,
            blocks_proposed: 4,
            blocks_validated: 12,
            slashing_events: 1,
            last_activity: now,
        }
    }

    #[test]
    fn test_validator_row() {
        let row = ValidatorRow::from(&sample());
        assert_eq!(row.validator_id, "validator_1");
        assert_eq!(row.uptime, "99.5%");
        assert_eq!(row.reputation, "87.3");
        assert_eq!(row.score, 6_250);
        assert_eq!(row.status, "active");
        assert_eq!(row.slashes, 1);
    }

    #[test]
    fn test_validator_details_table() {
        let table = format_table(&validator_details(&sample()));
        assert!(table.contains("validator_1"));
        assert!(table.contains("100000"));
        assert!(table.contains("active"));
    }
}
