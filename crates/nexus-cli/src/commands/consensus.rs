// crates/nexus-cli/src/commands/consensus.rs
//
// `nexus consensus ...`: stats, rounds, votes, simulation control, slashing.

use clap::{Subcommand, ValueEnum};
use nexus_consensus::slashing::SlashResult;
use nexus_consensus::ConsensusStats;
use nexus_core::{ConsensusRound, ValidatorVote, VoteValue};
use serde::Deserialize;
use serde_json::{json, Value};
use tabled::Tabled;

use crate::api_client::ApiClient;
use crate::commands::validators::ValidatorRow;
use crate::output::{format_json, format_table, print_list, truncate, FieldRow, OutputFormat};

/// Consensus subcommands.
#[derive(Debug, Subcommand)]
pub enum ConsensusCmd {
    /// Round totals, success rate, and top validators.
    Stats,
    /// Most recent rounds, newest first.
    Rounds {
        /// Number of rounds to show (server default 10).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Votes cast in a round (by round id).
    Votes {
        round: u64,
    },
    /// Kick off one simulated round in the background.
    Start,
    /// Recompute every active validator's PoTC score.
    UpdateScores,
    /// Submit a vote on behalf of a validator.
    Vote {
        #[arg(long)]
        round: u64,
        #[arg(long)]
        validator: String,
        #[arg(long, value_enum)]
        value: VoteArg,
    },
    /// Apply one slashing event to a validator.
    Slash {
        validator: String,
        #[arg(long)]
        reason: String,
    },
}

/// Vote value as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VoteArg {
    For,
    Against,
    Abstain,
}

impl From<VoteArg> for VoteValue {
    fn from(arg: VoteArg) -> Self {
        match arg {
            VoteArg::For => VoteValue::For,
            VoteArg::Against => VoteValue::Against,
            VoteArg::Abstain => VoteValue::Abstain,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
    #[serde(default)]
    updated: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct VoteResponse {
    accepted: bool,
}

/// A row in the rounds table.
#[derive(Tabled)]
pub struct RoundRow {
    #[tabled(rename = "Round")]
    pub round: u64,
    #[tabled(rename = "Proposer")]
    pub proposer: String,
    #[tabled(rename = "Block")]
    pub block: String,
    #[tabled(rename = "Participants")]
    pub participants: usize,
    #[tabled(rename = "For")]
    pub votes_for: u64,
    #[tabled(rename = "Against")]
    pub votes_against: u64,
    #[tabled(rename = "Consensus")]
    pub consensus: String,
    #[tabled(rename = "Duration")]
    pub duration: String,
    #[tabled(rename = "Phase")]
    pub phase: String,
}

impl From<&ConsensusRound> for RoundRow {
    fn from(r: &ConsensusRound) -> Self {
        Self {
            round: r.round_number,
            proposer: r.proposer_validator_id.clone(),
            block: truncate(&r.block_hash, 12),
            participants: r.validator_participants.len(),
            votes_for: r.votes_for,
            votes_against: r.votes_against,
            consensus: if r.consensus_reached { "yes" } else { "no" }.to_string(),
            duration: r
                .round_duration
                .map(|ms| format!("{} ms", ms))
                .unwrap_or_else(|| "--".to_string()),
            phase: r.phase.as_str().to_string(),
        }
    }
}

/// A row in the votes table.
#[derive(Tabled)]
pub struct VoteRow {
    #[tabled(rename = "Validator")]
    pub validator: String,
    #[tabled(rename = "Vote")]
    pub vote: String,
    #[tabled(rename = "Power")]
    pub power: u64,
    #[tabled(rename = "Time")]
    pub time: String,
}

impl From<&ValidatorVote> for VoteRow {
    fn from(v: &ValidatorVote) -> Self {
        Self {
            validator: v.validator_id.clone(),
            vote: v.vote.as_str().to_string(),
            power: v.vote_power,
            time: v.timestamp.format("%H:%M:%S").to_string(),
        }
    }
}

/// Summary fields of the stats view.
pub fn stats_summary(stats: &ConsensusStats) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Current Round", stats.current_round),
        FieldRow::new("Total Rounds", stats.total_rounds),
        FieldRow::new("Successful Rounds", stats.successful_rounds),
        FieldRow::new("Success Rate", format!("{:.1}%", stats.success_rate)),
        FieldRow::new(
            "Simulation",
            if stats.is_simulation_running { "running" } else { "idle" },
        ),
    ]
}

/// Key/value view of a slashing outcome.
pub fn slash_summary(result: &SlashResult) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Validator", &result.validator_id),
        FieldRow::new("Reason", &result.reason),
        FieldRow::new(
            "Reputation",
            format!(
                "{:.1} -> {:.1}",
                result.reputation_before, result.reputation_after
            ),
        ),
        FieldRow::new("Slashing Events", result.slashing_events),
        FieldRow::new("Status", result.status),
    ]
}

/// Run the consensus subcommand.
pub async fn run(
    cmd: &ConsensusCmd,
    client: &ApiClient,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConsensusCmd::Stats => {
            let stats: ConsensusStats = client.get("/api/consensus/stats").await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&stats)),
                OutputFormat::Table => {
                    println!("{}", format_table(&stats_summary(&stats)));
                    if !stats.top_validators.is_empty() {
                        println!();
                        println!("Top validators");
                        let rows: Vec<ValidatorRow> =
                            stats.top_validators.iter().map(ValidatorRow::from).collect();
                        println!("{}", format_table(&rows));
                    }
                }
            }
        }
        ConsensusCmd::Rounds { limit } => {
            let path = match limit {
                Some(n) => format!("/api/consensus/rounds?limit={}", n),
                None => "/api/consensus/rounds".to_string(),
            };
            let rounds: Vec<ConsensusRound> = client.get(&path).await?;
            print_list(format, &rounds, |r| RoundRow::from(r), "No rounds yet.");
        }
        ConsensusCmd::Votes { round } => {
            let path = format!("/api/consensus/rounds/{}/votes", round);
            let votes: Vec<ValidatorVote> = client.get(&path).await?;
            print_list(format, &votes, |v| VoteRow::from(v), "No votes in this round.");
        }
        ConsensusCmd::Start => {
            let resp: MessageResponse = client.post("/api/consensus/start", &json!({})).await?;
            println!("{}", resp.message);
        }
        ConsensusCmd::UpdateScores => {
            let resp: MessageResponse = client
                .post("/api/consensus/update-scores", &json!({}))
                .await?;
            match resp.updated {
                Some(n) => println!("{} ({} validators)", resp.message, n),
                None => println!("{}", resp.message),
            }
        }
        ConsensusCmd::Vote {
            round,
            validator,
            value,
        } => {
            let body = vote_body(*round, validator, *value);
            let resp: VoteResponse = client.post("/api/consensus/votes", &body).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", format_json(&json!({ "accepted": resp.accepted })))
                }
                OutputFormat::Table if resp.accepted => println!("Vote recorded."),
                OutputFormat::Table => {
                    println!("Vote not recorded (unknown validator or repeat vote).")
                }
            }
        }
        ConsensusCmd::Slash { validator, reason } => {
            let body = json!({ "validatorId": validator, "reason": reason });
            let result: SlashResult = client.post("/api/consensus/slash", &body).await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&result)),
                OutputFormat::Table => println!("{}", format_table(&slash_summary(&result))),
            }
        }
    }

    Ok(())
}

/// Request body for POST /api/consensus/votes.
fn vote_body(round: u64, validator: &str, value: VoteArg) -> Value {
    json!({
        "roundId": round,
        "validatorId": validator,
        "vote": VoteValue::from(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nexus_core::{RoundPhase, ValidatorStatus};

    fn sample_round() -> ConsensusRound {
        ConsensusRound {
            id: 3,
            round_number: 3,
            proposer_validator_id: "validator_2".to_string(),
            block_hash: "0x1f2e3d4c5b6a79880011".to_string(),
            timestamp: Utc::now(),
            validator_participants: vec![
                "validator_1".to_string(),
                "validator_2".to_string(),
                "validator_3".to_string(),
            ],
            consensus_reached: true,
            votes_for: 21_000,
            votes_against: 4_000,
            round_duration: Some(3012),
            potc_threshold: 4_000,
            phase: RoundPhase::Finalized,
        }
    }

    #[test]
    fn test_round_row() {
        let row = RoundRow::from(&sample_round());
        assert_eq!(row.round, 3);
        assert_eq!(row.block, "0x1f2e3d4c5b...");
        assert_eq!(row.participants, 3);
        assert_eq!(row.consensus, "yes");
        assert_eq!(row.duration, "3012 ms");
        assert_eq!(row.phase, "finalized");
    }

    #[test]
    fn test_unfinished_round_row() {
        let mut round = sample_round();
        round.round_duration = None;
        round.consensus_reached = false;
        round.phase = RoundPhase::VotesCast;
        let row = RoundRow::from(&round);
        assert_eq!(row.duration, "--");
        assert_eq!(row.consensus, "no");
        assert_eq!(row.phase, "votes_cast");
    }

    #[test]
    fn test_vote_body_matches_server_shape() {
        let body = vote_body(7, "validator_4", VoteArg::Abstain);
        assert_eq!(body["roundId"], 7);
        assert_eq!(body["validatorId"], "validator_4");
        assert_eq!(body["vote"], "abstain");
    }

    #[test]
    fn test_stats_summary() {
        let stats = ConsensusStats {
            total_rounds: 8,
            successful_rounds: 6,
            success_rate: 75.0,
            current_round: 8,
            top_validators: Vec::new(),
            is_simulation_running: false,
        };
        let table = format_table(&stats_summary(&stats));
        assert!(table.contains("75.0%"));
        assert!(table.contains("idle"));
    }

    #[test]
    fn test_slash_summary() {
        let result = SlashResult {
            validator_id: "validator_5".to_string(),
            reason: "downtime".to_string(),
            reputation_before: 60.0,
            reputation_after: 40.0,
            slashing_events: 3,
            status: ValidatorStatus::Slashed,
        };
        let table = format_table(&slash_summary(&result));
        assert!(table.contains("60.0 -> 40.0"));
        assert!(table.contains("slashed"));
    }
}
