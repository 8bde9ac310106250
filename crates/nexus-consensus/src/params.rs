// crates/nexus-consensus/src/params.rs
//
// Tunable consensus parameters. Deserialized from the daemon's `[consensus]`
// config table; any missing field falls back to its default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Percentage of "for" vote power required to reach consensus.
    #[serde(default = "default_consensus_threshold")]
    pub consensus_threshold: f64,
    /// Minimum number of participants for a round to start.
    #[serde(default = "default_min_validators")]
    pub min_validators: usize,
    /// Minimum PoTC score for a validator to participate in a round.
    #[serde(default = "default_min_participant_score")]
    pub min_participant_score: u64,
    /// Reputation points removed per slashing event.
    #[serde(default = "default_slash_reputation_penalty")]
    pub slash_reputation_penalty: f64,
    /// Slashing events at which a validator becomes `slashed`.
    #[serde(default = "default_slash_threshold")]
    pub slash_threshold: u32,
    /// Pause between round start and vote simulation.
    #[serde(default = "default_vote_delay_ms")]
    pub vote_delay_ms: u64,
    /// Pause between vote simulation and finalization.
    #[serde(default = "default_finalize_delay_ms")]
    pub finalize_delay_ms: u64,
    /// Default page size for recent-round listings.
    #[serde(default = "default_recent_rounds_limit")]
    pub recent_rounds_limit: usize,
    /// Number of validators reported in stats.
    #[serde(default = "default_top_validators_limit")]
    pub top_validators_limit: usize,
}

fn default_consensus_threshold() -> f64 {
    67.0
}

fn default_min_validators() -> usize {
    3
}

fn default_min_participant_score() -> u64 {
    100
}

fn default_slash_reputation_penalty() -> f64 {
    20.0
}

fn default_slash_threshold() -> u32 {
    3
}

fn default_vote_delay_ms() -> u64 {
    1000
}

fn default_finalize_delay_ms() -> u64 {
    2000
}

fn default_recent_rounds_limit() -> usize {
    10
}

fn default_top_validators_limit() -> usize {
    5
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            consensus_threshold: default_consensus_threshold(),
            min_validators: default_min_validators(),
            min_participant_score: default_min_participant_score(),
            slash_reputation_penalty: default_slash_reputation_penalty(),
            slash_threshold: default_slash_threshold(),
            vote_delay_ms: default_vote_delay_ms(),
            finalize_delay_ms: default_finalize_delay_ms(),
            recent_rounds_limit: default_recent_rounds_limit(),
            top_validators_limit: default_top_validators_limit(),
        }
    }
}

impl ConsensusParams {
    /// Defaults with the simulation delays removed.
    pub fn without_delays() -> Self {
        Self {
            vote_delay_ms: 0,
            finalize_delay_ms: 0,
            ..Self::default()
        }
    }
}
