// crates/nexus-core/src/consensus.rs
//
// Consensus round and vote records.
//
// Round lifecycle: Started -> VotesCast -> Finalized. A round is created when
// a proposer is selected, accumulates votes, and is written once more when the
// tally is finalized. Finalized rounds are immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a consensus round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Proposer selected and participants captured; no votes yet.
    Started,
    /// At least one vote recorded.
    VotesCast,
    /// Tally written. Terminal.
    Finalized,
}

impl RoundPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::Started => "started",
            RoundPhase::VotesCast => "votes_cast",
            RoundPhase::Finalized => "finalized",
        }
    }
}

/// One simulated block-agreement attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusRound {
    /// Store-assigned row id.
    pub id: u64,
    /// Monotonically increasing round number.
    pub round_number: u64,
    pub proposer_validator_id: String,
    /// Opaque block hash token. Carries no verification semantics.
    pub block_hash: String,
    pub timestamp: DateTime<Utc>,
    /// Participant validator ids, ordered by score descending at start.
    pub validator_participants: Vec<String>,
    pub consensus_reached: bool,
    /// Aggregated vote power voting `for`.
    pub votes_for: u64,
    /// Aggregated vote power not voting `for`.
    pub votes_against: u64,
    /// Milliseconds between round start and finalization.
    pub round_duration: Option<u64>,
    /// Minimum PoTC score among the participants.
    pub potc_threshold: u64,
    pub phase: RoundPhase,
}

impl ConsensusRound {
    pub fn is_finalized(&self) -> bool {
        self.phase == RoundPhase::Finalized
    }
}

/// Round insert payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConsensusRound {
    pub round_number: u64,
    pub proposer_validator_id: String,
    pub block_hash: String,
    pub validator_participants: Vec<String>,
    pub potc_threshold: u64,
}

impl NewConsensusRound {
    pub fn into_round(self, id: u64, now: DateTime<Utc>) -> ConsensusRound {
        ConsensusRound {
            id,
            round_number: self.round_number,
            proposer_validator_id: self.proposer_validator_id,
            block_hash: self.block_hash,
            timestamp: now,
            validator_participants: self.validator_participants,
            consensus_reached: false,
            votes_for: 0,
            votes_against: 0,
            round_duration: None,
            potc_threshold: self.potc_threshold,
            phase: RoundPhase::Started,
        }
    }
}

/// A single vote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    For,
    Against,
    Abstain,
}

impl VoteValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteValue::For => "for",
            VoteValue::Against => "against",
            VoteValue::Abstain => "abstain",
        }
    }
}

/// One validator's vote in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorVote {
    pub id: u64,
    pub round_id: u64,
    pub validator_id: String,
    pub vote: VoteValue,
    /// The validator's PoTC score at cast time. Never recomputed.
    pub vote_power: u64,
    pub timestamp: DateTime<Utc>,
    /// Opaque signature token.
    pub signature: String,
}

/// Vote insert payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewValidatorVote {
    pub round_id: u64,
    pub validator_id: String,
    pub vote: VoteValue,
    pub vote_power: u64,
    pub signature: String,
}

impl NewValidatorVote {
    pub fn into_vote(self, id: u64, now: DateTime<Utc>) -> ValidatorVote {
        ValidatorVote {
            id,
            round_id: self.round_id,
            validator_id: self.validator_id,
            vote: self.vote,
            vote_power: self.vote_power,
            timestamp: now,
            signature: self.signature,
        }
    }
}
