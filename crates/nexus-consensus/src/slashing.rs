// crates/nexus-consensus/src/slashing.rs
//
// Validator slashing.
//
// Each slashing event removes a fixed amount of reputation (floored at 0) and
// counts toward a threshold. Reaching the threshold moves the validator to the
// terminal `slashed` status. Below it, the current status is kept.

use serde::{Deserialize, Serialize};

use nexus_core::{Validator, ValidatorStatus};

use crate::params::ConsensusParams;

/// Result of a slashing event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashResult {
    pub validator_id: String,
    pub reason: String,
    pub reputation_before: f64,
    pub reputation_after: f64,
    pub slashing_events: u32,
    pub status: ValidatorStatus,
}

/// Apply one slashing event to a validator in place.
pub fn apply_slash(validator: &mut Validator, reason: &str, params: &ConsensusParams) -> SlashResult {
    let before = validator.reputation;
    validator.reputation = (before - params.slash_reputation_penalty).max(0.0);
    validator.slashing_events = validator.slashing_events.saturating_add(1);
    if validator.slashing_events >= params.slash_threshold {
        validator.status = ValidatorStatus::Slashed;
    }

    SlashResult {
        validator_id: validator.validator_id.clone(),
        reason: reason.to_string(),
        reputation_before: before,
        reputation_after: validator.reputation,
        slashing_events: validator.slashing_events,
        status: validator.status,
    }
}
