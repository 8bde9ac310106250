// crates/nexus-consensus/src/round.rs
//
// Round-level pure logic: vote tallying and simulated vote choice.
//
// Round lifecycle: Started -> VotesCast -> Finalized. The engine persists the
// transitions; this module only decides outcomes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use nexus_core::{ValidatorVote, VoteValue};

/// Aggregated vote power for a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub votes_for: u64,
    /// Everything that is not a "for" vote, abstentions included.
    pub votes_against: u64,
    pub for_percentage: f64,
    pub consensus_reached: bool,
}

/// Tally a round's votes against a percentage threshold.
///
/// With no vote power cast the percentage is 0 and consensus is not reached.
/// Power is summed in `u128`; the reported totals saturate at `u64::MAX`.
pub fn tally_votes(votes: &[ValidatorVote], threshold: f64) -> VoteTally {
    let total: u128 = votes.iter().map(|v| u128::from(v.vote_power)).sum();
    let votes_for: u128 = votes
        .iter()
        .filter(|v| v.vote == VoteValue::For)
        .map(|v| u128::from(v.vote_power))
        .sum();

    let for_percentage = if total > 0 {
        votes_for as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    VoteTally {
        votes_for: saturate(votes_for),
        votes_against: saturate(total - votes_for),
        for_percentage,
        consensus_reached: total > 0 && for_percentage >= threshold,
    }
}

fn saturate(power: u128) -> u64 {
    u64::try_from(power).unwrap_or(u64::MAX)
}

/// Simulated vote: "for" with probability `reputation / 100`, else "against".
pub fn simulate_vote<R: Rng + ?Sized>(reputation: f64, rng: &mut R) -> VoteValue {
    let p = if reputation.is_nan() {
        0.0
    } else {
        (reputation / 100.0).clamp(0.0, 1.0)
    };
    if rng.gen_bool(p) {
        VoteValue::For
    } else {
        VoteValue::Against
    }
}
