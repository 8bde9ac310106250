// crates/nexus-consensus/src/scoring.rs
//
// PoTC score calculation.
//
// A validator's score grows with stake and, super-linearly, with the length of
// its commitment window. Uptime and reputation scale it down, progress through
// the window adds up to a 2x persistence bonus, and each slashing event
// multiplies it by 0.9.

use chrono::{DateTime, Utc};

use nexus_core::Validator;

/// Stake units per unit of stake weight.
const STAKE_NORMALIZER: f64 = 10_000.0;

/// Exponent applied to commitment length in days.
const TIME_WEIGHT_EXPONENT: f64 = 1.5;

/// Per-event slashing multiplier.
const SLASHING_DECAY: f64 = 0.9;

/// Final scale factor.
const SCORE_SCALE: f64 = 1000.0;

/// Compute the PoTC score for a validator at `now`.
///
/// Returns 0 for degenerate inputs (zero stake or duration, NaN weights).
pub fn calculate_potc_score(validator: &Validator, now: DateTime<Utc>) -> u64 {
    let commitment_hours = validator.commitment_duration as f64 / 60.0;
    let time_weight = (commitment_hours / 24.0).powf(TIME_WEIGHT_EXPONENT);

    let stake_weight = validator.stake_amount as f64 / STAKE_NORMALIZER;
    let uptime_weight = validator.uptime / 100.0;
    let reputation_weight = validator.reputation / 100.0;

    let persistence_bonus = persistence_bonus(validator, now);
    let slashing_penalty = SLASHING_DECAY.powf(f64::from(validator.slashing_events));

    let raw = stake_weight
        * time_weight
        * uptime_weight
        * reputation_weight
        * (1.0 + persistence_bonus)
        * slashing_penalty
        * SCORE_SCALE;

    if raw.is_nan() || raw <= 0.0 {
        return 0;
    }
    // Saturating cast for very large stakes.
    raw.floor() as u64
}

/// Fraction of the commitment window elapsed at `now`, clamped to [0, 1].
/// An empty or inverted window yields 0.
pub fn persistence_bonus(validator: &Validator, now: DateTime<Utc>) -> f64 {
    let total_ms = (validator.end_time - validator.start_time).num_milliseconds();
    if total_ms <= 0 {
        return 0.0;
    }
    let elapsed_ms = (now - validator.start_time).num_milliseconds();
    (elapsed_ms as f64 / total_ms as f64).clamp(0.0, 1.0)
}
