// crates/nexus-core/src/validator.rs
//
// Validator records: staking participants scored by the PoTC formula.
//
// A validator is created with a zero score and zeroed counters, then mutated
// by score recomputation, vote attribution, and slashing. Validators are
// never deleted in normal operation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NexusError;

/// Lifecycle status of a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorStatus {
    /// Eligible for scoring, proposing, and voting.
    Active,
    /// Reached the slashing-event threshold. Terminal.
    Slashed,
    /// Commitment window has ended. Derived from `end_time` by query filters.
    Expired,
}

impl ValidatorStatus {
    /// Stable lowercase tag, used in storage keys and text output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorStatus::Active => "active",
            ValidatorStatus::Slashed => "slashed",
            ValidatorStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ValidatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staking participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    /// Store-assigned row id.
    pub id: u64,
    /// Unique validator identifier (e.g. "validator_1").
    pub validator_id: String,
    /// Backing node reference.
    pub node_id: String,
    /// Staked amount in whole tokens.
    pub stake_amount: u64,
    /// Commitment duration in minutes.
    pub commitment_duration: u64,
    /// Commitment window start.
    pub start_time: DateTime<Utc>,
    /// Commitment window end.
    pub end_time: DateTime<Utc>,
    /// Uptime percentage in [0, 100].
    pub uptime: f64,
    /// Reputation score in [0, 100].
    pub reputation: f64,
    /// Last computed PoTC score.
    pub potc_score: u64,
    pub status: ValidatorStatus,
    pub blocks_proposed: u64,
    pub blocks_validated: u64,
    pub slashing_events: u32,
    pub last_activity: DateTime<Utc>,
}

impl Validator {
    /// Whether the commitment window is still open at `now`.
    pub fn is_committed_at(&self, now: DateTime<Utc>) -> bool {
        self.end_time >= now
    }

    /// Status as seen by query filters: an active validator whose commitment
    /// has ended reads as `Expired`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ValidatorStatus {
        match self.status {
            ValidatorStatus::Active if !self.is_committed_at(now) => ValidatorStatus::Expired,
            other => other,
        }
    }

    /// Active and not yet past the end of its commitment window.
    pub fn is_eligible_at(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == ValidatorStatus::Active
    }
}

/// Validator creation payload: the validator shape minus generated fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewValidator {
    pub validator_id: String,
    pub node_id: String,
    pub stake_amount: u64,
    /// Commitment duration in minutes.
    pub commitment_duration: u64,
    /// Commitment end. Defaults to start + duration.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_percentage")]
    pub uptime: f64,
    #[serde(default = "default_percentage")]
    pub reputation: f64,
    #[serde(default = "default_status")]
    pub status: ValidatorStatus,
}

fn default_percentage() -> f64 {
    100.0
}

fn default_status() -> ValidatorStatus {
    ValidatorStatus::Active
}

impl NewValidator {
    /// Check entity invariants before the record is assigned an id.
    pub fn validate(&self) -> Result<(), NexusError> {
        if self.validator_id.trim().is_empty() {
            return Err(NexusError::Validation("validatorId must not be empty".to_string()));
        }
        if !(0.0..=100.0).contains(&self.uptime) {
            return Err(NexusError::Validation(format!(
                "uptime {} is outside [0, 100]",
                self.uptime
            )));
        }
        if !(0.0..=100.0).contains(&self.reputation) {
            return Err(NexusError::Validation(format!(
                "reputation {} is outside [0, 100]",
                self.reputation
            )));
        }
        Ok(())
    }

    /// Materialize the full record with a zero score and zeroed counters.
    pub fn into_validator(self, id: u64, now: DateTime<Utc>) -> Validator {
        let end_time = self.end_time.unwrap_or_else(|| {
            i64::try_from(self.commitment_duration)
                .ok()
                .and_then(Duration::try_minutes)
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });

        Validator {
            id,
            validator_id: self.validator_id,
            node_id: self.node_id,
            stake_amount: self.stake_amount,
            commitment_duration: self.commitment_duration,
            start_time: now,
            end_time,
            uptime: self.uptime,
            reputation: self.reputation,
            potc_score: 0,
            status: self.status,
            blocks_proposed: 0,
            blocks_validated: 0,
            slashing_events: 0,
            last_activity: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_validator() -> NewValidator {
        NewValidator {
            validator_id: "validator_1".to_string(),
            node_id: "validator_node_1".to_string(),
            stake_amount: 50_000,
            commitment_duration: 1440,
            end_time: None,
            uptime: 99.5,
            reputation: 95.0,
            status: ValidatorStatus::Active,
        }
    }

    #[test]
    fn test_into_validator_defaults_end_time_from_duration() {
        let now = Utc::now();
        let v = new_validator().into_validator(7, now);
        assert_eq!(v.id, 7);
        assert_eq!(v.potc_score, 0);
        assert_eq!(v.start_time, now);
        assert_eq!(v.end_time, now + Duration::minutes(1440));
        assert_eq!(v.slashing_events, 0);
    }

    #[test]
    fn test_validate_rejects_out_of_range_reputation() {
        let mut nv = new_validator();
        nv.reputation = 120.0;
        assert!(matches!(nv.validate(), Err(NexusError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let mut nv = new_validator();
        nv.validator_id = "  ".to_string();
        assert!(nv.validate().is_err());
    }

    #[test]
    fn test_effective_status_expired_after_end() {
        let now = Utc::now();
        let mut v = new_validator().into_validator(1, now);
        v.end_time = now - Duration::minutes(1);
        assert_eq!(v.effective_status(now), ValidatorStatus::Expired);
        assert!(!v.is_eligible_at(now));

        v.status = ValidatorStatus::Slashed;
        assert_eq!(v.effective_status(now), ValidatorStatus::Slashed);
    }

    #[test]
    fn test_camel_case_wire_format() {
        let v = new_validator().into_validator(1, Utc::now());
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["validatorId"], "validator_1");
        assert_eq!(json["potcScore"], 0);
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn test_new_validator_deserializes_with_defaults() {
        let nv: NewValidator = serde_json::from_str(
            r#"{"validatorId":"v","nodeId":"n","stakeAmount":10,"commitmentDuration":60}"#,
        )
        .unwrap();
        assert_eq!(nv.uptime, 100.0);
        assert_eq!(nv.status, ValidatorStatus::Active);
        assert!(nv.end_time.is_none());
    }
}
