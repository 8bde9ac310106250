// crates/nexus-consensus/src/engine.rs
//
// PoTC consensus engine.
//
// Drives the round lifecycle against a `ConsensusStore`:
//   1. Refresh scores of active validators
//   2. Select a score-weighted proposer and snapshot participants
//   3. Collect votes (simulated from reputation, or submitted externally)
//   4. Finalize: tally vote power and record the outcome
//
// The engine owns the round counter and the RNG. Store writes are
// independent per-row updates; there are no transactions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use nexus_core::error::NexusError;
use nexus_core::token::{block_hash_token, signature_token};
use nexus_core::traits::{ConsensusStore, PeriodicTask};
use nexus_core::{
    ConsensusRound, NewConsensusRound, NewValidatorVote, RoundPhase, Validator, ValidatorStatus,
    ValidatorVote, VoteValue,
};

use crate::params::ConsensusParams;
use crate::round::{simulate_vote, tally_votes};
use crate::scoring::calculate_potc_score;
use crate::selection::{order_by_score, select_weighted};
use crate::slashing::{apply_slash, SlashResult};

/// Outcome of one `run_simulation` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// A round was started, voted on, and finalized.
    Completed(ConsensusRound),
    /// No round could start (no proposer or too few participants).
    NoRound,
    /// Another simulation was in progress; nothing was done.
    AlreadyRunning,
}

/// Aggregate consensus statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusStats {
    pub total_rounds: u64,
    pub successful_rounds: u64,
    /// Percentage of finalized rounds that reached consensus.
    pub success_rate: f64,
    /// Last round number issued by the engine.
    pub current_round: u64,
    pub top_validators: Vec<Validator>,
    pub is_simulation_running: bool,
}

/// Clears the running flag when a simulation ends, including on error.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct PotcEngine<S: ConsensusStore + ?Sized> {
    store: Arc<S>,
    params: ConsensusParams,
    rng: Mutex<StdRng>,
    round_counter: AtomicU64,
    running: AtomicBool,
}

impl<S: ConsensusStore + ?Sized> PotcEngine<S> {
    /// Create an engine with an entropy-seeded RNG.
    pub fn new(store: Arc<S>, params: ConsensusParams) -> Self {
        Self::with_rng(store, params, StdRng::from_entropy())
    }

    /// Create an engine with a deterministic RNG.
    pub fn with_seed(store: Arc<S>, params: ConsensusParams, seed: u64) -> Self {
        Self::with_rng(store, params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: Arc<S>, params: ConsensusParams, rng: StdRng) -> Self {
        Self {
            store,
            params,
            rng: Mutex::new(rng),
            round_counter: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// Last round number issued.
    pub fn current_round(&self) -> u64 {
        self.round_counter.load(Ordering::SeqCst)
    }

    pub fn is_simulation_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Continue numbering from the highest persisted round.
    pub async fn resume_round_counter(&self) -> Result<u64, NexusError> {
        let latest = self.store.latest_round_number().await?;
        self.round_counter.fetch_max(latest, Ordering::SeqCst);
        Ok(self.current_round())
    }

    fn with_rng_locked<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T, NexusError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| NexusError::Consensus("engine RNG lock poisoned".to_string()))?;
        Ok(f(&mut rng))
    }

    /// Recompute and persist the score of every `active` validator.
    ///
    /// Returns the number of validators updated.
    pub async fn update_validator_scores(&self) -> Result<usize, NexusError> {
        let now = Utc::now();
        let validators = self
            .store
            .list_validators_by_status(ValidatorStatus::Active)
            .await?;

        let mut updated = 0;
        for mut validator in validators {
            validator.potc_score = calculate_potc_score(&validator, now);
            self.store.save_validator(&validator).await?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Active, unexpired validators ordered by score (highest first).
    pub async fn eligible_validators(&self) -> Result<Vec<Validator>, NexusError> {
        let now = Utc::now();
        let mut eligible: Vec<Validator> = self
            .store
            .list_validators_by_status(ValidatorStatus::Active)
            .await?
            .into_iter()
            .filter(|v| v.is_eligible_at(now))
            .collect();
        order_by_score(&mut eligible);
        Ok(eligible)
    }

    /// Refresh scores, then pick a proposer weighted by score.
    pub async fn select_proposer(&self) -> Result<Option<Validator>, NexusError> {
        self.update_validator_scores().await?;
        let eligible = self.eligible_validators().await?;
        self.with_rng_locked(|rng| select_weighted(&eligible, rng).cloned())
    }

    /// Start a new round. Returns `None` when there is no proposer or too
    /// few validators meet the participation score.
    pub async fn start_round(&self) -> Result<Option<ConsensusRound>, NexusError> {
        let Some(mut proposer) = self.select_proposer().await? else {
            tracing::warn!("No eligible proposer, skipping round");
            return Ok(None);
        };

        let participants: Vec<Validator> = self
            .eligible_validators()
            .await?
            .into_iter()
            .filter(|v| v.potc_score >= self.params.min_participant_score)
            .collect();

        if participants.len() < self.params.min_validators {
            tracing::warn!(
                "Only {} validators meet score {}, need {}",
                participants.len(),
                self.params.min_participant_score,
                self.params.min_validators
            );
            return Ok(None);
        }

        let potc_threshold = participants
            .iter()
            .map(|v| v.potc_score)
            .min()
            .unwrap_or(0);

        let round_number = self.round_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let block_hash = self.with_rng_locked(|rng| {
            block_hash_token(round_number, &proposer.validator_id, rng)
        })?;

        let round = self
            .store
            .insert_round(NewConsensusRound {
                round_number,
                proposer_validator_id: proposer.validator_id.clone(),
                block_hash,
                validator_participants: participants
                    .iter()
                    .map(|v| v.validator_id.clone())
                    .collect(),
                potc_threshold,
            })
            .await?;

        proposer.blocks_proposed += 1;
        proposer.last_activity = Utc::now();
        self.store.save_validator(&proposer).await?;

        tracing::info!(
            "Started round {} (proposer {}, {} participants)",
            round.round_number,
            round.proposer_validator_id,
            round.validator_participants.len()
        );
        Ok(Some(round))
    }

    /// Record a vote. Returns `false` for an unknown validator or a repeat
    /// vote in the same round; the first vote stands.
    pub async fn submit_vote(
        &self,
        round_id: u64,
        validator_id: &str,
        vote: VoteValue,
    ) -> Result<bool, NexusError> {
        let Some(mut validator) = self.store.get_validator(validator_id).await? else {
            return Ok(false);
        };

        let mut round = self
            .store
            .get_round(round_id)
            .await?
            .ok_or_else(|| NexusError::NotFound(format!("round {}", round_id)))?;

        if round.is_finalized() {
            return Err(NexusError::InvalidState(format!(
                "round {} is already finalized",
                round.round_number
            )));
        }

        let existing = self.store.votes_for_round(round_id).await?;
        if existing.iter().any(|v| v.validator_id == validator_id) {
            tracing::debug!("Ignoring repeat vote by {} in round {}", validator_id, round_id);
            return Ok(false);
        }

        let signature = self.with_rng_locked(|rng| signature_token(rng))?;
        self.store
            .insert_vote(NewValidatorVote {
                round_id,
                validator_id: validator_id.to_string(),
                vote,
                vote_power: validator.potc_score,
                signature,
            })
            .await?;

        validator.blocks_validated += 1;
        validator.last_activity = Utc::now();
        self.store.save_validator(&validator).await?;

        if round.phase == RoundPhase::Started {
            round.phase = RoundPhase::VotesCast;
            self.store.save_round(&round).await?;
        }
        Ok(true)
    }

    /// Cast a reputation-weighted vote for every participant that still
    /// exists. Returns the number of votes recorded.
    pub async fn simulate_votes(&self, round_id: u64) -> Result<usize, NexusError> {
        let round = self
            .store
            .get_round(round_id)
            .await?
            .ok_or_else(|| NexusError::NotFound(format!("round {}", round_id)))?;

        let mut recorded = 0;
        for validator_id in &round.validator_participants {
            let Some(validator) = self.store.get_validator(validator_id).await? else {
                continue;
            };
            let vote = self.with_rng_locked(|rng| simulate_vote(validator.reputation, rng))?;
            if self.submit_vote(round_id, validator_id, vote).await? {
                recorded += 1;
            }
        }
        Ok(recorded)
    }

    /// Tally votes and close the round.
    pub async fn finalize_round(&self, round_id: u64) -> Result<ConsensusRound, NexusError> {
        let mut round = self
            .store
            .get_round(round_id)
            .await?
            .ok_or_else(|| NexusError::NotFound(format!("round {}", round_id)))?;

        if round.is_finalized() {
            return Err(NexusError::InvalidState(format!(
                "round {} is already finalized",
                round.round_number
            )));
        }

        let votes = self.store.votes_for_round(round_id).await?;
        let tally = tally_votes(&votes, self.params.consensus_threshold);

        let elapsed_ms = (Utc::now() - round.timestamp).num_milliseconds().max(0) as u64;
        round.consensus_reached = tally.consensus_reached;
        round.votes_for = tally.votes_for;
        round.votes_against = tally.votes_against;
        round.round_duration = Some(elapsed_ms);
        round.phase = RoundPhase::Finalized;
        self.store.save_round(&round).await?;

        if tally.consensus_reached {
            tracing::info!(
                "Consensus reached for round {}: {:.1}%",
                round.round_number,
                tally.for_percentage
            );
        } else {
            tracing::info!(
                "Round {} finalized without consensus: {:.1}%",
                round.round_number,
                tally.for_percentage
            );
        }
        Ok(round)
    }

    /// Apply a slashing event to a validator and persist it.
    pub async fn slash_validator(
        &self,
        validator_id: &str,
        reason: &str,
    ) -> Result<SlashResult, NexusError> {
        let mut validator = self
            .store
            .get_validator(validator_id)
            .await?
            .ok_or_else(|| NexusError::NotFound(format!("validator {}", validator_id)))?;

        let result = apply_slash(&mut validator, reason, &self.params);
        self.store.save_validator(&validator).await?;

        tracing::warn!(
            "Slashed validator {}: {} (events={}, status={})",
            validator_id,
            reason,
            result.slashing_events,
            result.status
        );
        Ok(result)
    }

    /// Run one full round: start, simulate votes, finalize.
    ///
    /// Only one simulation runs at a time; a concurrent call returns
    /// `AlreadyRunning` immediately.
    pub async fn run_simulation(&self) -> Result<SimulationOutcome, NexusError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(SimulationOutcome::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        tracing::info!("Starting PoTC consensus simulation");
        let started = Instant::now();

        let Some(round) = self.start_round().await? else {
            return Ok(SimulationOutcome::NoRound);
        };

        pause(self.params.vote_delay_ms).await;
        let votes = self.simulate_votes(round.id).await?;

        pause(self.params.finalize_delay_ms).await;
        let finalized = self.finalize_round(round.id).await?;

        tracing::debug!(
            "Round {} simulated with {} votes in {:?}",
            finalized.round_number,
            votes,
            started.elapsed()
        );
        Ok(SimulationOutcome::Completed(finalized))
    }

    /// Most recent rounds, newest first.
    pub async fn recent_rounds(&self, limit: usize) -> Result<Vec<ConsensusRound>, NexusError> {
        self.store.recent_rounds(limit).await
    }

    /// Votes cast in a round.
    pub async fn round_votes(&self, round_id: u64) -> Result<Vec<ValidatorVote>, NexusError> {
        self.store.votes_for_round(round_id).await
    }

    /// Success statistics over all persisted rounds plus the top validators.
    pub async fn consensus_stats(&self) -> Result<ConsensusStats, NexusError> {
        let rounds = self.store.list_rounds().await?;
        let finalized: Vec<&ConsensusRound> = rounds.iter().filter(|r| r.is_finalized()).collect();
        let total_rounds = rounds.len() as u64;
        let successful_rounds = finalized.iter().filter(|r| r.consensus_reached).count() as u64;
        let success_rate = if finalized.is_empty() {
            0.0
        } else {
            successful_rounds as f64 / finalized.len() as f64 * 100.0
        };

        let mut top_validators = self
            .store
            .list_validators_by_status(ValidatorStatus::Active)
            .await?;
        order_by_score(&mut top_validators);
        top_validators.truncate(self.params.top_validators_limit);

        Ok(ConsensusStats {
            total_rounds,
            successful_rounds,
            success_rate,
            current_round: self.current_round(),
            top_validators,
            is_simulation_running: self.is_simulation_running(),
        })
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Periodic task: refresh scores and run one simulated round.
pub struct ConsensusSimulationTask<S: ConsensusStore + ?Sized> {
    engine: Arc<PotcEngine<S>>,
}

impl<S: ConsensusStore + ?Sized> ConsensusSimulationTask<S> {
    pub fn new(engine: Arc<PotcEngine<S>>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<S: ConsensusStore + ?Sized + 'static> PeriodicTask for ConsensusSimulationTask<S> {
    fn name(&self) -> &'static str {
        "consensus-simulation"
    }

    async fn tick(&self) -> Result<(), NexusError> {
        let updated = self.engine.update_validator_scores().await?;
        tracing::debug!("Refreshed {} validator scores", updated);

        match self.engine.run_simulation().await? {
            SimulationOutcome::Completed(round) => tracing::info!(
                "Round {} complete: consensus={} for={} against={}",
                round.round_number,
                round.consensus_reached,
                round.votes_for,
                round.votes_against
            ),
            SimulationOutcome::NoRound => tracing::info!("No round started this tick"),
            SimulationOutcome::AlreadyRunning => {
                tracing::debug!("Previous simulation still running")
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use nexus_core::NewValidator;
    use nexus_store::MemoryStore;

    async fn add_validator(store: &MemoryStore, id: &str, stake: u64, reputation: f64) {
        let v = store
            .create_validator(NewValidator {
                validator_id: id.to_string(),
                node_id: format!("{}_node", id),
                stake_amount: stake,
                commitment_duration: 1440,
                end_time: None,
                uptime: 100.0,
                reputation,
                status: ValidatorStatus::Active,
            })
            .await
            .unwrap();
        let mut v = v;
        v.start_time = Utc::now() - ChronoDuration::minutes(720);
        v.end_time = v.start_time + ChronoDuration::minutes(1440);
        store.save_validator(&v).await.unwrap();
    }

    async fn engine_with(ids: &[(&str, u64, f64)]) -> PotcEngine<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (id, stake, reputation) in ids {
            add_validator(&store, id, *stake, *reputation).await;
        }
        PotcEngine::with_seed(store, ConsensusParams::without_delays(), 42)
    }

    #[tokio::test]
    async fn test_update_scores_only_touches_active() {
        let engine = engine_with(&[("a", 50_000, 100.0), ("b", 20_000, 100.0)]).await;
        let mut b = engine.store().get_validator("b").await.unwrap().unwrap();
        b.status = ValidatorStatus::Slashed;
        engine.store().save_validator(&b).await.unwrap();

        assert_eq!(engine.update_validator_scores().await.unwrap(), 1);
        let a = engine.store().get_validator("a").await.unwrap().unwrap();
        let b = engine.store().get_validator("b").await.unwrap().unwrap();
        assert!(a.potc_score > 0);
        assert_eq!(b.potc_score, 0);
    }

    #[tokio::test]
    async fn test_start_round_needs_min_validators() {
        let engine = engine_with(&[("a", 50_000, 100.0), ("b", 50_000, 100.0)]).await;
        assert!(engine.start_round().await.unwrap().is_none());
        assert!(engine.store().list_rounds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_round_with_no_validators() {
        let engine = engine_with(&[]).await;
        assert!(engine.select_proposer().await.unwrap().is_none());
        assert!(engine.start_round().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_round_snapshots_participants() {
        let engine = engine_with(&[
            ("a", 30_000, 100.0),
            ("b", 90_000, 100.0),
            ("c", 60_000, 100.0),
            ("tiny", 1, 100.0),
        ])
        .await;

        let round = engine.start_round().await.unwrap().unwrap();
        assert_eq!(round.round_number, 1);
        assert_eq!(round.phase, RoundPhase::Started);
        assert!(!round.consensus_reached);
        assert_eq!(round.validator_participants, vec!["b", "c", "a"]);

        let a = engine.store().get_validator("a").await.unwrap().unwrap();
        assert_eq!(round.potc_threshold, a.potc_score);

        let proposer = engine
            .store()
            .get_validator(&round.proposer_validator_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(proposer.blocks_proposed, 1);
    }

    #[tokio::test]
    async fn test_round_numbers_strictly_increase() {
        let engine = engine_with(&[
            ("a", 50_000, 100.0),
            ("b", 50_000, 100.0),
            ("c", 50_000, 100.0),
        ])
        .await;

        let mut last = 0;
        for _ in 0..5 {
            let round = engine.start_round().await.unwrap().unwrap();
            assert!(round.round_number > last);
            last = round.round_number;
        }
    }

    #[tokio::test]
    async fn test_resume_round_counter_from_store() {
        let store = Arc::new(MemoryStore::new());
        for id in ["a", "b", "c"] {
            add_validator(&store, id, 50_000, 100.0).await;
        }
        let first = PotcEngine::with_seed(store.clone(), ConsensusParams::without_delays(), 1);
        first.start_round().await.unwrap().unwrap();
        first.start_round().await.unwrap().unwrap();

        let second = PotcEngine::with_seed(store, ConsensusParams::without_delays(), 2);
        assert_eq!(second.resume_round_counter().await.unwrap(), 2);
        let round = second.start_round().await.unwrap().unwrap();
        assert_eq!(round.round_number, 3);
    }

    #[tokio::test]
    async fn test_submit_vote_rules() {
        let engine = engine_with(&[
            ("a", 50_000, 100.0),
            ("b", 50_000, 100.0),
            ("c", 50_000, 100.0),
        ])
        .await;
        let round = engine.start_round().await.unwrap().unwrap();

        assert!(!engine.submit_vote(round.id, "ghost", VoteValue::For).await.unwrap());
        assert!(matches!(
            engine.submit_vote(999, "a", VoteValue::For).await,
            Err(NexusError::NotFound(_))
        ));

        assert!(engine.submit_vote(round.id, "a", VoteValue::For).await.unwrap());
        assert!(!engine.submit_vote(round.id, "a", VoteValue::Against).await.unwrap());

        let votes = engine.round_votes(round.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].vote, VoteValue::For);

        let stored = engine.store().get_round(round.id).await.unwrap().unwrap();
        assert_eq!(stored.phase, RoundPhase::VotesCast);

        let a = engine.store().get_validator("a").await.unwrap().unwrap();
        assert_eq!(a.blocks_validated, 1);
        assert_eq!(votes[0].vote_power, a.potc_score);
    }

    #[tokio::test]
    async fn test_finalized_round_is_closed() {
        let engine = engine_with(&[
            ("a", 50_000, 100.0),
            ("b", 50_000, 100.0),
            ("c", 50_000, 100.0),
        ])
        .await;
        let round = engine.start_round().await.unwrap().unwrap();
        engine.simulate_votes(round.id).await.unwrap();
        let finalized = engine.finalize_round(round.id).await.unwrap();

        assert!(finalized.consensus_reached);
        assert_eq!(finalized.phase, RoundPhase::Finalized);
        assert!(finalized.round_duration.is_some());

        assert!(matches!(
            engine.finalize_round(round.id).await,
            Err(NexusError::InvalidState(_))
        ));
        assert!(matches!(
            engine.submit_vote(round.id, "a", VoteValue::For).await,
            Err(NexusError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_finalize_sums_vote_power() {
        let engine = engine_with(&[
            ("a", 50_000, 100.0),
            ("b", 50_000, 100.0),
            ("c", 50_000, 100.0),
        ])
        .await;
        let round = engine.start_round().await.unwrap().unwrap();
        engine.submit_vote(round.id, "a", VoteValue::For).await.unwrap();
        engine.submit_vote(round.id, "b", VoteValue::Against).await.unwrap();
        engine.submit_vote(round.id, "c", VoteValue::Abstain).await.unwrap();

        let votes = engine.round_votes(round.id).await.unwrap();
        let total: u64 = votes.iter().map(|v| v.vote_power).sum();

        let finalized = engine.finalize_round(round.id).await.unwrap();
        assert_eq!(finalized.votes_for + finalized.votes_against, total);
        assert!(!finalized.consensus_reached);
    }

    #[tokio::test]
    async fn test_finalize_round_with_saturated_scores() {
        let store = Arc::new(MemoryStore::new());
        for id in ["whale_1", "whale_2", "whale_3"] {
            let mut v = store
                .create_validator(NewValidator {
                    validator_id: id.to_string(),
                    node_id: format!("{}_node", id),
                    stake_amount: 1_000_000_000_000_000_000,
                    commitment_duration: 1_000_000,
                    end_time: None,
                    uptime: 100.0,
                    reputation: 100.0,
                    status: ValidatorStatus::Active,
                })
                .await
                .unwrap();
            v.start_time = Utc::now() - ChronoDuration::minutes(500_000);
            v.end_time = v.start_time + ChronoDuration::minutes(1_000_000);
            store.save_validator(&v).await.unwrap();
        }
        let engine = PotcEngine::with_seed(store, ConsensusParams::without_delays(), 9);

        let round = engine.start_round().await.unwrap().unwrap();
        assert_eq!(round.potc_threshold, u64::MAX);
        assert_eq!(engine.simulate_votes(round.id).await.unwrap(), 3);

        let finalized = engine.finalize_round(round.id).await.unwrap();
        assert_eq!(finalized.phase, RoundPhase::Finalized);
        assert!(finalized.consensus_reached);
        assert_eq!(finalized.votes_for, u64::MAX);
        assert_eq!(finalized.votes_against, 0);
    }

    #[tokio::test]
    async fn test_slash_validator() {
        let engine = engine_with(&[("a", 50_000, 90.0)]).await;
        engine.slash_validator("a", "equivocation").await.unwrap();
        let second = engine.slash_validator("a", "equivocation").await.unwrap();
        assert_eq!(second.status, ValidatorStatus::Active);
        assert_eq!(second.reputation_after, 50.0);

        let third = engine.slash_validator("a", "equivocation").await.unwrap();
        assert_eq!(third.status, ValidatorStatus::Slashed);

        assert!(matches!(
            engine.slash_validator("ghost", "x").await,
            Err(NexusError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_run_simulation_completes_round() {
        let engine = engine_with(&[
            ("a", 50_000, 100.0),
            ("b", 50_000, 100.0),
            ("c", 50_000, 100.0),
        ])
        .await;
        let outcome = engine.run_simulation().await.unwrap();
        let SimulationOutcome::Completed(round) = outcome else {
            panic!("expected completed round, got {:?}", outcome);
        };
        assert!(round.consensus_reached);
        assert!(!engine.is_simulation_running());

        let stats = engine.consensus_stats().await.unwrap();
        assert_eq!(stats.total_rounds, 1);
        assert_eq!(stats.successful_rounds, 1);
        assert_eq!(stats.success_rate, 100.0);
        assert_eq!(stats.current_round, 1);
        assert_eq!(stats.top_validators.len(), 3);
    }

    #[tokio::test]
    async fn test_run_simulation_is_not_reentrant() {
        let store = Arc::new(MemoryStore::new());
        for id in ["a", "b", "c"] {
            add_validator(&store, id, 50_000, 100.0).await;
        }
        let params = ConsensusParams {
            vote_delay_ms: 200,
            finalize_delay_ms: 0,
            ..ConsensusParams::default()
        };
        let engine = Arc::new(PotcEngine::with_seed(store, params, 5));

        let background = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.run_simulation().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(engine.is_simulation_running());
        assert_eq!(
            engine.run_simulation().await.unwrap(),
            SimulationOutcome::AlreadyRunning
        );

        let outcome = background.await.unwrap().unwrap();
        assert!(matches!(outcome, SimulationOutcome::Completed(_)));
        assert!(!engine.is_simulation_running());
    }

    #[tokio::test]
    async fn test_stats_with_no_rounds() {
        let engine = engine_with(&[]).await;
        let stats = engine.consensus_stats().await.unwrap();
        assert_eq!(stats.total_rounds, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.top_validators.is_empty());

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["isSimulationRunning"], false);
    }

    #[tokio::test]
    async fn test_simulation_task_tick() {
        let engine = Arc::new(
            engine_with(&[
                ("a", 50_000, 100.0),
                ("b", 50_000, 100.0),
                ("c", 50_000, 100.0),
            ])
            .await,
        );
        let task = ConsensusSimulationTask::new(engine.clone());
        task.tick().await.unwrap();
        task.tick().await.unwrap();
        assert_eq!(engine.store().list_rounds().await.unwrap().len(), 2);
        assert_eq!(task.name(), "consensus-simulation");
    }
}
