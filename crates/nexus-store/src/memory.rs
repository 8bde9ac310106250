// crates/nexus-store/src/memory.rs
//
// In-memory store implementing `ConsensusStore` and `NetworkStore`.
//
// Each table is a BTreeMap keyed by a per-table row id, so listing in row-id
// order is free. All tables sit behind one RwLock; every trait call takes the
// lock once and releases it before returning.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use nexus_core::error::NexusError;
use nexus_core::traits::{ConsensusStore, NetworkStore};
use nexus_core::{
    ConsensusRound, NetworkMetrics, NewConsensusRound, NewNetworkMetrics, NewNode,
    NewTemporalCommitment, NewTrainingJob, NewValidator, NewValidatorVote, Node, NodeStatus,
    NodeType, TemporalCommitment, TrainingJob, Validator, ValidatorStatus, ValidatorVote,
};

#[derive(Debug, Default)]
struct Tables {
    next_ids: HashMap<&'static str, u64>,
    validators: BTreeMap<u64, Validator>,
    rounds: BTreeMap<u64, ConsensusRound>,
    votes: BTreeMap<u64, ValidatorVote>,
    nodes: BTreeMap<u64, Node>,
    jobs: BTreeMap<u64, TrainingJob>,
    commitments: BTreeMap<u64, TemporalCommitment>,
    metrics: BTreeMap<u64, NetworkMetrics>,
}

impl Tables {
    /// Allocate the next row id for a table, starting at 1.
    fn allocate(&mut self, table: &'static str) -> u64 {
        let next = self.next_ids.entry(table).or_insert(0);
        *next += 1;
        *next
    }
}

/// Volatile store used by default and throughout the test suites.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, NexusError> {
        self.tables
            .read()
            .map_err(|_| NexusError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, NexusError> {
        self.tables
            .write()
            .map_err(|_| NexusError::Storage("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ConsensusStore for MemoryStore {
    async fn list_validators(&self) -> Result<Vec<Validator>, NexusError> {
        Ok(self.read()?.validators.values().cloned().collect())
    }

    async fn list_validators_by_status(
        &self,
        status: ValidatorStatus,
    ) -> Result<Vec<Validator>, NexusError> {
        Ok(self
            .read()?
            .validators
            .values()
            .filter(|v| v.status == status)
            .cloned()
            .collect())
    }

    async fn get_validator(&self, validator_id: &str) -> Result<Option<Validator>, NexusError> {
        Ok(self
            .read()?
            .validators
            .values()
            .find(|v| v.validator_id == validator_id)
            .cloned())
    }

    async fn create_validator(&self, validator: NewValidator) -> Result<Validator, NexusError> {
        validator.validate()?;
        let mut tables = self.write()?;
        if tables
            .validators
            .values()
            .any(|v| v.validator_id == validator.validator_id)
        {
            return Err(NexusError::Validation(format!(
                "validator {} already exists",
                validator.validator_id
            )));
        }
        let id = tables.allocate("validators");
        let created = validator.into_validator(id, Utc::now());
        tables.validators.insert(id, created.clone());
        Ok(created)
    }

    async fn save_validator(&self, validator: &Validator) -> Result<(), NexusError> {
        let mut tables = self.write()?;
        match tables.validators.get_mut(&validator.id) {
            Some(existing) => {
                *existing = validator.clone();
                Ok(())
            }
            None => Err(NexusError::NotFound(format!("validator row {}", validator.id))),
        }
    }

    async fn insert_round(&self, round: NewConsensusRound) -> Result<ConsensusRound, NexusError> {
        let mut tables = self.write()?;
        let id = tables.allocate("rounds");
        let created = round.into_round(id, Utc::now());
        tables.rounds.insert(id, created.clone());
        Ok(created)
    }

    async fn get_round(&self, id: u64) -> Result<Option<ConsensusRound>, NexusError> {
        Ok(self.read()?.rounds.get(&id).cloned())
    }

    async fn save_round(&self, round: &ConsensusRound) -> Result<(), NexusError> {
        let mut tables = self.write()?;
        match tables.rounds.get_mut(&round.id) {
            Some(existing) => {
                *existing = round.clone();
                Ok(())
            }
            None => Err(NexusError::NotFound(format!("round {}", round.id))),
        }
    }

    async fn recent_rounds(&self, limit: usize) -> Result<Vec<ConsensusRound>, NexusError> {
        let mut rounds: Vec<ConsensusRound> = self.read()?.rounds.values().cloned().collect();
        rounds.sort_by(|a, b| b.round_number.cmp(&a.round_number));
        rounds.truncate(limit);
        Ok(rounds)
    }

    async fn list_rounds(&self) -> Result<Vec<ConsensusRound>, NexusError> {
        let mut rounds: Vec<ConsensusRound> = self.read()?.rounds.values().cloned().collect();
        rounds.sort_by_key(|r| r.round_number);
        Ok(rounds)
    }

    async fn latest_round_number(&self) -> Result<u64, NexusError> {
        Ok(self
            .read()?
            .rounds
            .values()
            .map(|r| r.round_number)
            .max()
            .unwrap_or(0))
    }

    async fn insert_vote(&self, vote: NewValidatorVote) -> Result<ValidatorVote, NexusError> {
        let mut tables = self.write()?;
        let id = tables.allocate("votes");
        let created = vote.into_vote(id, Utc::now());
        tables.votes.insert(id, created.clone());
        Ok(created)
    }

    async fn votes_for_round(&self, round_id: u64) -> Result<Vec<ValidatorVote>, NexusError> {
        Ok(self
            .read()?
            .votes
            .values()
            .filter(|v| v.round_id == round_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NetworkStore for MemoryStore {
    async fn list_nodes(&self) -> Result<Vec<Node>, NexusError> {
        Ok(self.read()?.nodes.values().cloned().collect())
    }

    async fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, NexusError> {
        Ok(self
            .read()?
            .nodes
            .values()
            .filter(|n| n.node_type == node_type)
            .cloned()
            .collect())
    }

    async fn create_node(&self, node: NewNode) -> Result<Node, NexusError> {
        let mut tables = self.write()?;
        let id = tables.allocate("nodes");
        let created = node.into_node(id, Utc::now());
        tables.nodes.insert(id, created.clone());
        Ok(created)
    }

    async fn create_nodes(&self, nodes: Vec<NewNode>) -> Result<usize, NexusError> {
        let mut tables = self.write()?;
        let now = Utc::now();
        let count = nodes.len();
        for node in nodes {
            let id = tables.allocate("nodes");
            tables.nodes.insert(id, node.into_node(id, now));
        }
        Ok(count)
    }

    async fn update_node_status(
        &self,
        node_id: &str,
        status: NodeStatus,
    ) -> Result<Option<Node>, NexusError> {
        let mut tables = self.write()?;
        Ok(tables
            .nodes
            .values_mut()
            .find(|n| n.node_id == node_id)
            .map(|node| {
                node.status = status;
                node.last_seen = Utc::now();
                node.clone()
            }))
    }

    async fn list_training_jobs(&self) -> Result<Vec<TrainingJob>, NexusError> {
        Ok(self.read()?.jobs.values().cloned().collect())
    }

    async fn create_training_job(&self, job: NewTrainingJob) -> Result<TrainingJob, NexusError> {
        let mut tables = self.write()?;
        let id = tables.allocate("jobs");
        let created = job.into_job(id, Utc::now());
        tables.jobs.insert(id, created.clone());
        Ok(created)
    }

    async fn update_training_job_progress(
        &self,
        job_id: &str,
        progress: u32,
        current_step: u32,
    ) -> Result<Option<TrainingJob>, NexusError> {
        let mut tables = self.write()?;
        Ok(tables
            .jobs
            .values_mut()
            .find(|j| j.job_id == job_id)
            .map(|job| {
                job.progress = progress;
                job.current_step = current_step;
                job.clone()
            }))
    }

    async fn list_commitments(&self) -> Result<Vec<TemporalCommitment>, NexusError> {
        Ok(self.read()?.commitments.values().cloned().collect())
    }

    async fn active_commitments(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TemporalCommitment>, NexusError> {
        Ok(self
            .read()?
            .commitments
            .values()
            .filter(|c| c.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn create_commitment(
        &self,
        commitment: NewTemporalCommitment,
    ) -> Result<TemporalCommitment, NexusError> {
        let mut tables = self.write()?;
        let id = tables.allocate("commitments");
        let created = commitment.into_commitment(id, Utc::now());
        tables.commitments.insert(id, created.clone());
        Ok(created)
    }

    async fn latest_network_metrics(&self) -> Result<Option<NetworkMetrics>, NexusError> {
        Ok(self.read()?.metrics.values().next_back().cloned())
    }

    async fn create_network_metrics(
        &self,
        metrics: NewNetworkMetrics,
    ) -> Result<NetworkMetrics, NexusError> {
        let mut tables = self.write()?;
        let id = tables.allocate("metrics");
        let created = metrics.into_metrics(id, Utc::now());
        tables.metrics.insert(id, created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::{RoundPhase, VoteValue};

    fn new_validator(id: &str) -> NewValidator {
        NewValidator {
            validator_id: id.to_string(),
            node_id: format!("{}_node", id),
            stake_amount: 10_000,
            commitment_duration: 1440,
            end_time: None,
            uptime: 100.0,
            reputation: 100.0,
            status: ValidatorStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_validator() {
        let store = MemoryStore::new();
        let created = store.create_validator(new_validator("v1")).await.unwrap();
        assert_eq!(created.id, 1);

        let fetched = store.get_validator("v1").await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.get_validator("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_validator_id_rejected() {
        let store = MemoryStore::new();
        store.create_validator(new_validator("v1")).await.unwrap();
        let err = store.create_validator(new_validator("v1")).await.unwrap_err();
        assert!(matches!(err, NexusError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_by_status_filters() {
        let store = MemoryStore::new();
        store.create_validator(new_validator("v1")).await.unwrap();
        let mut v2 = store.create_validator(new_validator("v2")).await.unwrap();
        v2.status = ValidatorStatus::Slashed;
        store.save_validator(&v2).await.unwrap();

        let active = store
            .list_validators_by_status(ValidatorStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].validator_id, "v1");
    }

    #[tokio::test]
    async fn test_save_unknown_validator_is_not_found() {
        let store = MemoryStore::new();
        let ghost = new_validator("ghost").into_validator(42, Utc::now());
        let err = store.save_validator(&ghost).await.unwrap_err();
        assert!(matches!(err, NexusError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_recent_rounds_descending_and_limited() {
        let store = MemoryStore::new();
        for n in 1..=5 {
            store
                .insert_round(NewConsensusRound {
                    round_number: n,
                    proposer_validator_id: "v1".to_string(),
                    block_hash: format!("hash{}", n),
                    validator_participants: vec![],
                    potc_threshold: 0,
                })
                .await
                .unwrap();
        }
        let recent = store.recent_rounds(3).await.unwrap();
        let numbers: Vec<u64> = recent.iter().map(|r| r.round_number).collect();
        assert_eq!(numbers, vec![5, 4, 3]);
        assert_eq!(store.latest_round_number().await.unwrap(), 5);
        assert_eq!(recent[0].phase, RoundPhase::Started);
    }

    #[tokio::test]
    async fn test_votes_grouped_by_round() {
        let store = MemoryStore::new();
        for (round_id, validator) in [(1, "a"), (2, "b"), (1, "c")] {
            store
                .insert_vote(NewValidatorVote {
                    round_id,
                    validator_id: validator.to_string(),
                    vote: VoteValue::For,
                    vote_power: 10,
                    signature: "sig".to_string(),
                })
                .await
                .unwrap();
        }
        let votes = store.votes_for_round(1).await.unwrap();
        let ids: Vec<&str> = votes.iter().map(|v| v.validator_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_update_node_status_and_unknown_node() {
        let store = MemoryStore::new();
        store
            .create_node(NewNode {
                node_id: "compute_1".to_string(),
                node_type: NodeType::Compute,
                status: NodeStatus::Active,
                metadata: serde_json::Value::Null,
            })
            .await
            .unwrap();

        let updated = store
            .update_node_status("compute_1", NodeStatus::Inactive)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, NodeStatus::Inactive);
        assert!(store
            .update_node_status("compute_404", NodeStatus::Active)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_latest_metrics_is_last_inserted() {
        let store = MemoryStore::new();
        assert!(store.latest_network_metrics().await.unwrap().is_none());
        for total in [10, 20] {
            store
                .create_network_metrics(NewNetworkMetrics {
                    total_nodes: total,
                    active_jobs: 0,
                    total_commitments: 0,
                    active_commitments: 0,
                    network_power: 0,
                    metrics: serde_json::Value::Null,
                })
                .await
                .unwrap();
        }
        let latest = store.latest_network_metrics().await.unwrap().unwrap();
        assert_eq!(latest.total_nodes, 20);
    }
}
