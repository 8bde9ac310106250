// crates/nexus-core/src/traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::consensus::{ConsensusRound, NewConsensusRound, NewValidatorVote, ValidatorVote};
use crate::error::NexusError;
use crate::network::{
    NetworkMetrics, NewNetworkMetrics, NewNode, NewTemporalCommitment, NewTrainingJob, Node,
    NodeStatus, NodeType, TemporalCommitment, TrainingJob,
};
use crate::validator::{NewValidator, Validator, ValidatorStatus};

/// Persistent storage for validators, consensus rounds, and votes.
///
/// Implemented by nexus-store (in-memory and RocksDB backends). There are no
/// transactions: each call is an independent read or write, and concurrent
/// read-modify-write sequences are last-write-wins.
#[async_trait]
pub trait ConsensusStore: Send + Sync {
    /// List all validators in row-id order.
    async fn list_validators(&self) -> Result<Vec<Validator>, NexusError>;

    /// List validators with the given stored status, in row-id order.
    async fn list_validators_by_status(
        &self,
        status: ValidatorStatus,
    ) -> Result<Vec<Validator>, NexusError>;

    /// Look up a validator by its `validator_id`.
    async fn get_validator(&self, validator_id: &str) -> Result<Option<Validator>, NexusError>;

    /// Insert a new validator. Fails with `Validation` if the id is taken.
    async fn create_validator(&self, validator: NewValidator) -> Result<Validator, NexusError>;

    /// Overwrite an existing validator row (matched by row id).
    async fn save_validator(&self, validator: &Validator) -> Result<(), NexusError>;

    /// Insert a new round in the `Started` phase.
    async fn insert_round(&self, round: NewConsensusRound) -> Result<ConsensusRound, NexusError>;

    /// Look up a round by row id.
    async fn get_round(&self, id: u64) -> Result<Option<ConsensusRound>, NexusError>;

    /// Overwrite an existing round row.
    async fn save_round(&self, round: &ConsensusRound) -> Result<(), NexusError>;

    /// The most recent `limit` rounds, descending by round number.
    async fn recent_rounds(&self, limit: usize) -> Result<Vec<ConsensusRound>, NexusError>;

    /// All rounds, ascending by round number.
    async fn list_rounds(&self) -> Result<Vec<ConsensusRound>, NexusError>;

    /// Highest persisted round number, or 0 when no rounds exist.
    async fn latest_round_number(&self) -> Result<u64, NexusError>;

    /// Insert a vote.
    async fn insert_vote(&self, vote: NewValidatorVote) -> Result<ValidatorVote, NexusError>;

    /// All votes cast in a round, in insertion order.
    async fn votes_for_round(&self, round_id: u64) -> Result<Vec<ValidatorVote>, NexusError>;
}

/// Persistent storage for the network dashboard records.
#[async_trait]
pub trait NetworkStore: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>, NexusError>;

    async fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, NexusError>;

    async fn create_node(&self, node: NewNode) -> Result<Node, NexusError>;

    /// Insert many nodes at once. Used by demo seeding.
    async fn create_nodes(&self, nodes: Vec<NewNode>) -> Result<usize, NexusError> {
        let count = nodes.len();
        for node in nodes {
            self.create_node(node).await?;
        }
        Ok(count)
    }

    /// Set a node's status and refresh `last_seen`. Returns `None` for unknown ids.
    async fn update_node_status(
        &self,
        node_id: &str,
        status: NodeStatus,
    ) -> Result<Option<Node>, NexusError>;

    async fn list_training_jobs(&self) -> Result<Vec<TrainingJob>, NexusError>;

    /// Jobs in the `training` or `validating` status.
    async fn active_training_jobs(&self) -> Result<Vec<TrainingJob>, NexusError> {
        Ok(self
            .list_training_jobs()
            .await?
            .into_iter()
            .filter(TrainingJob::is_active)
            .collect())
    }

    async fn create_training_job(&self, job: NewTrainingJob) -> Result<TrainingJob, NexusError>;

    /// Set a job's progress and step. Returns `None` for unknown ids.
    async fn update_training_job_progress(
        &self,
        job_id: &str,
        progress: u32,
        current_step: u32,
    ) -> Result<Option<TrainingJob>, NexusError>;

    async fn list_commitments(&self) -> Result<Vec<TemporalCommitment>, NexusError>;

    /// Commitments with status `active` whose end time is after `now`.
    async fn active_commitments(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TemporalCommitment>, NexusError> {
        Ok(self
            .list_commitments()
            .await?
            .into_iter()
            .filter(|c| c.is_active_at(now))
            .collect())
    }

    async fn create_commitment(
        &self,
        commitment: NewTemporalCommitment,
    ) -> Result<TemporalCommitment, NexusError>;

    async fn latest_network_metrics(&self) -> Result<Option<NetworkMetrics>, NexusError>;

    async fn create_network_metrics(
        &self,
        metrics: NewNetworkMetrics,
    ) -> Result<NetworkMetrics, NexusError>;
}

/// A store backing both the consensus engine and the network dashboard.
///
/// Lets the daemon pick a backend at runtime and share it as
/// `Arc<dyn NexusStore>`.
pub trait NexusStore: ConsensusStore + NetworkStore {}

impl<T: ConsensusStore + NetworkStore + ?Sized> NexusStore for T {}

/// A unit of recurring work driven by a scheduler.
///
/// Tests call `tick` directly to step a task deterministically; the daemon's
/// scheduler calls it on an interval.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run one iteration.
    async fn tick(&self) -> Result<(), NexusError>;
}
