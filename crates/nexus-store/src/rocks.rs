// crates/nexus-store/src/rocks.rs
//
// RocksDB-backed persistent store.
//
// Key format:
//   - Rows:       `{table}:{id:020}` -> JSON-serialized record
//   - Sequences:  `seq:{table}` -> last allocated row id (big-endian u64)
//   - Secondary:  `validator_idx:{validator_id}` -> validator row id
//                 `vote_round:{round_id:020}:{vote_id:020}` -> empty value
//
// Zero-padded ids keep prefix scans in row-id order. Id allocation and
// uniqueness checks are serialized by a process-local mutex; there are no
// multi-key transactions.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{DBWithThreadMode, MultiThreaded, Options};
use serde::de::DeserializeOwned;
use serde::Serialize;

use nexus_core::error::NexusError;
use nexus_core::traits::{ConsensusStore, NetworkStore};
use nexus_core::{
    ConsensusRound, NetworkMetrics, NewConsensusRound, NewNetworkMetrics, NewNode,
    NewTemporalCommitment, NewTrainingJob, NewValidator, NewValidatorVote, Node, NodeStatus,
    NodeType, TemporalCommitment, TrainingJob, Validator, ValidatorStatus, ValidatorVote,
};

const VALIDATORS: &str = "validators";
const ROUNDS: &str = "rounds";
const VOTES: &str = "votes";
const NODES: &str = "nodes";
const JOBS: &str = "jobs";
const COMMITMENTS: &str = "commitments";
const METRICS: &str = "metrics";

/// RocksDB wrapper implementing `ConsensusStore` and `NetworkStore`.
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
    sequence_lock: Mutex<()>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore").finish()
    }
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, NexusError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path)
            .map_err(|e| NexusError::Storage(format!("Failed to open RocksDB at {}: {}", path, e)))?;

        Ok(Self {
            db,
            sequence_lock: Mutex::new(()),
        })
    }

    fn row_key(table: &str, id: u64) -> Vec<u8> {
        format!("{}:{:020}", table, id).into_bytes()
    }

    fn validator_index_key(validator_id: &str) -> Vec<u8> {
        format!("validator_idx:{}", validator_id).into_bytes()
    }

    fn vote_round_key(round_id: u64, vote_id: u64) -> Vec<u8> {
        format!("vote_round:{:020}:{:020}", round_id, vote_id).into_bytes()
    }

    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), NexusError> {
        self.db
            .put(key, value)
            .map_err(|e| NexusError::Storage(format!("RocksDB put failed: {}", e)))
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, NexusError> {
        self.db
            .get(key)
            .map_err(|e| NexusError::Storage(format!("RocksDB get failed: {}", e)))
    }

    fn put_row<T: Serialize>(&self, table: &str, id: u64, row: &T) -> Result<(), NexusError> {
        let json = serde_json::to_vec(row)?;
        self.put_raw(&Self::row_key(table, id), &json)
    }

    fn get_row<T: DeserializeOwned>(&self, table: &str, id: u64) -> Result<Option<T>, NexusError> {
        match self.get_raw(&Self::row_key(table, id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Collect every key/value pair under a prefix, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>, NexusError> {
        let mut entries = Vec::new();
        for item in self.db.prefix_iterator(prefix) {
            let (key, value) = item
                .map_err(|e| NexusError::Storage(format!("RocksDB iteration error: {}", e)))?;
            // Stop when the prefix no longer matches.
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key, value));
        }
        Ok(entries)
    }

    fn scan_rows<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, NexusError> {
        let prefix = format!("{}:", table);
        self.scan_prefix(prefix.as_bytes())?
            .into_iter()
            .map(|(_, value)| serde_json::from_slice(&value).map_err(NexusError::from))
            .collect()
    }

    /// Allocate the next row id for a table. Caller must hold `sequence_lock`.
    fn next_id_locked(&self, table: &str) -> Result<u64, NexusError> {
        let key = format!("seq:{}", table).into_bytes();
        let current = match self.get_raw(&key)? {
            Some(bytes) => decode_u64(&bytes)?,
            None => 0,
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| NexusError::Storage(format!("id sequence exhausted for {}", table)))?;
        self.put_raw(&key, &next.to_be_bytes())?;
        Ok(next)
    }

    fn lock_sequences(&self) -> Result<std::sync::MutexGuard<'_, ()>, NexusError> {
        self.sequence_lock
            .lock()
            .map_err(|_| NexusError::Storage("sequence lock poisoned".to_string()))
    }

    /// Allocate an id and write the row built from it.
    fn insert_row<T, F>(&self, table: &str, build: F) -> Result<T, NexusError>
    where
        T: Serialize,
        F: FnOnce(u64) -> T,
    {
        let _guard = self.lock_sequences()?;
        let id = self.next_id_locked(table)?;
        let row = build(id);
        self.put_row(table, id, &row)?;
        Ok(row)
    }

    fn validator_row_id(&self, validator_id: &str) -> Result<Option<u64>, NexusError> {
        match self.get_raw(&Self::validator_index_key(validator_id))? {
            Some(bytes) => Ok(Some(decode_u64(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64, NexusError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| NexusError::Storage("corrupt u64 value".to_string()))?;
    Ok(u64::from_be_bytes(array))
}

#[async_trait]
impl ConsensusStore for RocksStore {
    async fn list_validators(&self) -> Result<Vec<Validator>, NexusError> {
        self.scan_rows(VALIDATORS)
    }

    async fn list_validators_by_status(
        &self,
        status: ValidatorStatus,
    ) -> Result<Vec<Validator>, NexusError> {
        let validators: Vec<Validator> = self.scan_rows(VALIDATORS)?;
        Ok(validators.into_iter().filter(|v| v.status == status).collect())
    }

    async fn get_validator(&self, validator_id: &str) -> Result<Option<Validator>, NexusError> {
        match self.validator_row_id(validator_id)? {
            Some(id) => self.get_row(VALIDATORS, id),
            None => Ok(None),
        }
    }

    async fn create_validator(&self, validator: NewValidator) -> Result<Validator, NexusError> {
        validator.validate()?;
        let _guard = self.lock_sequences()?;
        if self.validator_row_id(&validator.validator_id)?.is_some() {
            return Err(NexusError::Validation(format!(
                "validator {} already exists",
                validator.validator_id
            )));
        }
        let id = self.next_id_locked(VALIDATORS)?;
        let created = validator.into_validator(id, Utc::now());
        self.put_row(VALIDATORS, id, &created)?;
        self.put_raw(
            &Self::validator_index_key(&created.validator_id),
            &id.to_be_bytes(),
        )?;
        Ok(created)
    }

    async fn save_validator(&self, validator: &Validator) -> Result<(), NexusError> {
        if self.get_raw(&Self::row_key(VALIDATORS, validator.id))?.is_none() {
            return Err(NexusError::NotFound(format!("validator row {}", validator.id)));
        }
        self.put_row(VALIDATORS, validator.id, validator)
    }

    async fn insert_round(&self, round: NewConsensusRound) -> Result<ConsensusRound, NexusError> {
        let now = Utc::now();
        self.insert_row(ROUNDS, |id| round.into_round(id, now))
    }

    async fn get_round(&self, id: u64) -> Result<Option<ConsensusRound>, NexusError> {
        self.get_row(ROUNDS, id)
    }

    async fn save_round(&self, round: &ConsensusRound) -> Result<(), NexusError> {
        if self.get_raw(&Self::row_key(ROUNDS, round.id))?.is_none() {
            return Err(NexusError::NotFound(format!("round {}", round.id)));
        }
        self.put_row(ROUNDS, round.id, round)
    }

    async fn recent_rounds(&self, limit: usize) -> Result<Vec<ConsensusRound>, NexusError> {
        let mut rounds: Vec<ConsensusRound> = self.scan_rows(ROUNDS)?;
        rounds.sort_by(|a, b| b.round_number.cmp(&a.round_number));
        rounds.truncate(limit);
        Ok(rounds)
    }

    async fn list_rounds(&self) -> Result<Vec<ConsensusRound>, NexusError> {
        let mut rounds: Vec<ConsensusRound> = self.scan_rows(ROUNDS)?;
        rounds.sort_by_key(|r| r.round_number);
        Ok(rounds)
    }

    async fn latest_round_number(&self) -> Result<u64, NexusError> {
        let rounds: Vec<ConsensusRound> = self.scan_rows(ROUNDS)?;
        Ok(rounds.iter().map(|r| r.round_number).max().unwrap_or(0))
    }

    async fn insert_vote(&self, vote: NewValidatorVote) -> Result<ValidatorVote, NexusError> {
        let now = Utc::now();
        let created = self.insert_row(VOTES, |id| vote.into_vote(id, now))?;
        self.put_raw(&Self::vote_round_key(created.round_id, created.id), &[])?;
        Ok(created)
    }

    async fn votes_for_round(&self, round_id: u64) -> Result<Vec<ValidatorVote>, NexusError> {
        let prefix = format!("vote_round:{:020}:", round_id);
        let mut votes = Vec::new();
        for (key, _) in self.scan_prefix(prefix.as_bytes())? {
            let vote_id = std::str::from_utf8(&key[prefix.len()..])
                .ok()
                .and_then(|s| s.parse::<u64>().ok());
            if let Some(vote_id) = vote_id {
                if let Some(vote) = self.get_row(VOTES, vote_id)? {
                    votes.push(vote);
                }
            }
        }
        Ok(votes)
    }
}

#[async_trait]
impl NetworkStore for RocksStore {
    async fn list_nodes(&self) -> Result<Vec<Node>, NexusError> {
        self.scan_rows(NODES)
    }

    async fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, NexusError> {
        let nodes: Vec<Node> = self.scan_rows(NODES)?;
        Ok(nodes.into_iter().filter(|n| n.node_type == node_type).collect())
    }

    async fn create_node(&self, node: NewNode) -> Result<Node, NexusError> {
        let now = Utc::now();
        self.insert_row(NODES, |id| node.into_node(id, now))
    }

    async fn update_node_status(
        &self,
        node_id: &str,
        status: NodeStatus,
    ) -> Result<Option<Node>, NexusError> {
        let nodes: Vec<Node> = self.scan_rows(NODES)?;
        match nodes.into_iter().find(|n| n.node_id == node_id) {
            Some(mut node) => {
                node.status = status;
                node.last_seen = Utc::now();
                self.put_row(NODES, node.id, &node)?;
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    async fn list_training_jobs(&self) -> Result<Vec<TrainingJob>, NexusError> {
        self.scan_rows(JOBS)
    }

    async fn create_training_job(&self, job: NewTrainingJob) -> Result<TrainingJob, NexusError> {
        let now = Utc::now();
        self.insert_row(JOBS, |id| job.into_job(id, now))
    }

    async fn update_training_job_progress(
        &self,
        job_id: &str,
        progress: u32,
        current_step: u32,
    ) -> Result<Option<TrainingJob>, NexusError> {
        let jobs: Vec<TrainingJob> = self.scan_rows(JOBS)?;
        match jobs.into_iter().find(|j| j.job_id == job_id) {
            Some(mut job) => {
                job.progress = progress;
                job.current_step = current_step;
                self.put_row(JOBS, job.id, &job)?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    async fn list_commitments(&self) -> Result<Vec<TemporalCommitment>, NexusError> {
        self.scan_rows(COMMITMENTS)
    }

    async fn create_commitment(
        &self,
        commitment: NewTemporalCommitment,
    ) -> Result<TemporalCommitment, NexusError> {
        let now = Utc::now();
        self.insert_row(COMMITMENTS, |id| commitment.into_commitment(id, now))
    }

    async fn latest_network_metrics(&self) -> Result<Option<NetworkMetrics>, NexusError> {
        let metrics: Vec<NetworkMetrics> = self.scan_rows(METRICS)?;
        Ok(metrics.into_iter().last())
    }

    async fn create_network_metrics(
        &self,
        metrics: NewNetworkMetrics,
    ) -> Result<NetworkMetrics, NexusError> {
        let now = Utc::now();
        self.insert_row(METRICS, |id| metrics.into_metrics(id, now))
    }
}
