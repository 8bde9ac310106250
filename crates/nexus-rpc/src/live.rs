// crates/nexus-rpc/src/live.rs
//
// Live dashboard channel.
//
// `LiveUpdateTask` nudges training-job progress and node statuses on each
// tick, then broadcasts a snapshot. Subscribers (WebSocket clients) receive
// messages over a `tokio::sync::broadcast` channel; a lagging subscriber skips
// what it missed.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use nexus_core::{
    NetworkStore, NexusError, Node, NodeStatus, NodeType, PeriodicTask, TemporalCommitment,
    TrainingJob, MAX_TRAINING_STEP,
};

/// Capacity of the live broadcast channel.
pub const LIVE_CHANNEL_CAPACITY: usize = 64;

/// Chance per tick that an active job advances.
const PROGRESS_PROBABILITY: f64 = 0.3;

/// Upper bound (exclusive) of a single progress gain, in percent.
const MAX_PROGRESS_GAIN: f64 = 2.0;

/// Chance per tick that a random node flips status.
const NODE_TOGGLE_PROBABILITY: f64 = 0.05;

pub const CONNECTED_MESSAGE: &str = "Connected to NexusLinkAI network";

/// Messages pushed to live subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    Connected { message: String },
    LiveUpdate { data: LiveSnapshot },
    TrainingJobCreated { data: TrainingJob },
    TemporalCommitmentCreated { data: TemporalCommitment },
}

impl LiveMessage {
    pub fn connected() -> Self {
        LiveMessage::Connected {
            message: CONNECTED_MESSAGE.to_string(),
        }
    }
}

/// Total and active node counts for one node type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    pub total: u64,
    pub active: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub node_stats: BTreeMap<NodeType, TypeStats>,
    pub training_jobs: Vec<TrainingJob>,
    pub commitment_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// Create the live broadcast sender. Subscribers call `subscribe()` on it.
pub fn live_channel() -> broadcast::Sender<LiveMessage> {
    let (tx, _rx) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
    tx
}

/// Per-type node counts. Every node type appears, with zeros if absent.
pub fn count_nodes(nodes: &[Node]) -> BTreeMap<NodeType, TypeStats> {
    let mut stats: BTreeMap<NodeType, TypeStats> = NodeType::ALL
        .iter()
        .map(|t| (*t, TypeStats::default()))
        .collect();
    for node in nodes {
        let entry = stats.entry(node.node_type).or_default();
        entry.total += 1;
        if node.status == NodeStatus::Active {
            entry.active += 1;
        }
    }
    stats
}

/// Next (progress, step) after a gain of `gain` percent.
///
/// Progress is floored and capped at 100. The step advances by one (capped)
/// only when progress grew by more than one point.
pub fn advance_progress(progress: u32, step: u32, gain: f64) -> (u32, u32) {
    let current = progress as f64;
    let next = (current + gain).min(100.0);
    let next_step = if next > current + 1.0 {
        (step + 1).min(MAX_TRAINING_STEP)
    } else {
        step
    };
    (next.floor() as u32, next_step)
}

/// Periodic task that simulates dashboard activity and broadcasts snapshots.
pub struct LiveUpdateTask<S: NetworkStore + ?Sized> {
    store: Arc<S>,
    tx: broadcast::Sender<LiveMessage>,
    rng: Mutex<StdRng>,
}

impl<S: NetworkStore + ?Sized> LiveUpdateTask<S> {
    pub fn new(store: Arc<S>, tx: broadcast::Sender<LiveMessage>, rng: StdRng) -> Self {
        Self {
            store,
            tx,
            rng: Mutex::new(rng),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T, NexusError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| NexusError::Consensus("live RNG lock poisoned".to_string()))?;
        Ok(f(&mut rng))
    }

    async fn advance_jobs(&self) -> Result<usize, NexusError> {
        let mut advanced = 0;
        for job in self.store.active_training_jobs().await? {
            if job.progress >= 100 {
                continue;
            }
            let gain = self.with_rng(|rng| {
                rng.gen_bool(PROGRESS_PROBABILITY)
                    .then(|| rng.gen_range(0.0..MAX_PROGRESS_GAIN))
            })?;
            let Some(gain) = gain else { continue };

            let (progress, step) = advance_progress(job.progress, job.current_step, gain);
            self.store
                .update_training_job_progress(&job.job_id, progress, step)
                .await?;
            advanced += 1;
        }
        Ok(advanced)
    }

    async fn maybe_toggle_node(&self, nodes: &[Node]) -> Result<Option<Node>, NexusError> {
        if nodes.is_empty() {
            return Ok(None);
        }
        let pick = self.with_rng(|rng| {
            let index = rng.gen_range(0..nodes.len());
            rng.gen_bool(NODE_TOGGLE_PROBABILITY).then_some(index)
        })?;
        match pick {
            Some(index) => {
                let node = &nodes[index];
                self.store
                    .update_node_status(&node.node_id, node.status.toggled())
                    .await
            }
            None => Ok(None),
        }
    }

    /// Build a snapshot of the current dashboard state.
    pub async fn snapshot(&self) -> Result<LiveSnapshot, NexusError> {
        let now = Utc::now();
        let nodes = self.store.list_nodes().await?;
        Ok(LiveSnapshot {
            node_stats: count_nodes(&nodes),
            training_jobs: self.store.list_training_jobs().await?,
            commitment_count: self.store.active_commitments(now).await?.len() as u64,
            timestamp: now,
        })
    }
}

#[async_trait]
impl<S: NetworkStore + ?Sized + 'static> PeriodicTask for LiveUpdateTask<S> {
    fn name(&self) -> &'static str {
        "live-update"
    }

    async fn tick(&self) -> Result<(), NexusError> {
        let advanced = self.advance_jobs().await?;

        let nodes = self.store.list_nodes().await?;
        if let Some(node) = self.maybe_toggle_node(&nodes).await? {
            tracing::debug!("Node {} is now {:?}", node.node_id, node.status);
        }

        let snapshot = self.snapshot().await?;
        tracing::trace!(
            "Live update: {} jobs advanced, {} active commitments",
            advanced,
            snapshot.commitment_count
        );
        // No subscribers is not an error.
        let _ = self.tx.send(LiveMessage::LiveUpdate { data: snapshot });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use nexus_core::{NewNode, NewTemporalCommitment, NewTrainingJob};
    use nexus_store::MemoryStore;
    use rand::SeedableRng;

    async fn store_with_jobs() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (job_id, status, progress) in [("job_a", "training", 10), ("job_b", "queued", 5)] {
            store
                .create_training_job(NewTrainingJob {
                    job_id: job_id.to_string(),
                    name: job_id.to_string(),
                    status: status.to_string(),
                    current_phase: "training".to_string(),
                    current_step: 3,
                    progress,
                    estimated_completion: None,
                    metadata: serde_json::Value::Null,
                })
                .await
                .unwrap();
        }
        store
            .create_nodes(vec![
                NewNode {
                    node_id: "compute_1".to_string(),
                    node_type: NodeType::Compute,
                    status: NodeStatus::Active,
                    metadata: serde_json::Value::Null,
                },
                NewNode {
                    node_id: "rpc_1".to_string(),
                    node_type: NodeType::Rpc,
                    status: NodeStatus::Inactive,
                    metadata: serde_json::Value::Null,
                },
            ])
            .await
            .unwrap();
        store
            .create_commitment(NewTemporalCommitment {
                node_id: "compute_1".to_string(),
                job_id: Some("job_a".to_string()),
                commitment_duration: 4,
                start_time: None,
                end_time: Utc::now() + Duration::hours(4),
                status: "active".to_string(),
                computational_power: 600,
            })
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_advance_progress_rules() {
        assert_eq!(advance_progress(10, 3, 1.5), (11, 4));
        assert_eq!(advance_progress(10, 3, 0.5), (10, 3));
        assert_eq!(advance_progress(99, 38, 1.9), (100, 38));
        assert_eq!(advance_progress(99, 5, 1.9), (100, 5));
    }

    #[test]
    fn test_count_nodes_includes_every_type() {
        let stats = count_nodes(&[]);
        assert_eq!(stats.len(), NodeType::ALL.len());
        assert!(stats.values().all(|s| s.total == 0));
    }

    #[test]
    fn test_message_wire_shape() {
        let json = serde_json::to_value(LiveMessage::connected()).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["message"], CONNECTED_MESSAGE);

        let snapshot = LiveSnapshot {
            node_stats: count_nodes(&[]),
            training_jobs: vec![],
            commitment_count: 3,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(LiveMessage::LiveUpdate { data: snapshot }).unwrap();
        assert_eq!(json["type"], "live_update");
        assert_eq!(json["data"]["commitmentCount"], 3);
        assert_eq!(json["data"]["nodeStats"]["compute"]["total"], 0);
    }

    #[tokio::test]
    async fn test_tick_broadcasts_snapshot() {
        let store = store_with_jobs().await;
        let tx = live_channel();
        let mut rx = tx.subscribe();
        let task = LiveUpdateTask::new(store, tx, StdRng::seed_from_u64(8));

        task.tick().await.unwrap();
        let LiveMessage::LiveUpdate { data } = rx.recv().await.unwrap() else {
            panic!("expected live update");
        };
        assert_eq!(data.commitment_count, 1);
        assert_eq!(data.training_jobs.len(), 2);
        let total: u64 = data.node_stats.values().map(|s| s.total).sum();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_ticks_only_move_active_jobs_forward() {
        let store = store_with_jobs().await;
        let task = LiveUpdateTask::new(store.clone(), live_channel(), StdRng::seed_from_u64(21));

        for _ in 0..200 {
            task.tick().await.unwrap();
        }
        let jobs = store.list_training_jobs().await.unwrap();
        let a = jobs.iter().find(|j| j.job_id == "job_a").unwrap();
        let b = jobs.iter().find(|j| j.job_id == "job_b").unwrap();
        assert!(a.progress > 10);
        assert!(a.progress <= 100);
        assert!(a.current_step <= MAX_TRAINING_STEP);
        assert_eq!(b.progress, 5);
    }

    #[tokio::test]
    async fn test_tick_without_subscribers() {
        let store = store_with_jobs().await;
        let task = LiveUpdateTask::new(store, live_channel(), StdRng::seed_from_u64(1));
        assert!(task.tick().await.is_ok());
    }
}
