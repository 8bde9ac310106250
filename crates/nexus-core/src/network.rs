// crates/nexus-core/src/network.rs
//
// Network-level records shown on the dashboard: nodes, training jobs,
// temporal commitments, and aggregate network metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest step number a training job can reach.
pub const MAX_TRAINING_STEP: u32 = 38;

/// Role of a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Compute,
    Rpc,
    Sentry,
    Oracle,
    Data,
    Full,
    Consumer,
    Validator,
}

impl NodeType {
    /// All node types, in dashboard display order.
    pub const ALL: [NodeType; 8] = [
        NodeType::Compute,
        NodeType::Rpc,
        NodeType::Sentry,
        NodeType::Oracle,
        NodeType::Data,
        NodeType::Full,
        NodeType::Consumer,
        NodeType::Validator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Compute => "compute",
            NodeType::Rpc => "rpc",
            NodeType::Sentry => "sentry",
            NodeType::Oracle => "oracle",
            NodeType::Data => "data",
            NodeType::Full => "full",
            NodeType::Consumer => "consumer",
            NodeType::Validator => "validator",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Active,
    Inactive,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Active => "active",
            NodeStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            NodeStatus::Active => NodeStatus::Inactive,
            NodeStatus::Inactive => NodeStatus::Active,
        }
    }
}

/// A network node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: u64,
    pub node_id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub status: NodeStatus,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub node_id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub status: NodeStatus,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl NewNode {
    pub fn into_node(self, id: u64, now: DateTime<Utc>) -> Node {
        Node {
            id,
            node_id: self.node_id,
            node_type: self.node_type,
            status: self.status,
            last_seen: now,
            metadata: self.metadata,
        }
    }
}

/// A simulated AI training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingJob {
    pub id: u64,
    pub job_id: String,
    pub name: String,
    /// "pending", "queued", "training", "validating", ...
    pub status: String,
    pub current_phase: String,
    pub current_step: u32,
    /// Percent complete in [0, 100].
    pub progress: u32,
    pub start_time: DateTime<Utc>,
    pub estimated_completion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl TrainingJob {
    /// Jobs that receive live progress updates.
    pub fn is_active(&self) -> bool {
        self.status == "training" || self.status == "validating"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrainingJob {
    pub job_id: String,
    pub name: String,
    #[serde(default = "default_job_status")]
    pub status: String,
    #[serde(default = "default_job_phase")]
    pub current_phase: String,
    #[serde(default = "default_job_step")]
    pub current_step: u32,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub estimated_completion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_job_status() -> String {
    "pending".to_string()
}

fn default_job_phase() -> String {
    "initialization".to_string()
}

fn default_job_step() -> u32 {
    1
}

impl NewTrainingJob {
    pub fn into_job(self, id: u64, now: DateTime<Utc>) -> TrainingJob {
        TrainingJob {
            id,
            job_id: self.job_id,
            name: self.name,
            status: self.status,
            current_phase: self.current_phase,
            current_step: self.current_step.clamp(1, MAX_TRAINING_STEP),
            progress: self.progress.min(100),
            start_time: now,
            estimated_completion: self.estimated_completion,
            metadata: self.metadata,
        }
    }
}

/// A node's time-locked commitment of compute to the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalCommitment {
    pub id: u64,
    pub node_id: String,
    pub job_id: Option<String>,
    /// Commitment duration in hours.
    pub commitment_duration: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub computational_power: u64,
}

impl TemporalCommitment {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && self.end_time > now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemporalCommitment {
    pub node_id: String,
    #[serde(default)]
    pub job_id: Option<String>,
    pub commitment_duration: u64,
    /// Defaults to the insert time.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "default_commitment_status")]
    pub status: String,
    pub computational_power: u64,
}

fn default_commitment_status() -> String {
    "active".to_string()
}

impl NewTemporalCommitment {
    pub fn into_commitment(self, id: u64, now: DateTime<Utc>) -> TemporalCommitment {
        TemporalCommitment {
            id,
            node_id: self.node_id,
            job_id: self.job_id,
            commitment_duration: self.commitment_duration,
            start_time: self.start_time.unwrap_or(now),
            end_time: self.end_time,
            status: self.status,
            computational_power: self.computational_power,
        }
    }
}

/// Aggregate network metrics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetrics {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub total_nodes: u64,
    pub active_jobs: u64,
    pub total_commitments: u64,
    pub active_commitments: u64,
    pub network_power: u64,
    #[serde(default)]
    pub metrics: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNetworkMetrics {
    pub total_nodes: u64,
    pub active_jobs: u64,
    pub total_commitments: u64,
    pub active_commitments: u64,
    pub network_power: u64,
    #[serde(default)]
    pub metrics: serde_json::Value,
}

impl NewNetworkMetrics {
    pub fn into_metrics(self, id: u64, now: DateTime<Utc>) -> NetworkMetrics {
        NetworkMetrics {
            id,
            timestamp: now,
            total_nodes: self.total_nodes,
            active_jobs: self.active_jobs,
            total_commitments: self.total_commitments,
            active_commitments: self.active_commitments,
            network_power: self.network_power,
            metrics: self.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_node_type_serializes_under_type_key() {
        let node = NewNode {
            node_id: "rpc_1".to_string(),
            node_type: NodeType::Rpc,
            status: NodeStatus::Active,
            metadata: serde_json::json!({}),
        }
        .into_node(1, Utc::now());
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "rpc");
        assert_eq!(json["nodeId"], "rpc_1");
    }

    #[test]
    fn test_training_job_clamps_step_and_progress() {
        let job = NewTrainingJob {
            job_id: "job_1".to_string(),
            name: "test".to_string(),
            status: "training".to_string(),
            current_phase: "training".to_string(),
            current_step: 99,
            progress: 140,
            estimated_completion: None,
            metadata: serde_json::Value::Null,
        }
        .into_job(1, Utc::now());
        assert_eq!(job.current_step, MAX_TRAINING_STEP);
        assert_eq!(job.progress, 100);
        assert!(job.is_active());
    }

    #[test]
    fn test_commitment_activity_depends_on_end_time() {
        let now = Utc::now();
        let c = NewTemporalCommitment {
            node_id: "compute_1".to_string(),
            job_id: None,
            commitment_duration: 4,
            start_time: None,
            end_time: now + Duration::hours(4),
            status: "active".to_string(),
            computational_power: 700,
        }
        .into_commitment(1, now);
        assert!(c.is_active_at(now));
        assert!(!c.is_active_at(now + Duration::hours(5)));
    }

    #[test]
    fn test_node_status_toggle() {
        assert_eq!(NodeStatus::Active.toggled(), NodeStatus::Inactive);
        assert_eq!(NodeStatus::Inactive.toggled(), NodeStatus::Active);
    }
}
