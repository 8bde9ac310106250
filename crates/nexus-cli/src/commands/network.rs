// crates/nexus-cli/src/commands/network.rs
//
// `nexus network {nodes, jobs, commitments, metrics}`: dashboard views.

use clap::Subcommand;
use nexus_core::{NetworkMetrics, Node, NodeStatus, NodeType, TemporalCommitment, TrainingJob};
use serde::Serialize;
use tabled::Tabled;

use crate::api_client::ApiClient;
use crate::output::{format_json, format_table, print_list, FieldRow, OutputFormat};

/// Network subcommands.
#[derive(Debug, Subcommand)]
pub enum NetworkCmd {
    /// List nodes, or per-type counts with --summary.
    Nodes {
        /// Only nodes of this type (compute, rpc, sentry, oracle, data, full,
        /// consumer, validator).
        #[arg(long = "type")]
        node_type: Option<String>,
        /// Per-type totals instead of individual nodes.
        #[arg(long)]
        summary: bool,
    },
    /// Training jobs and their progress.
    Jobs,
    /// Temporal commitments.
    Commitments {
        /// Show at most this many commitments.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Latest network metrics snapshot.
    Metrics,
}

#[derive(Tabled)]
pub struct NodeRow {
    #[tabled(rename = "Node")]
    pub node_id: String,
    #[tabled(rename = "Type")]
    pub node_type: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Last Seen")]
    pub last_seen: String,
}

impl From<&Node> for NodeRow {
    fn from(n: &Node) -> Self {
        Self {
            node_id: n.node_id.clone(),
            node_type: n.node_type.to_string(),
            status: n.status.as_str().to_string(),
            last_seen: n.last_seen.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct JobRow {
    #[tabled(rename = "Job")]
    pub job_id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Phase")]
    pub phase: String,
    #[tabled(rename = "Step")]
    pub step: u32,
    #[tabled(rename = "Progress")]
    pub progress: String,
}

impl From<&TrainingJob> for JobRow {
    fn from(j: &TrainingJob) -> Self {
        Self {
            job_id: j.job_id.clone(),
            name: j.name.clone(),
            status: j.status.clone(),
            phase: j.current_phase.clone(),
            step: j.current_step,
            progress: format!("{}%", j.progress),
        }
    }
}

#[derive(Tabled)]
pub struct CommitmentRow {
    #[tabled(rename = "ID")]
    pub id: u64,
    #[tabled(rename = "Node")]
    pub node_id: String,
    #[tabled(rename = "Job")]
    pub job_id: String,
    #[tabled(rename = "Hours")]
    pub hours: u64,
    #[tabled(rename = "Ends")]
    pub end_time: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Power")]
    pub power: u64,
}

impl From<&TemporalCommitment> for CommitmentRow {
    fn from(c: &TemporalCommitment) -> Self {
        Self {
            id: c.id,
            node_id: c.node_id.clone(),
            job_id: c.job_id.clone().unwrap_or_else(|| "--".to_string()),
            hours: c.commitment_duration,
            end_time: c.end_time.format("%Y-%m-%d %H:%M").to_string(),
            status: c.status.clone(),
            power: c.computational_power,
        }
    }
}

/// Per-type node totals, in dashboard order.
#[derive(Tabled, Serialize)]
pub struct NodeSummaryRow {
    #[tabled(rename = "Type")]
    pub node_type: String,
    #[tabled(rename = "Active")]
    pub active: usize,
    #[tabled(rename = "Total")]
    pub total: usize,
}

pub fn summarize_nodes(nodes: &[Node]) -> Vec<NodeSummaryRow> {
    NodeType::ALL
        .iter()
        .map(|t| {
            let of_type = nodes.iter().filter(|n| n.node_type == *t);
            let (total, active) = of_type.fold((0, 0), |(total, active), n| {
                let up = n.status == NodeStatus::Active;
                (total + 1, active + usize::from(up))
            });
            NodeSummaryRow {
                node_type: t.to_string(),
                active,
                total,
            }
        })
        .collect()
}

pub fn metrics_details(m: &NetworkMetrics) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Recorded", m.timestamp.to_rfc3339()),
        FieldRow::new("Total Nodes", m.total_nodes),
        FieldRow::new("Active Jobs", m.active_jobs),
        FieldRow::new("Total Commitments", m.total_commitments),
        FieldRow::new("Active Commitments", m.active_commitments),
        FieldRow::new("Network Power", m.network_power),
    ]
}

/// Run the network subcommand.
pub async fn run(
    cmd: &NetworkCmd,
    client: &ApiClient,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        NetworkCmd::Nodes { node_type, summary } => {
            let mut nodes: Vec<Node> = client.get("/api/nodes").await?;
            if let Some(wanted) = node_type {
                let wanted = wanted.to_lowercase();
                nodes.retain(|n| n.node_type.as_str() == wanted);
            }
            if *summary {
                let rows = summarize_nodes(&nodes);
                match format {
                    OutputFormat::Json => println!("{}", format_json(&rows)),
                    OutputFormat::Table => println!("{}", format_table(&rows)),
                }
            } else {
                print_list(format, &nodes, |n| NodeRow::from(n), "No nodes found.");
            }
        }
        NetworkCmd::Jobs => {
            let jobs: Vec<TrainingJob> = client.get("/api/training-jobs").await?;
            print_list(format, &jobs, |j| JobRow::from(j), "No training jobs.");
        }
        NetworkCmd::Commitments { limit } => {
            let mut commitments: Vec<TemporalCommitment> =
                client.get("/api/temporal-commitments").await?;
            let total = commitments.len();
            commitments.truncate(*limit);
            print_list(
                format,
                &commitments,
                |c| CommitmentRow::from(c),
                "No temporal commitments.",
            );
            if format == OutputFormat::Table && total > commitments.len() {
                println!("Showing {} of {} commitments.", commitments.len(), total);
            }
        }
        NetworkCmd::Metrics => {
            let metrics: Option<NetworkMetrics> = client.get("/api/network-metrics").await?;
            match (format, metrics) {
                (OutputFormat::Json, metrics) => println!("{}", format_json(&metrics)),
                (OutputFormat::Table, Some(m)) => {
                    println!("{}", format_table(&metrics_details(&m)))
                }
                (OutputFormat::Table, None) => println!("No metrics recorded yet."),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node(id: &str, node_type: NodeType, status: NodeStatus) -> Node {
        Node {
            id: 1,
            node_id: id.to_string(),
            node_type,
            status,
            last_seen: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_summarize_nodes_covers_every_type() {
        let nodes = vec![
            node("compute_1", NodeType::Compute, NodeStatus::Active),
            node("compute_2", NodeType::Compute, NodeStatus::Inactive),
            node("oracle_1", NodeType::Oracle, NodeStatus::Active),
        ];
        let rows = summarize_nodes(&nodes);
        assert_eq!(rows.len(), NodeType::ALL.len());

        let compute = rows.iter().find(|r| r.node_type == "compute").unwrap();
        assert_eq!((compute.active, compute.total), (1, 2));
        let sentry = rows.iter().find(|r| r.node_type == "sentry").unwrap();
        assert_eq!((sentry.active, sentry.total), (0, 0));
    }

    #[test]
    fn test_commitment_row_without_job() {
        let now = Utc::now();
        let commitment = TemporalCommitment {
            id: 12,
            node_id: "compute_3".to_string(),
            job_id: None,
            commitment_duration: 4,
            start_time: now,
            end_time: now,
            status: "active".to_string(),
            computational_power: 850,
        };
        let row = CommitmentRow::from(&commitment);
        assert_eq!(row.job_id, "--");
        assert_eq!(row.hours, 4);
        assert_eq!(row.power, 850);
    }

    #[test]
    fn test_node_row() {
        let row = NodeRow::from(&node("rpc_7", NodeType::Rpc, NodeStatus::Inactive));
        assert_eq!(row.node_type, "rpc");
        assert_eq!(row.status, "inactive");
    }
}
