// crates/nexus-rpc/src/handlers/cli.rs
//
// Terminal command handler: POST /api/cli/execute.
//
// Commands:
//   node status         per-type node counts
//   potc status         temporal commitment summary
//   potc commit         create a 4-hour commitment on a random compute node
//   training submit     queue-position acknowledgement (no job is created)
//   training status     active training jobs
//   consensus status    consensus stats and top validators

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use nexus_core::{NetworkStore, NewTemporalCommitment, NexusError, NodeType};

use crate::error::ApiError;
use crate::live::{count_nodes, LiveMessage};
use crate::render;
use crate::server::AppState;

/// Duration of a commitment created by `potc commit`, in hours.
const SIMULATED_COMMITMENT_HOURS: u64 = 4;

#[derive(Debug, Deserialize)]
pub struct CliRequest {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CliResponse {
    pub output: String,
}

pub async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<CliRequest>, JsonRejection>,
) -> Result<Json<CliResponse>, ApiError> {
    let Json(req) = payload?;
    tracing::debug!("CLI command: {} {:?}", req.command, req.args);
    let output = run_command(&state, &req.command, &req.args).await?;
    Ok(Json(CliResponse { output }))
}

/// Dispatch a terminal command and render its output.
pub async fn run_command(
    state: &AppState,
    command: &str,
    args: &[String],
) -> Result<String, NexusError> {
    let sub = args.first().map(String::as_str).unwrap_or("");
    match (command, sub) {
        ("node", "status") => {
            let nodes = state.store.list_nodes().await?;
            Ok(render::node_status(&count_nodes(&nodes)))
        }
        ("potc", "status") => {
            let all = state.store.list_commitments().await?;
            let active = state.store.active_commitments(Utc::now()).await?;
            let summary = render::CommitmentSummary::from_commitments(&all, &active);
            Ok(render::potc_status(&summary))
        }
        ("potc", "commit") => {
            let compute_nodes = state.store.nodes_by_type(NodeType::Compute).await?;
            let (node_index, power) = {
                let mut rng = rand::thread_rng();
                let upper = compute_nodes.len().max(1);
                (rng.gen_range(0..upper), rng.gen_range(500..1500))
            };
            let node_id = compute_nodes
                .get(node_index)
                .map(|n| n.node_id.clone())
                .unwrap_or_else(|| format!("compute_{}", node_index + 1));

            let now = Utc::now();
            let commitment = state
                .store
                .create_commitment(NewTemporalCommitment {
                    node_id,
                    job_id: None,
                    commitment_duration: SIMULATED_COMMITMENT_HOURS,
                    start_time: Some(now),
                    end_time: now + Duration::hours(SIMULATED_COMMITMENT_HOURS as i64),
                    status: "active".to_string(),
                    computational_power: power,
                })
                .await?;
            state.broadcast(LiveMessage::TemporalCommitmentCreated {
                data: commitment.clone(),
            });
            Ok(render::commitment_result(&commitment))
        }
        ("training", "submit") => {
            let jobs = state.store.list_training_jobs().await?;
            Ok(render::training_submission(jobs.len()))
        }
        ("training", "status") => {
            let jobs = state.store.active_training_jobs().await?;
            Ok(render::training_status(&jobs))
        }
        ("consensus", "status") => {
            let stats = state.engine.consensus_stats().await?;
            Ok(render::consensus_status(&stats))
        }
        _ => {
            let full = std::iter::once(command)
                .chain(args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            Ok(render::command_not_found(full.trim()))
        }
    }
}
