// crates/nexus-rpc/src/handlers/network.rs
//
// Network dashboard handlers: nodes, training jobs, temporal commitments,
// and network metrics.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use nexus_core::{
    NetworkMetrics, NetworkStore, NewTemporalCommitment, NewTrainingJob, Node, NodeType,
    TemporalCommitment, TrainingJob,
};

use crate::error::ApiError;
use crate::live::{count_nodes, LiveMessage, TypeStats};
use crate::server::AppState;

/// GET /api/nodes
pub async fn list_nodes(State(state): State<AppState>) -> Result<Json<Vec<Node>>, ApiError> {
    Ok(Json(state.store.list_nodes().await?))
}

/// GET /api/nodes/stats
pub async fn node_stats(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<NodeType, TypeStats>>, ApiError> {
    let nodes = state.store.list_nodes().await?;
    Ok(Json(count_nodes(&nodes)))
}

/// GET /api/training-jobs
pub async fn list_training_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrainingJob>>, ApiError> {
    Ok(Json(state.store.list_training_jobs().await?))
}

/// POST /api/training-jobs
pub async fn create_training_job(
    State(state): State<AppState>,
    payload: Result<Json<NewTrainingJob>, JsonRejection>,
) -> Result<(StatusCode, Json<TrainingJob>), ApiError> {
    let Json(new_job) = payload?;
    if new_job.job_id.trim().is_empty() {
        return Err(ApiError::bad_request("jobId must not be empty"));
    }
    let job = state.store.create_training_job(new_job).await?;
    state.broadcast(LiveMessage::TrainingJobCreated { data: job.clone() });
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/temporal-commitments
pub async fn list_commitments(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemporalCommitment>>, ApiError> {
    Ok(Json(state.store.list_commitments().await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentStats {
    pub total: u64,
    pub active: u64,
    pub expired: u64,
    /// Mean duration in hours; 0 with no commitments.
    pub average_duration: f64,
    pub total_computational_power: u64,
}

/// GET /api/temporal-commitments/stats
pub async fn commitment_stats(
    State(state): State<AppState>,
) -> Result<Json<CommitmentStats>, ApiError> {
    let all = state.store.list_commitments().await?;
    let active = state.store.active_commitments(Utc::now()).await?;

    let average_duration = if all.is_empty() {
        0.0
    } else {
        all.iter().map(|c| c.commitment_duration as f64).sum::<f64>() / all.len() as f64
    };

    Ok(Json(CommitmentStats {
        total: all.len() as u64,
        active: active.len() as u64,
        expired: (all.len() - active.len()) as u64,
        average_duration,
        total_computational_power: active
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.computational_power)),
    }))
}

/// POST /api/temporal-commitments
pub async fn create_commitment(
    State(state): State<AppState>,
    payload: Result<Json<NewTemporalCommitment>, JsonRejection>,
) -> Result<(StatusCode, Json<TemporalCommitment>), ApiError> {
    let Json(new_commitment) = payload?;
    if new_commitment.node_id.trim().is_empty() {
        return Err(ApiError::bad_request("nodeId must not be empty"));
    }
    let commitment = state.store.create_commitment(new_commitment).await?;
    state.broadcast(LiveMessage::TemporalCommitmentCreated {
        data: commitment.clone(),
    });
    Ok((StatusCode::CREATED, Json(commitment)))
}

/// GET /api/network-metrics
///
/// Latest metrics row, or `null` before any has been recorded.
pub async fn network_metrics(
    State(state): State<AppState>,
) -> Result<Json<Option<NetworkMetrics>>, ApiError> {
    Ok(Json(state.store.latest_network_metrics().await?))
}
