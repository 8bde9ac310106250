// crates/nexus-rpc/src/handlers/consensus.rs
//
// Consensus handlers: stats, rounds, votes, simulation control, slashing.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use nexus_consensus::slashing::SlashResult;
use nexus_consensus::{ConsensusStats, SimulationOutcome};
use nexus_core::{ConsensusRound, ConsensusStore, ValidatorVote, VoteValue};

use crate::error::ApiError;
use crate::server::AppState;

// ---------------------------------------------------------------------------
// Queries and stats
// ---------------------------------------------------------------------------

/// GET /api/consensus/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<ConsensusStats>, ApiError> {
    Ok(Json(state.engine.consensus_stats().await?))
}

#[derive(Debug, Deserialize)]
pub struct RoundsQuery {
    pub limit: Option<usize>,
}

/// GET /api/consensus/rounds?limit=N
pub async fn recent_rounds(
    State(state): State<AppState>,
    Query(query): Query<RoundsQuery>,
) -> Result<Json<Vec<ConsensusRound>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.engine.params().recent_rounds_limit);
    Ok(Json(state.engine.recent_rounds(limit).await?))
}

/// GET /api/consensus/rounds/{id}/votes
pub async fn round_votes(
    State(state): State<AppState>,
    Path(round_id): Path<u64>,
) -> Result<Json<Vec<ValidatorVote>>, ApiError> {
    if state.store.get_round(round_id).await?.is_none() {
        return Err(ApiError::not_found(format!("Round {} not found", round_id)));
    }
    Ok(Json(state.engine.round_votes(round_id).await?))
}

// ---------------------------------------------------------------------------
// Simulation control
// ---------------------------------------------------------------------------

/// POST /api/consensus/start
///
/// Spawns one simulated round in the background and acknowledges at once.
pub async fn start_simulation(State(state): State<AppState>) -> Json<Value> {
    if state.engine.is_simulation_running() {
        return Json(json!({ "message": "Consensus simulation already running" }));
    }

    let engine = state.engine.clone();
    tokio::spawn(async move {
        match engine.run_simulation().await {
            Ok(SimulationOutcome::Completed(round)) => tracing::info!(
                "Manual simulation finished round {} (consensus={})",
                round.round_number,
                round.consensus_reached
            ),
            Ok(outcome) => tracing::info!("Manual simulation ended: {:?}", outcome),
            Err(e) => tracing::warn!("Manual simulation failed: {}", e),
        }
    });

    Json(json!({ "message": "Consensus simulation started" }))
}

#[derive(Debug, Serialize)]
pub struct UpdateScoresResponse {
    pub message: String,
    pub updated: usize,
}

/// POST /api/consensus/update-scores
pub async fn update_scores(
    State(state): State<AppState>,
) -> Result<Json<UpdateScoresResponse>, ApiError> {
    let updated = state.engine.update_validator_scores().await?;
    Ok(Json(UpdateScoresResponse {
        message: "Validator scores updated".to_string(),
        updated,
    }))
}

// ---------------------------------------------------------------------------
// Votes and slashing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    pub round_id: u64,
    pub validator_id: String,
    pub vote: VoteValue,
}

#[derive(Debug, Serialize)]
pub struct SubmitVoteResponse {
    pub accepted: bool,
}

/// POST /api/consensus/votes
///
/// `accepted` is false for unknown validators and repeat votes.
pub async fn submit_vote(
    State(state): State<AppState>,
    payload: Result<Json<SubmitVoteRequest>, JsonRejection>,
) -> Result<Json<SubmitVoteResponse>, ApiError> {
    let Json(req) = payload?;
    let accepted = state
        .engine
        .submit_vote(req.round_id, &req.validator_id, req.vote)
        .await?;
    Ok(Json(SubmitVoteResponse { accepted }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlashRequest {
    pub validator_id: String,
    pub reason: String,
}

/// POST /api/consensus/slash
pub async fn slash_validator(
    State(state): State<AppState>,
    payload: Result<Json<SlashRequest>, JsonRejection>,
) -> Result<Json<SlashResult>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(
        state
            .engine
            .slash_validator(&req.validator_id, &req.reason)
            .await?,
    ))
}
