// crates/nexus-rpc/src/handlers/validators.rs
//
// Validator handlers: list, list active, create.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use nexus_core::{ConsensusStore, NewValidator, Validator};

use crate::error::ApiError;
use crate::server::AppState;

/// GET /api/validators
///
/// Statuses are reported as of now, so an active validator whose commitment
/// has ended lists as `expired`.
pub async fn list_validators(
    State(state): State<AppState>,
) -> Result<Json<Vec<Validator>>, ApiError> {
    let now = Utc::now();
    let mut validators = state.store.list_validators().await?;
    for v in &mut validators {
        v.status = v.effective_status(now);
    }
    Ok(Json(validators))
}

/// GET /api/validators/active
///
/// Active validators whose commitment has not ended, highest score first.
pub async fn active_validators(
    State(state): State<AppState>,
) -> Result<Json<Vec<Validator>>, ApiError> {
    Ok(Json(state.engine.eligible_validators().await?))
}

/// POST /api/validators
pub async fn create_validator(
    State(state): State<AppState>,
    payload: Result<Json<NewValidator>, JsonRejection>,
) -> Result<(StatusCode, Json<Validator>), ApiError> {
    let Json(new_validator) = payload?;
    let validator = state.store.create_validator(new_validator).await?;
    tracing::info!(
        "Registered validator {} (stake {}, {} min)",
        validator.validator_id,
        validator.stake_amount,
        validator.commitment_duration
    );
    Ok((StatusCode::CREATED, Json(validator)))
}
