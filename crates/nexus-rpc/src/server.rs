// crates/nexus-rpc/src/server.rs
//
// HTTP server setup: RpcConfig, AppState, and the axum router.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use nexus_consensus::PotcEngine;
use nexus_core::NexusStore;

use crate::handlers::{cli, consensus, network, validators};
use crate::live::LiveMessage;
use crate::{middleware, ws};

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl RpcConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NexusStore>,
    pub engine: Arc<PotcEngine<dyn NexusStore>>,
    pub live: broadcast::Sender<LiveMessage>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn NexusStore>,
        engine: Arc<PotcEngine<dyn NexusStore>>,
        live: broadcast::Sender<LiveMessage>,
    ) -> Self {
        Self { store, engine, live }
    }

    /// Push a message to live subscribers. Having none is fine.
    pub fn broadcast(&self, message: LiveMessage) {
        let _ = self.live.send(message);
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/validators",
            get(validators::list_validators).post(validators::create_validator),
        )
        .route("/validators/active", get(validators::active_validators))
        .route("/consensus/stats", get(consensus::stats))
        .route("/consensus/rounds", get(consensus::recent_rounds))
        .route("/consensus/rounds/{id}/votes", get(consensus::round_votes))
        .route("/consensus/start", post(consensus::start_simulation))
        .route("/consensus/update-scores", post(consensus::update_scores))
        .route("/consensus/votes", post(consensus::submit_vote))
        .route("/consensus/slash", post(consensus::slash_validator))
        .route("/nodes", get(network::list_nodes))
        .route("/nodes/stats", get(network::node_stats))
        .route(
            "/training-jobs",
            get(network::list_training_jobs).post(network::create_training_job),
        )
        .route(
            "/temporal-commitments",
            get(network::list_commitments).post(network::create_commitment),
        )
        .route("/temporal-commitments/stats", get(network::commitment_stats))
        .route("/network-metrics", get(network::network_metrics))
        .route("/cli/execute", post(cli::execute));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .route("/ws", get(ws::ws_handler))
        .layer(axum::middleware::from_fn(middleware::log_request))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "currentRound": state.engine.current_round(),
        "isSimulationRunning": state.engine.is_simulation_running(),
    }))
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(config: &RpcConfig, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!("HTTP API listening on {}", local);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
