// crates/nexus-rpc/src/lib.rs
//
// nexus-rpc: HTTP/JSON API and WebSocket live channel for the NexusLink
// simulator.
//
// Routes are served with axum under `/api`, plus `/health` and `/ws`.
// `LiveUpdateTask` drives the dashboard simulation and pushes snapshots to
// WebSocket subscribers over a broadcast channel.

pub mod error;
pub mod handlers;
pub mod live;
pub mod middleware;
pub mod render;
pub mod server;
pub mod ws;

pub use error::ApiError;
pub use live::{live_channel, LiveMessage, LiveSnapshot, LiveUpdateTask, TypeStats};
pub use server::{router, serve, AppState, RpcConfig};
