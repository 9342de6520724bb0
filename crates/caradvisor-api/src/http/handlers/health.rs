//! Service banner and health endpoints. None of them fail: problems are
//! reported in the body.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: String,
    pub version: String,
    pub status: &'static str,
    pub features: [&'static str; 3],
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ChatHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub model: String,
}

/// GET / - Service banner.
pub async fn root(State(state): State<AppState>) -> Json<Banner> {
    Json(Banner {
        message: format!("{} is running", state.info.name),
        version: state.info.version.clone(),
        status: "healthy",
        features: ["cars", "chat", "comparison"],
    })
}

/// GET /health - Liveness plus catalog reachability.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let database = match state.car_service.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "catalog health check failed");
            "unreachable"
        }
    };
    Json(Health {
        status: if database == "connected" { "ok" } else { "degraded" },
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /chat/health - Chat service status.
pub async fn chat_health(State(state): State<AppState>) -> Json<ChatHealth> {
    Json(ChatHealth {
        status: "ok",
        service: "chat",
        model: state.info.model.clone(),
    })
}
