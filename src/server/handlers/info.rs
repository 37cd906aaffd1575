//! Service info, health and the chat assistant

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::chat::{agent_graph as graph, AgentGraph, ChatRequest, ChatResponse, AGENTS};
use crate::entities::user::Permission;
use crate::server::auth::require;
use crate::server::error::ApiResult;
use crate::server::AppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "SECT Control Tower",
        "version": VERSION,
        "description": "Supplier Engagement Control Tower - IMDS & PCF",
        "health": "/health",
    }))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: String,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Health>) {
    let database = match state.db().map(|db| db.health()) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("database lock poisoned".to_string()),
    };

    let (status, code, database) = match database {
        Ok(()) => ("healthy", StatusCode::OK, "connected".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            ("unhealthy", StatusCode::SERVICE_UNAVAILABLE, format!("error: {}", e))
        }
    };

    (
        code,
        Json(Health {
            status,
            version: VERSION,
            timestamp: Utc::now(),
            database,
            uptime_seconds: state.start_time.elapsed().as_secs(),
        }),
    )
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    require(&state, &headers, Permission::ChatUse)?;
    Ok(Json(state.assistant.answer(request).await?))
}

pub async fn agents() -> Json<Value> {
    Json(json!({ "agents": AGENTS }))
}

pub async fn agent_graph() -> Json<AgentGraph> {
    Json(graph())
}
