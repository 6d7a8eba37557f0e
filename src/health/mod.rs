/*!
 * # Health Check Module
 *
 * - Liveness (`/health/live`): the process answers
 * - Readiness (`/health/ready`): the database answers a ping
 * - `/api/v1/health` returns the same readiness report inside the API envelope
 */

use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info};
use utoipa::ToSchema;

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Health check detail
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthDetail {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// Overall health information
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: BTreeMap<String, HealthDetail>,
}

impl HealthReport {
    pub fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Up => StatusCode::OK,
            HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Pings the database and summarises the result.
pub async fn check(db: &DatabaseConnection, started_at: Instant) -> HealthReport {
    let ping_started = Instant::now();
    let database = match db.ping().await {
        Ok(()) => HealthDetail {
            status: HealthStatus::Up,
            message: None,
            latency_ms: ping_started.elapsed().as_millis() as u64,
        },
        Err(e) => {
            error!("Database health check failed: {}", e);
            HealthDetail {
                status: HealthStatus::Down,
                message: Some("database unreachable".to_string()),
                latency_ms: ping_started.elapsed().as_millis() as u64,
            }
        }
    };

    let status = database.status;
    let mut details = BTreeMap::new();
    details.insert("database".to_string(), database);

    HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: started_at.elapsed().as_secs(),
        details,
    }
}

/// Liveness check endpoint
pub async fn liveness_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": state.started_at.elapsed().as_secs(),
            "timestamp": Utc::now(),
        })),
    )
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    info!("Readiness check endpoint called");
    let report = check(&state.db, state.started_at).await;

    (
        report.status_code(),
        Json(json!({
            "ready": report.status == HealthStatus::Up,
            "timestamp": report.timestamp,
        })),
    )
}

/// Routes mounted under `/health`
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/live", get(liveness_check))
        .route("/ready", get(readiness_check))
}
