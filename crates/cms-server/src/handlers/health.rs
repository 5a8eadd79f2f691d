//! Liveness and readiness.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::db::pool::health_check as db_health_check;
use crate::state::{AppState, Integrations};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealthResponse {
    pub status: String,
    pub database: String,
    /// Admin routes require a bearer token.
    pub admin_auth: bool,
    pub integrations: Integrations,
    pub uptime_seconds: u64,
    pub version: String,
}

/// `GET /health`: process is up. Never touches the database.
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// `GET /api/health`: 503 when Postgres does not answer. Mail and AI
/// being unconfigured is reported but does not make the API unhealthy.
pub async fn api_health(State(state): State<AppState>) -> (StatusCode, Json<ApiHealthResponse>) {
    let db_healthy = db_health_check(&state.db).await;
    let (status_code, status, database) = readiness(db_healthy);

    let response = ApiHealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        admin_auth: state.config.admin_token().is_some(),
        integrations: state.integrations,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}

fn readiness(db_healthy: bool) -> (StatusCode, &'static str, &'static str) {
    if db_healthy {
        (StatusCode::OK, "ok", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await;
        assert_eq!(response.status, "ok");
    }

    #[test]
    fn test_database_outage_is_unavailable() {
        assert_eq!(readiness(true).0, StatusCode::OK);
        let (code, status, database) = readiness(false);
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status, "unhealthy");
        assert_eq!(database, "disconnected");
    }

    #[test]
    fn test_response_field_names() {
        let response = ApiHealthResponse {
            status: "ok".into(),
            database: "connected".into(),
            admin_auth: true,
            integrations: Integrations { mail: false, ai: true },
            uptime_seconds: 3,
            version: "0.0.0".into(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["adminAuth"], true);
        assert_eq!(value["integrations"]["ai"], true);
        assert_eq!(value["uptimeSeconds"], 3);
    }
}
