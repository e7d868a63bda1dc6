//! Health check endpoints for Kubernetes probes and monitoring.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

/// Detailed health status response.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct HealthStatus {
    /// Overall status: "healthy", "degraded", or "unhealthy"
    #[cfg_attr(feature = "utoipa", schema(example = "healthy"))]
    pub status: String,
    /// Service version
    #[cfg_attr(feature = "utoipa", schema(example = "0.1.0"))]
    pub version: String,
    /// Individual subsystem statuses
    pub subsystems: SubsystemStatus,
}

/// Status of individual subsystems.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct SubsystemStatus {
    /// Database connection status, absent when no database is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<ComponentStatus>,
    /// Availability of the collection document for the default language
    pub collection: ComponentStatus,
}

/// Status of a single component.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ComponentStatus {
    /// Whether the component is healthy
    #[cfg_attr(feature = "utoipa", schema(example = true))]
    pub healthy: bool,
    /// Optional message with details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "utoipa", schema(example = json!(null)))]
    pub message: Option<String>,
    /// Latency of the health check in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "utoipa", schema(example = 5))]
    pub latency_ms: Option<u64>,
}

/// Full health check with subsystem status.
///
/// An unreachable database makes the service unhealthy. A missing collection
/// document only degrades it, since the prompt endpoints keep working.
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/health",
    tag = "health",
    operation_id = "health_check",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthStatus),
        (status = 503, description = "Service is unhealthy", body = HealthStatus),
    )
))]
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let mut database = None;
    let mut db_healthy = true;

    if let Some(db) = &state.db {
        let start = std::time::Instant::now();
        db_healthy = db.health_check().await.is_ok();
        let latency_ms = start.elapsed().as_millis() as u64;

        database = Some(ComponentStatus {
            healthy: db_healthy,
            message: (!db_healthy).then(|| "Database connection failed".to_string()),
            latency_ms: Some(latency_ms),
        });
    }

    let language = state.collection.default_language();
    let path = state.collection.document_path(language);
    let collection_healthy = tokio::fs::try_exists(&path).await.unwrap_or(false);
    let collection = ComponentStatus {
        healthy: collection_healthy,
        message: (!collection_healthy)
            .then(|| format!("No collection document for language '{language}'")),
        latency_ms: None,
    };

    let (status, status_code) = match (db_healthy, collection_healthy) {
        (false, _) => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE),
        (true, false) => ("degraded", StatusCode::OK),
        (true, true) => ("healthy", StatusCode::OK),
    };

    let health = HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        subsystems: SubsystemStatus {
            database,
            collection,
        },
    };

    (status_code, Json(health))
}

/// Kubernetes liveness probe.
///
/// Returns 200 whenever the process is serving requests.
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    operation_id = "health_liveness",
    responses(
        (status = 200, description = "Service is alive"),
    )
))]
#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

/// Kubernetes readiness probe.
///
/// Returns 503 while a configured database is unreachable.
#[cfg_attr(feature = "utoipa", utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    operation_id = "health_readiness",
    responses(
        (status = 200, description = "Service is ready to accept traffic"),
        (status = 503, description = "Service is not ready (database unavailable)"),
    )
))]
#[tracing::instrument(name = "health.readiness", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(db) = &state.db
        && db.health_check().await.is_err()
    {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body};
    use http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    /// Application without a database, serving the collection from `dir`
    async fn test_app_no_db(dir: &std::path::Path) -> Router {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let config_str = format!(
            r#"
[collection]
directory = "{}"
"#,
            dir.display()
        );

        let config = crate::config::AppConfig::from_str(&config_str)
            .expect("Failed to parse test config");
        let state = crate::AppState::new(config.clone())
            .await
            .expect("Failed to create AppState");
        crate::build_app(&config, state)
    }

    #[cfg(feature = "database-sqlite")]
    async fn test_app_with_db(dir: &std::path::Path) -> Router {
        use std::sync::atomic::{AtomicU64, Ordering};

        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let db_id = COUNTER.fetch_add(1, Ordering::SeqCst);

        let config_str = format!(
            r#"
[server]
host = "127.0.0.1"

[database]
type = "sqlite"
path = "file:test_health_db_{}?mode=memory&cache=shared"
create_if_missing = true
run_migrations = true
wal_mode = false

[collection]
directory = "{}"
"#,
            db_id,
            dir.display()
        );

        let config = crate::config::AppConfig::from_str(&config_str)
            .expect("Failed to parse test config");
        let state = crate::AppState::new(config.clone())
            .await
            .expect("Failed to create AppState");
        crate::build_app(&config, state)
    }

    fn collection_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("prompts_zh.md"),
            "## 写作\n### 编辑\n- **角色/类别**: 写作\n**提示词**: 修改语法。\n",
        )
        .unwrap();
        dir
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_check_no_db_healthy() {
        let dir = collection_dir();
        let app = test_app_no_db(dir.path()).await;

        let (status, body) = get_json(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["version"].as_str().unwrap().contains('.'));
        assert!(body["subsystems"]["database"].is_null());
        assert_eq!(body["subsystems"]["collection"]["healthy"], true);
    }

    #[tokio::test]
    async fn test_health_check_missing_collection_is_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app_no_db(dir.path()).await;

        let (status, body) = get_json(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["subsystems"]["collection"]["healthy"], false);
        assert!(
            body["subsystems"]["collection"]["message"]
                .as_str()
                .unwrap()
                .contains("zh")
        );
    }

    #[tokio::test]
    async fn test_liveness_and_readiness_without_db() {
        let dir = collection_dir();
        let app = test_app_no_db(dir.path()).await;

        let (status, _) = get_json(&app, "/health/live").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get_json(&app, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[cfg(feature = "database-sqlite")]
    #[tokio::test]
    async fn test_health_check_with_db_healthy() {
        let dir = collection_dir();
        let app = test_app_with_db(dir.path()).await;

        let (status, body) = get_json(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["subsystems"]["database"]["healthy"], true);
        assert!(body["subsystems"]["database"]["latency_ms"].is_number());

        let (status, _) = get_json(&app, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
    }
}
