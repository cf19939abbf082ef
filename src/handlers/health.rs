use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "edubridge-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness payload. A reachable database with no applied migration is
/// reported as not ready.
fn readiness(
    schema_version: Result<Option<i64>, sqlx::Error>,
    size: u32,
    idle: usize,
) -> (StatusCode, Value) {
    match schema_version {
        Ok(Some(version)) => (
            StatusCode::OK,
            json!({
                "status": "ready",
                "checks": { "database": "ok", "migrations": "ok" },
                "schemaVersion": version,
                "pool": { "size": size, "idle": idle },
            }),
        ),
        Ok(None) => {
            tracing::warn!("Readiness check failed: no migration applied");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "status": "not_ready",
                    "checks": { "database": "ok", "migrations": "pending" },
                }),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed: database unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "status": "not_ready",
                    "checks": { "database": "failed" },
                }),
            )
        }
    }
}

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let schema_version = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(version) FROM _sqlx_migrations WHERE success",
    )
    .fetch_one(&state.db)
    .await;

    let (status, body) = readiness(schema_version, state.db.size(), state.db.num_idle());
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_reports_schema_version() {
        let (status, body) = readiness(Ok(Some(20240101000000)), 4, 3);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["schemaVersion"], 20240101000000_i64);
        assert_eq!(body["checks"]["migrations"], "ok");
        assert_eq!(body["pool"]["idle"], 3);
    }

    #[test]
    fn test_not_ready_without_migrations_or_database() {
        let (status, body) = readiness(Ok(None), 1, 1);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["migrations"], "pending");

        let (status, body) = readiness(Err(sqlx::Error::PoolTimedOut), 0, 0);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["database"], "failed");
        assert!(body.get("schemaVersion").is_none());
    }
}
