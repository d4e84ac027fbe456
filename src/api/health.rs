// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

/// Individual readiness checks.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Signing keys cached or fetchable ("ok" or "unavailable").
    pub jwks: String,
}

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Keys are usable when verification could obtain them right now, stale
/// keys within the staleness bound included.
async fn check_jwks(state: &AppState) -> bool {
    state.verifier.key_cache().get_keys().await.is_ok()
}

/// Liveness check. Does not touch dependencies.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check.
///
/// Returns 200 only when token verification keys are available, 503 otherwise.
#[utoipa::path(
    get,
    path = "/api/v1/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let jwks_ok = check_jwks(&state).await;

    let response = ReadyResponse {
        status: if jwks_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            jwks: if jwks_ok { "ok" } else { "unavailable" }.to_string(),
        },
    };

    let status = if jwks_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::auth::{KeyCache, TokenVerifier};
    use crate::upstream::DataServiceClient;

    #[tokio::test]
    async fn health_is_ok() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn readiness_degrades_without_keys() {
        let state =
            AppState::for_endpoints("http://127.0.0.1:9/jwks", "http://127.0.0.1:9", "issuer")
                .expect("state builds");

        let (status, Json(body)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.checks.jwks, "unavailable");
    }

    #[tokio::test]
    async fn readiness_ok_when_keys_fetchable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/jwks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"keys":[]}"#)
            .create_async()
            .await;

        let state = AppState::for_endpoints(
            &format!("{}/jwks", server.url()),
            "http://127.0.0.1:9",
            "issuer",
        )
        .expect("state builds");

        let (status, Json(body)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.checks.jwks, "ok");
    }

    #[tokio::test]
    async fn readiness_stays_ok_while_serving_stale_keys() {
        let mut server = mockito::Server::new_async().await;
        let good = server
            .mock("GET", "/jwks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"keys":[]}"#)
            .create_async()
            .await;

        let keys = KeyCache::new(format!("{}/jwks", server.url()))
            .unwrap()
            .with_cache_ttl(Duration::from_millis(20));
        let data = DataServiceClient::new(
            &url::Url::parse("http://127.0.0.1:9").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        let state = AppState::new(TokenVerifier::new(Arc::new(keys), "issuer"), data);

        let (status, _) = readiness(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);

        good.remove_async().await;
        let failing = server
            .mock("GET", "/jwks")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        for _ in 0..3 {
            let (status, Json(body)) = readiness(State(state.clone())).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body.checks.jwks, "ok");
        }
        failing.assert_async().await;
    }
}
