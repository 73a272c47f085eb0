//! HTTP request handlers
//!
//! Every response is descriptive JSON; there is no state beyond the
//! request counter and the start time.

use crate::server::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// Info response for the root endpoint
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub service: String,
    pub version: String,
    pub project: String,
    pub environment: String,
    pub instance_id: String,
    pub availability_zone: String,
}

pub async fn info_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(InfoResponse {
        service: "rollout-sample-app".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        project: state.project.clone(),
        environment: state.environment.clone(),
        instance_id: state.identity.instance_id.clone(),
        availability_zone: state.identity.availability_zone.clone(),
    })
}

/// Health check response for the load balancer target group
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub instance_id: String,
    pub availability_zone: String,
    pub hostname: String,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.uptime_seconds(),
        instance_id: state.identity.instance_id.clone(),
        availability_zone: state.identity.availability_zone.clone(),
        hostname: state.identity.hostname.clone(),
    })
}

/// Metrics response
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub requests_served: u64,
    pub uptime_seconds: u64,
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(MetricsResponse {
        requests_served: state.requests.load(Ordering::Relaxed),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Echo response reflecting the request payload
#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub received: serde_json::Value,
    pub received_at: String,
}

pub async fn echo_handler(Json(payload): Json<serde_json::Value>) -> impl IntoResponse {
    Json(EchoResponse {
        received: payload,
        received_at: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use crate::server::{AppState, router};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::from_env(
            "image-pipeline-poc".to_string(),
            "dev".to_string(),
        ))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_status_and_identity_fields() {
        let response = router(state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json["uptime_seconds"].is_u64());
        assert!(json["instance_id"].is_string());
        assert!(json["availability_zone"].is_string());
    }

    #[tokio::test]
    async fn info_names_the_service_and_environment() {
        let response = router(state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["service"], "rollout-sample-app");
        assert_eq!(json["project"], "image-pipeline-poc");
        assert_eq!(json["environment"], "dev");
    }

    #[tokio::test]
    async fn metrics_counts_requests_across_calls() {
        let state = state();

        let _ = router(state.clone())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let response = router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        // The health call above plus this metrics call itself.
        assert_eq!(json["requests_served"], 2);
    }

    #[tokio::test]
    async fn echo_reflects_the_payload() {
        let payload = serde_json::json!({"build": "ami-123", "n": 7});
        let response = router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["received"], payload);
        assert!(json["received_at"].is_string());
    }

    #[tokio::test]
    async fn echo_rejects_non_json_bodies() {
        let response = router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_ne!(response.status(), StatusCode::OK);
    }
}
