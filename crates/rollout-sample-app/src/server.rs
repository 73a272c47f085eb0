//! HTTP server setup and shared state

use crate::handlers::{echo_handler, health_handler, info_handler, metrics_handler};
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Identity of the instance this app runs on, captured once at startup.
///
/// The provisioning step of the machine image populates the env vars;
/// outside an instance (local runs, tests) everything reads "unknown".
#[derive(Debug, Clone)]
pub struct InstanceIdentity {
    pub instance_id: String,
    pub availability_zone: String,
    pub hostname: String,
}

impl InstanceIdentity {
    fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_else(|_| "unknown".to_string());
        Self {
            instance_id: var("INSTANCE_ID"),
            availability_zone: var("AVAILABILITY_ZONE"),
            hostname: var("HOSTNAME"),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub started: Instant,
    pub requests: AtomicU64,
    pub identity: InstanceIdentity,
    pub project: String,
    pub environment: String,
}

impl AppState {
    pub fn from_env(project: String, environment: String) -> Self {
        Self {
            started: Instant::now(),
            requests: AtomicU64::new(0),
            identity: InstanceIdentity::from_env(),
            project,
            environment,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(info_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/echo", post(echo_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            count_requests,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn count_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    state.requests.fetch_add(1, Ordering::Relaxed);
    next.run(request).await
}
