pub mod client_ip;
pub mod config;
pub mod drafts;
pub mod error;
pub mod forms;
pub mod gateway;
pub mod rate_limit;
pub mod richtext;
pub mod routes;
pub mod sheets;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::drafts::DraftStore;
use crate::gateway::SubmissionService;
use crate::rate_limit::SubmissionRateLimiter;
use crate::sheets::SheetWriter;
use crate::state::{AppState, SharedState};

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// Build the router around an already constructed sheet backend.
pub fn build_app(config: Config, sheets: Arc<dyn SheetWriter>) -> (Router, SharedState) {
    let service = Arc::new(SubmissionService::new(
        sheets,
        config.sheets.owner_email.clone(),
    ));

    let state: SharedState = Arc::new(AppState {
        drafts: DraftStore::new(Duration::from_secs(config.draft_ttl_secs)),
        submission_limiter: SubmissionRateLimiter::new(
            config.submit_rate_limit,
            config.submit_rate_window_secs,
        ),
        gateway: service.clone(),
        service,
        config,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .merge(routes::rpc_routes())
        .merge(routes::draft_routes())
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    (app, state)
}

/// Periodically evict stale drafts and rate-limit windows.
pub fn spawn_maintenance(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = state.drafts.evict_expired();
            if evicted > 0 {
                tracing::debug!("Evicted {evicted} expired drafts ({} open)", state.drafts.len());
            }
            state.submission_limiter.cleanup();
        }
    })
}

async fn health() -> &'static str {
    "ok"
}
