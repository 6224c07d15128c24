use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::client_ip;
use crate::error::AppError;
use crate::forms::FormKind;
use crate::forms::schema;
use crate::gateway::service::ConnectionReport;
use crate::gateway::{PitchSubmission, RequestAssistanceSubmission, SubmitReceipt};
use crate::state::SharedState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub submission_id: String,
    pub row_id: u64,
    pub message: String,
}

impl SubmitResponse {
    fn new(receipt: SubmitReceipt, message: &str) -> Self {
        Self {
            success: true,
            submission_id: receipt.submission_id,
            row_id: receipt.row_id,
            message: message.to_string(),
        }
    }
}

pub(crate) fn check_rate_limit(
    state: &SharedState,
    kind: FormKind,
    peer: SocketAddr,
    headers: &HeaderMap,
) -> Result<(), AppError> {
    let ip = client_ip::extract(headers, peer.ip(), &state.config.trusted_proxies);
    state
        .submission_limiter
        .check(kind, ip)
        .map_err(|retry_after| {
            tracing::warn!("Rate limited {} submission from {ip}", kind.label());
            AppError::RateLimited(format!("Too many submissions. Retry after {retry_after}s"))
        })
}

pub async fn submit_pitch(
    State(state): State<SharedState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<PitchSubmission>,
) -> Result<Json<SubmitResponse>, AppError> {
    check_rate_limit(&state, FormKind::Pitch, peer, &headers)?;

    let receipt = state.service.submit_pitch(payload).await?;
    Ok(Json(SubmitResponse::new(receipt, "Pitch submitted successfully")))
}

pub async fn submit_request_assistance(
    State(state): State<SharedState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<RequestAssistanceSubmission>,
) -> Result<Json<SubmitResponse>, AppError> {
    check_rate_limit(&state, FormKind::RequestAssistance, peer, &headers)?;

    let receipt = state.service.submit_request_assistance(payload).await?;
    Ok(Json(SubmitResponse::new(
        receipt,
        "Request assistance submitted successfully",
    )))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitIdQuery {
    #[serde(default)]
    pub cit_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitIdResponse {
    pub is_valid: bool,
}

pub async fn validate_cit_id(Query(query): Query<CitIdQuery>) -> Json<CitIdResponse> {
    Json(CitIdResponse {
        is_valid: schema::is_valid_cit_id(&query.cit_id),
    })
}

pub async fn test_connection(State(state): State<SharedState>) -> Json<ConnectionReport> {
    Json(state.service.test_connection().await)
}
