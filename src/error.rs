use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::forms::flow::FlowError;
use crate::forms::schema::FieldErrors;
use crate::gateway::GatewayError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Validation { message: String, fields: FieldErrors },
    Conflict(String),
    RateLimited(String),
    BadGateway(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Validation { message, .. } => write!(f, "Validation Failed: {message}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::BadGateway(msg) => write!(f, "Bad Gateway: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Validation { message, fields } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "fields": fields }),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, json!({ "error": msg })),
            // Backend failures are shown to the user as-is so they can retry.
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Invalid(fields) => AppError::Validation {
                message: "Please complete all required fields".to_string(),
                fields,
            },
            FlowError::SubmitInProgress | FlowError::AlreadySubmitted | FlowError::WrongStep(_) => {
                AppError::Conflict(err.to_string())
            }
            FlowError::UnknownField(_)
            | FlowError::NotRichText(_)
            | FlowError::MissingAttachment(_)
            | FlowError::InvalidLink(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(fields) => AppError::Validation {
                message: GatewayError::Validation(fields.clone()).to_string(),
                fields,
            },
            GatewayError::MissingAttachment(_)
            | GatewayError::FileRejected(_)
            | GatewayError::InvalidLink(_) => AppError::BadRequest(err.to_string()),
            GatewayError::Storage(_) | GatewayError::Remote(_) | GatewayError::Transport(_) => {
                AppError::BadGateway(err.to_string())
            }
        }
    }
}
