pub mod http;
pub mod payload;
pub mod service;

use async_trait::async_trait;

use crate::forms::schema::FieldErrors;
use crate::sheets::SheetsError;

pub use http::HttpGateway;
pub use payload::{PitchSubmission, RequestAssistanceSubmission, SubmissionPayload, SubmitReceipt};
pub use service::SubmissionService;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{}", describe_fields(.0))]
    Validation(FieldErrors),

    #[error("{0}")]
    MissingAttachment(&'static str),

    #[error("{0}")]
    FileRejected(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Failed to save submission: {0}")]
    Storage(#[from] SheetsError),

    /// Error reported by a remote gateway, carried as-is.
    #[error("{0}")]
    Remote(String),

    #[error("Could not reach the submission service: {0}")]
    Transport(String),
}

fn describe_fields(errors: &FieldErrors) -> String {
    let messages: Vec<&str> = errors.values().map(String::as_str).collect();
    format!("Invalid submission: {}", messages.join("; "))
}

/// Accepts an assembled submission and returns its correlation id.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmitReceipt, GatewayError>;
}
