use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::payload::{SubmissionPayload, SubmitReceipt};
use super::{Gateway, GatewayError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    submission_id: String,
    #[serde(default)]
    row_id: u64,
}

/// Gateway client talking to the RPC routes of a running portal.
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn procedure_url(&self, procedure: &str) -> String {
        format!("{}/api/rpc/{procedure}", self.base_url)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmitReceipt, GatewayError> {
        let req = match &payload {
            SubmissionPayload::Pitch(pitch) => {
                self.client.post(self.procedure_url("pitch.submit")).json(pitch)
            }
            SubmissionPayload::RequestAssistance(request) => self
                .client
                .post(self.procedure_url("requestAssistance.submit"))
                .json(request),
        };

        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            let message = body["error"]
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("Submission failed with HTTP {status}"));
            return Err(GatewayError::Remote(message));
        }

        let body: SubmitResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("Invalid response: {e}")))?;

        Ok(SubmitReceipt {
            submission_id: body.submission_id,
            row_id: body.row_id,
        })
    }
}
