use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::config::SheetsConfig;

use super::auth::{self, AssertionClaims};
use super::{RowHandle, SheetWriter, SheetsError};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Refresh the access token this long before Google says it expires.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Sheets v4 REST client authenticated as a service account.
pub struct GoogleSheetsClient {
    client: Client,
    service_account_email: String,
    private_key: String,
    spreadsheet_id: String,
    token: Mutex<Option<AccessToken>>,
}

impl GoogleSheetsClient {
    /// Build the client and check that the private key is usable, so a bad
    /// key fails at startup instead of on the first submission.
    pub fn new(config: &SheetsConfig) -> Result<Self, String> {
        let private_key = auth::normalize_private_key(&config.private_key);
        auth::encode_assertion(
            &AssertionClaims::new(&config.service_account_email),
            &private_key,
        )?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            service_account_email: config.service_account_email.clone(),
            private_key,
            spreadsheet_id: config.spreadsheet_id.clone(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let assertion = auth::encode_assertion(
            &AssertionClaims::new(&self.service_account_email),
            &self.private_key,
        )
        .map_err(SheetsError::Auth)?;

        let resp = self
            .client
            .post(auth::TOKEN_URL)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SheetsError::Auth(format!("Token request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SheetsError::Auth(format!("Invalid token response: {e}")))?;

        let lifetime = token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        tracing::debug!("Obtained Google access token (valid {lifetime}s)");
        Ok(token.access_token)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(SHEETS_API)
            .map_err(|e| SheetsError::Request(format!("Invalid API URL: {e}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SheetsError::Request("Invalid API URL".to_string()))?;
            path.pop_if_empty().push(&self.spreadsheet_id);
            path.extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Value, SheetsError> {
        let resp = req
            .send()
            .await
            .map_err(|e| SheetsError::Request(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json()
                .await
                .map_err(|e| SheetsError::Request(format!("Invalid response: {e}")));
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        let message = body["error"]["message"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn sheet_titles(&self, token: &str) -> Result<HashSet<String>, SheetsError> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties.title");

        let body = self.send(self.client.get(url).bearer_auth(token)).await?;

        Ok(body["sheets"]
            .as_array()
            .map(|sheets| {
                sheets
                    .iter()
                    .filter_map(|s| s["properties"]["title"].as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add_sheet(&self, token: &str, sheet: &str) -> Result<(), SheetsError> {
        let url = self.url(&[])?;
        // `{id}:batchUpdate` is a single path segment.
        let url = Url::parse(&format!("{}:batchUpdate", url.as_str().trim_end_matches('/')))
            .map_err(|e| SheetsError::Request(format!("Invalid API URL: {e}")))?;

        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": sheet } } }]
        });
        self.send(self.client.post(url).bearer_auth(token).json(&body))
            .await?;

        tracing::info!("Created sheet '{sheet}'");
        Ok(())
    }

    async fn write_header(&self, token: &str, sheet: &str, headers: &[&str]) -> Result<(), SheetsError> {
        let range = a1_range(sheet);
        let mut url = self.url(&["values", range.as_str()])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({ "values": [headers] });
        self.send(self.client.put(url).bearer_auth(token).json(&body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SheetWriter for GoogleSheetsClient {
    async fn append_row(
        &self,
        sheet: &str,
        headers: &[&str],
        values: &[String],
    ) -> Result<RowHandle, SheetsError> {
        let token = self.access_token().await?;

        if !self.sheet_titles(&token).await?.contains(sheet) {
            self.add_sheet(&token, sheet).await?;
        }
        self.write_header(&token, sheet, headers).await?;

        let append = format!("{}:append", a1_range(sheet));
        let mut url = self.url(&["values", append.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({ "values": [values] });
        let resp = self
            .send(self.client.post(url).bearer_auth(&token).json(&body))
            .await?;

        let range = resp["updates"]["updatedRange"].as_str().unwrap_or("");
        let row = parse_row_number(range).ok_or_else(|| {
            SheetsError::Request(format!("Unexpected append range: '{range}'"))
        })?;

        Ok(RowHandle(row))
    }

    async fn spreadsheet_title(&self) -> Result<String, SheetsError> {
        let token = self.access_token().await?;
        let mut url = self.url(&[])?;
        url.query_pairs_mut().append_pair("fields", "properties.title");

        let body = self.send(self.client.get(url).bearer_auth(&token)).await?;
        Ok(body["properties"]["title"].as_str().unwrap_or("").to_string())
    }
}

fn a1_range(sheet: &str) -> String {
    format!("'{}'!A1", sheet.replace('\'', "''"))
}

/// Row number of the first cell in an A1 range like `'Sheet'!A5:L5`.
pub fn parse_row_number(range: &str) -> Option<u64> {
    let cells = range.rsplit_once('!').map(|(_, cells)| cells).unwrap_or(range);
    let first = cells.split(':').next()?;
    let digits: String = first
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
