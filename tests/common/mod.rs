use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use pressdesk::config::{Config, Environment, SheetsConfig};
use pressdesk::sheets::MemorySheets;
use pressdesk::state::SharedState;

pub const BOUNDARY: &str = "pressdesk-test-boundary";

/// A running test server backed by an in-memory spreadsheet.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub sheets: Arc<MemorySheets>,
    #[allow(dead_code)]
    pub state: SharedState,
}

impl TestApp {
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    #[allow(dead_code)]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// POST JSON, return (body, status).
    #[allow(dead_code)]
    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// POST without a body, return (body, status).
    #[allow(dead_code)]
    pub async fn post(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    #[allow(dead_code)]
    pub async fn put_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    #[allow(dead_code)]
    pub async fn delete_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .json(body)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Create a draft and return its id.
    #[allow(dead_code)]
    pub async fn create_draft(&self, kind: &str) -> String {
        let (body, status) = self.post_json("/api/drafts", &json!({ "kind": kind })).await;
        assert_eq!(status, StatusCode::CREATED, "create draft failed: {body}");
        body["draftId"].as_str().unwrap().to_string()
    }

    /// Upload files as multipart to a draft. Each entry is (name, mime, size).
    #[allow(dead_code)]
    pub async fn upload(&self, draft_id: &str, files: &[(&str, &str, usize)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/api/drafts/{draft_id}/files")))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart_body(files))
            .send()
            .await
            .expect("upload request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

#[allow(dead_code)]
pub fn multipart_body(files: &[(&str, &str, usize)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, mime, size) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend(std::iter::repeat_n(b'x', *size));
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        environment: Environment::Production,
        max_body_size: 26_214_400,
        trusted_proxies: vec![],
        draft_ttl_secs: 3600,
        submit_rate_limit: 100,
        submit_rate_window_secs: 60,
        static_dir: "static".to_string(),
        log_level: "warn".to_string(),
        sheets: SheetsConfig {
            service_account_email: "portal@test.iam.gserviceaccount.com".to_string(),
            private_key: "unused".to_string(),
            spreadsheet_id: "test-spreadsheet".to_string(),
            owner_email: "editor@test.com".to_string(),
            timeout_secs: 5,
        },
    }
}

/// Spawn a test app with a fresh in-memory spreadsheet.
#[allow(dead_code)]
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), MemorySheets::new("Portal Submissions")).await
}

pub async fn spawn_app_with(config: Config, sheets: MemorySheets) -> TestApp {
    let sheets = Arc::new(sheets);
    let (app, state) = pressdesk::build_app(config, sheets.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        sheets,
        state,
    }
}

/// A pitch payload that passes every server-side check.
#[allow(dead_code)]
pub fn valid_pitch() -> Value {
    json!({
        "fullName": "Juan Dela Cruz",
        "courseAndYear": "BSIT 2nd Year",
        "citId": "22-1437-172",
        "phoneNumber": "+63 912 345 6789",
        "personalEmail": "juan@example.com",
        "typeOfPitch": "Feature",
        "aboutPitch": "A feature on the robotics team's trip to nationals.",
        "penName": "JDC",
        "linkUrl": "",
        "files": [{ "name": "outline.pdf", "size": 2048, "mimeType": "application/pdf" }],
        "links": ["https://example.com/draft"]
    })
}

#[allow(dead_code)]
pub fn valid_request() -> Value {
    json!({
        "fullName": "Maria Santos",
        "courseAndYear": "BSCE 4th Year",
        "idNumber": "19-0001-234",
        "phoneNumber": "+63 917 000 1111",
        "personalEmail": "maria@example.com",
        "organizationName": "Civil Engineering Society",
        "typeOfRequest": "news-coverage",
        "requestDate": "2025-02-14",
        "requestTime": "09:00 AM",
        "location": "CIT-U Gymnasium",
        "requestDescription": "Photo coverage of the society's induction ceremony."
    })
}

/// Step-one values for a pitch draft.
#[allow(dead_code)]
pub fn pitch_personal_info() -> Value {
    json!({
        "fullName": "Juan Dela Cruz",
        "courseAndYear": "BSIT 2nd Year",
        "citId": "22-1437-172",
        "phoneNumber": "+63 912 345 6789",
        "personalEmail": "juan@example.com"
    })
}

#[allow(dead_code)]
pub fn pitch_details() -> Value {
    json!({
        "typeOfPitch": "News",
        "aboutPitch": "Coverage of the new library wing opening.",
        "penName": "JDC"
    })
}
