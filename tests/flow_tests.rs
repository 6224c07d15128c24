mod common;

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{TimeZone, Utc};
use ipnet::IpNet;
use regex::Regex;
use serde_json::json;

use pressdesk::client_ip;
use pressdesk::drafts::DraftStore;
use pressdesk::forms::attachments::{AttachmentCollector, FileMeta};
use pressdesk::forms::flow::{FlowError, FlowState, FormFlow, SubmissionStatus};
use pressdesk::forms::schema::{self, Rule};
use pressdesk::forms::{FieldMap, FormKind, Step, policy};
use pressdesk::gateway::service::generate_submission_id;
use pressdesk::gateway::{
    Gateway, GatewayError, HttpGateway, SubmissionPayload, SubmissionService, SubmitReceipt,
};
use pressdesk::rate_limit::SubmissionRateLimiter;
use pressdesk::richtext::{self, EditorState};
use pressdesk::sheets::google::parse_row_number;
use pressdesk::sheets::MemorySheets;

// ── Fakes ───────────────────────────────────────────────────────

#[derive(Default)]
struct CountingGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl Gateway for CountingGateway {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmitReceipt, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SubmitReceipt {
            submission_id: format!("{}-TEST-{n}", payload.kind().id_prefix()),
            row_id: n as u64 + 2,
        })
    }
}

struct FailingGateway;

#[async_trait]
impl Gateway for FailingGateway {
    async fn submit(&self, _payload: SubmissionPayload) -> Result<SubmitReceipt, GatewayError> {
        Err(GatewayError::Remote(
            "Google Sheets error: quota exceeded".to_string(),
        ))
    }
}

fn file(name: &str, mime: &str, size: u64) -> FileMeta {
    FileMeta {
        name: name.to_string(),
        size,
        mime_type: mime.to_string(),
    }
}

fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn pitch_on_step_two() -> FormFlow {
    let mut flow = FormFlow::new(FormKind::Pitch);
    flow.set_fields(fields(&[
        ("fullName", "Juan Dela Cruz"),
        ("courseAndYear", "BSIT 2nd Year"),
        ("citId", "22-1437-172"),
        ("phoneNumber", "+63 912 345 6789"),
        ("personalEmail", "juan@example.com"),
    ]))
    .unwrap();
    flow.next().unwrap();
    flow.set_fields(fields(&[
        ("typeOfPitch", "Editorial"),
        ("aboutPitch", "On the new tuition policy and what it means."),
        ("penName", "JDC"),
    ]))
    .unwrap();
    flow
}

// ── Attachments ─────────────────────────────────────────────────

#[test]
fn removing_one_of_two_same_named_files() {
    let mut collector = AttachmentCollector::new();
    let ids = collector.add_files(vec![
        file("scan.pdf", "application/pdf", 100),
        file("scan.pdf", "application/pdf", 200),
    ]);
    assert_ne!(ids[0], ids[1]);

    assert!(collector.remove_file(ids[0]));
    assert_eq!(collector.files().len(), 1);
    assert_eq!(collector.files()[0].meta.size, 200);
    assert!(!collector.remove_file(ids[0]));
}

#[test]
fn file_ids_are_not_reused_after_removal() {
    let mut collector = AttachmentCollector::new();
    let first = collector.add_files(vec![file("a.txt", "text/plain", 1)]);
    collector.remove_file(first[0]);
    let second = collector.add_files(vec![file("a.txt", "text/plain", 1)]);
    assert_ne!(first[0], second[0]);
}

#[test]
fn links_are_trimmed_and_deduplicated() {
    let mut collector = AttachmentCollector::new();
    assert!(collector.add_link(" https://example.com "));
    assert!(!collector.add_link("https://example.com"));
    assert!(!collector.add_link("   "));
    assert_eq!(collector.links(), ["https://example.com"]);

    assert!(collector.remove_link("https://example.com"));
    assert!(collector.links().is_empty());
}

#[test]
fn file_policy() {
    assert!(policy::check_file(&file("a.pdf", "application/pdf", 1024)).is_ok());
    assert!(policy::check_file(&file("a.PNG", "IMAGE/PNG", 1024)).is_ok());

    let err = policy::check_file(&file("run.exe", "application/x-msdownload", 10)).unwrap_err();
    assert!(err.contains("run.exe"));
    assert!(err.contains("is not allowed"));

    let err = policy::check_file(&file("big.pdf", "application/pdf", policy::MAX_FILE_SIZE + 1))
        .unwrap_err();
    assert_eq!(err, "File \"big.pdf\" is larger than 10MB");
    assert!(policy::check_file(&file("edge.pdf", "application/pdf", policy::MAX_FILE_SIZE)).is_ok());
}

#[test]
fn only_pitches_require_an_attachment() {
    assert_eq!(
        policy::check_attachments(FormKind::Pitch, 0, 0),
        Err(policy::MISSING_ATTACHMENT)
    );
    assert!(policy::check_attachments(FormKind::Pitch, 0, 1).is_ok());
    assert!(policy::check_attachments(FormKind::Pitch, 1, 0).is_ok());
    assert!(policy::check_attachments(FormKind::RequestAssistance, 0, 0).is_ok());
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn validator_reports_every_failing_field() {
    let values = fields(&[("fullName", "Juan"), ("citId", "22-1437"), ("personalEmail", "x")]);
    let errors = schema::validate(&values, schema::PITCH_PERSONAL_INFO).unwrap_err();

    assert_eq!(errors.len(), 4);
    assert_eq!(errors["citId"], "CIT ID must be in format XX-XXXX-XXX");
    assert_eq!(errors["personalEmail"], "Please enter a valid email address");
    assert!(errors.contains_key("courseAndYear"));
    assert!(errors.contains_key("phoneNumber"));
}

#[test]
fn required_fields_ignore_surrounding_whitespace() {
    assert!(!schema::check(Rule::Required, "   "));
    assert!(schema::check(Rule::Required, " a "));
    assert!(!schema::check(Rule::MinTrimmed(10), "   123456789   "));
    assert!(schema::check(Rule::MinTrimmed(10), "1234567890"));
}

#[test]
fn email_rule_ignores_surrounding_whitespace() {
    assert!(schema::check(Rule::Email, " a@b.com "));
    assert!(schema::check(Rule::Email, "a@b.com"));
    assert!(!schema::check(Rule::Email, "   "));
}

#[test]
fn aborted_submit_restores_previous_status() {
    let mut flow = pitch_on_step_two();
    flow.add_link("https://example.com/notes").unwrap();

    let previous = flow.status().clone();
    flow.begin_submit().unwrap();
    flow.abort_submit(previous);

    assert_eq!(flow.state(), FlowState::Step2);
    assert!(flow.set_field("penName", "X").is_ok());
}

#[test]
fn cit_id_format() {
    assert!(schema::is_valid_cit_id("22-1437-172"));
    assert!(schema::is_valid_cit_id("1-2-3"));
    assert!(!schema::is_valid_cit_id("221437172"));
    assert!(!schema::is_valid_cit_id("22-1437"));
    assert!(!schema::is_valid_cit_id("22-14a7-172"));
    assert!(!schema::is_valid_cit_id(" 22-1437-172"));
}

#[test]
fn optional_url_and_date_rules() {
    assert!(schema::check(Rule::OptionalUrl, ""));
    assert!(schema::check(Rule::OptionalUrl, "https://example.com/doc.pdf"));
    assert!(!schema::check(Rule::OptionalUrl, "example dot com"));

    assert!(schema::check(Rule::Date, "2025-02-28"));
    assert!(!schema::check(Rule::Date, "2025-02-30"));
    assert!(!schema::check(Rule::Date, ""));
}

// ── Rich text ───────────────────────────────────────────────────

#[test]
fn rich_text_flattens_blocks_and_inline_nodes() {
    let state: EditorState = serde_json::from_value(json!({
        "root": {
            "type": "root",
            "children": [
                { "type": "paragraph", "children": [
                    { "type": "text", "text": "Hello", "format": 1 },
                    { "type": "link", "url": "https://x", "children": [{ "type": "text", "text": "world" }] }
                ] },
                { "type": "list", "children": [
                    { "type": "listitem", "children": [{ "type": "text", "text": "one" }] },
                    { "type": "listitem", "children": [{ "type": "text", "text": "two" }] }
                ] }
            ]
        }
    }))
    .unwrap();

    assert_eq!(richtext::to_plain_text(&state), "Hello world\none two");
}

#[test]
fn empty_editor_flattens_to_empty_string() {
    let state: EditorState =
        serde_json::from_value(json!({ "root": { "type": "root", "children": [] } })).unwrap();
    assert_eq!(richtext::to_plain_text(&state), "");
}

#[test]
fn rehydrate_then_flatten_is_stable() {
    for text in ["A pitch about the library", "  padded  ", ""] {
        let once = richtext::from_plain_text(text);
        let twice = richtext::from_plain_text(&richtext::to_plain_text(&once));
        assert_eq!(once, twice);
        assert_eq!(richtext::to_plain_text(&once), text.trim());
    }
}

// ── Form flow ───────────────────────────────────────────────────

#[test]
fn next_requires_valid_step_one() {
    let mut flow = FormFlow::new(FormKind::Pitch);
    let err = flow.next().unwrap_err();
    assert!(matches!(err, FlowError::Invalid(ref e) if e.len() == 5));
    assert_eq!(flow.state(), FlowState::Step1);
    assert_eq!(flow.errors().len(), 5);

    flow.set_field("citId", "22-1437-172").unwrap();
    assert!(!flow.errors().contains_key("citId"));
}

#[test]
fn previous_keeps_values_and_attachments() {
    let mut flow = pitch_on_step_two();
    flow.add_link("https://example.com/notes").unwrap();
    flow.attach_files(vec![file("a.pdf", "application/pdf", 10)])
        .unwrap();

    flow.previous().unwrap();
    assert_eq!(flow.step(), Step::First);
    flow.previous().unwrap();
    assert_eq!(flow.step(), Step::First);

    flow.next().unwrap();
    assert_eq!(flow.fields()["penName"], "JDC");
    assert_eq!(flow.attachments().links().len(), 1);
    assert_eq!(flow.attachments().files().len(), 1);
}

#[test]
fn attach_files_reports_rejections() {
    let mut flow = FormFlow::new(FormKind::RequestAssistance);
    let outcome = flow
        .attach_files(vec![
            file("brief.docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document", 10),
            file("clip.mp4", "video/mp4", 10),
        ])
        .unwrap();

    assert_eq!(outcome.accepted.len(), 1);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(flow.attachments().files()[0].meta.name, "brief.docx");
}

#[test]
fn unknown_and_non_rich_text_fields_are_refused() {
    let mut flow = FormFlow::new(FormKind::Pitch);
    assert!(matches!(
        flow.set_field("organizationName", "x"),
        Err(FlowError::UnknownField(_))
    ));
    assert!(matches!(flow.rich_text("penName"), Err(FlowError::NotRichText(_))));

    let before = flow.fields().clone();
    let result = flow.set_fields(fields(&[("penName", "X"), ("bogus", "y")]));
    assert!(result.is_err());
    assert_eq!(flow.fields(), &before);
}

#[tokio::test]
async fn pitch_without_attachments_is_blocked_before_the_gateway() {
    let gateway = CountingGateway::default();
    let mut flow = pitch_on_step_two();

    let err = flow.submit(&gateway).await.unwrap_err();
    assert_eq!(err.to_string(), "Please provide at least one file or link");
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    assert_eq!(flow.state(), FlowState::Step2);
}

#[tokio::test]
async fn request_assistance_submits_without_attachments() {
    let gateway = CountingGateway::default();
    let mut flow = FormFlow::prefilled(FormKind::RequestAssistance);
    flow.next().unwrap();

    let state = flow.submit(&gateway).await.unwrap();
    assert_eq!(state, FlowState::Submitted("RA-TEST-0".to_string()));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn successful_submit_is_terminal() {
    let gateway = CountingGateway::default();
    let mut flow = pitch_on_step_two();
    flow.add_link("https://example.com/notes").unwrap();

    let state = flow.submit(&gateway).await.unwrap();
    assert_eq!(state, FlowState::Submitted("PITCH-TEST-0".to_string()));

    assert!(matches!(flow.submit(&gateway).await, Err(FlowError::AlreadySubmitted)));
    assert!(matches!(flow.set_field("penName", "X"), Err(FlowError::AlreadySubmitted)));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

    flow.start_over(false).unwrap();
    assert_eq!(flow.state(), FlowState::Step1);
    assert_eq!(flow.fields()["penName"], "");
    assert!(flow.attachments().links().is_empty());
}

#[tokio::test]
async fn gateway_failure_keeps_everything_on_step_two() {
    let mut flow = pitch_on_step_two();
    flow.add_link("https://example.com/notes").unwrap();
    flow.attach_files(vec![file("a.pdf", "application/pdf", 10)])
        .unwrap();

    let state = flow.submit(&FailingGateway).await.unwrap();
    assert_eq!(
        state,
        FlowState::SubmitFailed("Google Sheets error: quota exceeded".to_string())
    );
    assert_eq!(flow.step(), Step::Second);
    assert_eq!(flow.fields()["aboutPitch"], "On the new tuition policy and what it means.");
    assert_eq!(flow.attachments().files().len(), 1);

    flow.dismiss_error();
    assert_eq!(flow.state(), FlowState::Step2);

    // Retry goes through
    let gateway = CountingGateway::default();
    assert!(matches!(flow.submit(&gateway).await, Ok(FlowState::Submitted(_))));
}

#[test]
fn second_begin_submit_is_refused_while_in_flight() {
    let mut flow = pitch_on_step_two();
    flow.add_link("https://example.com/notes").unwrap();

    let payload = flow.begin_submit().unwrap();
    assert_eq!(payload.kind(), FormKind::Pitch);
    assert_eq!(flow.state(), FlowState::Submitting);

    assert!(matches!(flow.begin_submit(), Err(FlowError::SubmitInProgress)));
    assert!(matches!(flow.start_over(false), Err(FlowError::SubmitInProgress)));

    flow.finish_submit(Ok(SubmitReceipt {
        submission_id: "PITCH-1-abc".to_string(),
        row_id: 2,
    }));
    assert_eq!(
        flow.status(),
        &SubmissionStatus::Submitted {
            submission_id: "PITCH-1-abc".to_string()
        }
    );
}

#[test]
fn payload_carries_trimmed_values_and_attachments() {
    let mut flow = pitch_on_step_two();
    flow.set_field("penName", "  JDC  ").unwrap();
    flow.attach_files(vec![file("a.pdf", "application/pdf", 10)])
        .unwrap();

    let SubmissionPayload::Pitch(pitch) = flow.begin_submit().unwrap() else {
        panic!("expected a pitch payload");
    };
    assert_eq!(pitch.pen_name, "JDC");
    assert_eq!(pitch.type_of_pitch, "Editorial");
    assert_eq!(pitch.files[0].name, "a.pdf");
    assert!(pitch.links.is_empty());
}

// ── Gateway ─────────────────────────────────────────────────────

#[test]
fn submission_id_format() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
    let re = Regex::new(r"^PITCH-1740817800000-[0-9a-z]{7}$").unwrap();

    let id = generate_submission_id(FormKind::Pitch, now);
    assert!(re.is_match(&id), "unexpected id {id}");
    assert!(generate_submission_id(FormKind::RequestAssistance, now).starts_with("RA-1740817800000-"));
}

#[tokio::test]
async fn service_rejects_invalid_links() {
    let sheets = Arc::new(MemorySheets::new("Portal"));
    let service = SubmissionService::new(sheets.clone(), "editor@test.com");

    let mut flow = pitch_on_step_two();
    flow.add_link("https://example.com/ok").unwrap();
    let SubmissionPayload::Pitch(mut pitch) = flow.begin_submit().unwrap() else {
        panic!("expected a pitch payload");
    };
    pitch.links.push("javascript-ish".to_string());

    let err = service.submit_pitch(pitch).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidLink(_)));
    assert_eq!(sheets.append_calls(), 0);
}

#[tokio::test]
async fn service_errors_carry_the_backend_message() {
    let sheets = Arc::new(MemorySheets::new("Portal"));
    sheets.fail_with(Some("quota exceeded"));
    let service = SubmissionService::new(sheets, "editor@test.com");

    let mut flow = FormFlow::prefilled(FormKind::RequestAssistance);
    flow.next().unwrap();
    let state = flow.submit(&service).await.unwrap();
    assert_eq!(
        state,
        FlowState::SubmitFailed(
            "Failed to save submission: Google Sheets error: quota exceeded".to_string()
        )
    );
}

#[tokio::test]
async fn http_gateway_round_trips_through_the_rpc_routes() {
    let app = common::spawn_app().await;
    let gateway = HttpGateway::new(&app.base_url(), Duration::from_secs(5)).unwrap();

    let mut flow = pitch_on_step_two();
    flow.add_link("https://example.com/notes").unwrap();
    let state = flow.submit(&gateway).await.unwrap();

    let FlowState::Submitted(id) = state else {
        panic!("expected submitted, got {state:?}");
    };
    assert!(id.starts_with("PITCH-"));
    assert_eq!(app.sheets.rows("Pitch Submissions")[0][0], id);
}

#[tokio::test]
async fn http_gateway_surfaces_server_errors_verbatim() {
    let app = common::spawn_app().await;
    app.sheets.fail_with(Some("quota exceeded"));
    let gateway = HttpGateway::new(&app.base_url(), Duration::from_secs(5)).unwrap();

    let mut flow = pitch_on_step_two();
    flow.add_link("https://example.com/notes").unwrap();
    let state = flow.submit(&gateway).await.unwrap();

    assert_eq!(
        state,
        FlowState::SubmitFailed(
            "Failed to save submission: Google Sheets error: quota exceeded".to_string()
        )
    );
    assert_eq!(flow.step(), Step::Second);
}

// ── Sheets ──────────────────────────────────────────────────────

#[test]
fn row_number_from_updated_range() {
    assert_eq!(parse_row_number("'Pitch Submissions'!A5:L5"), Some(5));
    assert_eq!(parse_row_number("Sheet1!A12:O12"), Some(12));
    assert_eq!(parse_row_number("'Pitch Submissions'!"), None);
}

#[tokio::test]
async fn memory_sheet_numbers_rows_after_the_header() {
    use pressdesk::sheets::{PITCH_SHEET, SheetWriter};

    let sheets = MemorySheets::new("Portal");
    let values = vec!["x".to_string(); PITCH_SHEET.headers.len()];

    let first = sheets
        .append_row(PITCH_SHEET.name, PITCH_SHEET.headers, &values)
        .await
        .unwrap();
    let second = sheets
        .append_row(PITCH_SHEET.name, PITCH_SHEET.headers, &values)
        .await
        .unwrap();

    assert_eq!(first.0, 2);
    assert_eq!(second.0, 3);
    assert_eq!(sheets.rows(PITCH_SHEET.name).len(), 2);
}

// ── Client IP and rate limiting ─────────────────────────────────

#[test]
fn forwarded_for_is_only_trusted_from_proxies() {
    let proxy: IpAddr = "10.0.0.1".parse().unwrap();
    let stranger: IpAddr = "203.0.113.9".parse().unwrap();
    let trusted: Vec<IpNet> = vec!["10.0.0.0/8".parse().unwrap()];

    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", "198.51.100.7, 10.0.0.2".parse().unwrap());

    assert_eq!(
        client_ip::extract(&headers, proxy, &trusted),
        "198.51.100.7".parse::<IpAddr>().unwrap()
    );
    assert_eq!(client_ip::extract(&headers, stranger, &trusted), stranger);
    assert_eq!(client_ip::extract(&headers, proxy, &[]), proxy);
}

#[test]
fn rate_limiter_counts_per_form_and_address() {
    let limiter = SubmissionRateLimiter::new(2, 60);
    let a: IpAddr = "192.0.2.1".parse().unwrap();
    let b: IpAddr = "192.0.2.2".parse().unwrap();

    assert!(limiter.check(FormKind::Pitch, a).is_ok());
    assert!(limiter.check(FormKind::Pitch, a).is_ok());
    let retry_after = limiter.check(FormKind::Pitch, a).unwrap_err();
    assert!(retry_after <= 60);

    assert!(limiter.check(FormKind::Pitch, b).is_ok());
    assert!(limiter.check(FormKind::RequestAssistance, a).is_ok());
}

// ── Drafts ──────────────────────────────────────────────────────

#[tokio::test]
async fn drafts_expire_after_ttl() {
    let store = DraftStore::new(Duration::from_millis(50));
    let (stale, _) = store.insert(FormFlow::new(FormKind::Pitch));
    tokio::time::sleep(Duration::from_millis(80)).await;
    let (fresh, _) = store.insert(FormFlow::new(FormKind::Pitch));

    assert_eq!(store.evict_expired(), 1);
    assert!(store.get(stale).is_none());
    assert!(store.get(fresh).is_some());
    assert_eq!(store.len(), 1);
}
