use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::drafts::DraftHandle;
use crate::error::AppError;
use crate::forms::attachments::{AttachmentId, FileAttachment};
use crate::forms::flow::{FormFlow, SubmissionStatus};
use crate::forms::schema::FieldErrors;
use crate::forms::{FieldMap, FormKind};
use crate::richtext::EditorState;
use crate::state::SharedState;

use super::rpc::check_rate_limit;
use super::upload;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub draft_id: Uuid,
    pub kind: FormKind,
    pub current_step: u8,
    pub state: &'static str,
    pub fields: FieldMap,
    pub errors: FieldErrors,
    pub files: Vec<FileAttachment>,
    pub links: Vec<String>,
    pub submission: SubmissionStatus,
}

impl DraftView {
    fn new(draft_id: Uuid, flow: &FormFlow) -> Self {
        Self {
            draft_id,
            kind: flow.kind(),
            current_step: flow.step().number(),
            state: flow.state().name(),
            fields: flow.fields().clone(),
            errors: flow.errors().clone(),
            files: flow.attachments().files().to_vec(),
            links: flow.attachments().links().to_vec(),
            submission: flow.status().clone(),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateDraft {
    pub kind: FormKind,
}

#[derive(Deserialize)]
pub struct LinkBody {
    pub url: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub accepted: Vec<AttachmentId>,
    pub rejected: Vec<String>,
    pub draft: DraftView,
}

fn find(state: &SharedState, id: Uuid) -> Result<DraftHandle, AppError> {
    state
        .drafts
        .get(id)
        .ok_or_else(|| AppError::NotFound("Draft not found".to_string()))
}

pub async fn create(
    State(state): State<SharedState>,
    Json(req): Json<CreateDraft>,
) -> (StatusCode, Json<DraftView>) {
    let (id, handle) = state.drafts.insert(state.new_flow(req.kind));
    tracing::debug!("Created {} draft {id}", req.kind.label());

    let flow = handle.lock().await;
    (StatusCode::CREATED, Json(DraftView::new(id, &flow)))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let flow = handle.lock().await;
    Ok(Json(DraftView::new(id, &flow)))
}

pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.drafts.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Draft not found".to_string()))
    }
}

pub async fn update_fields(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(values): Json<FieldMap>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    flow.set_fields(values)?;
    Ok(Json(DraftView::new(id, &flow)))
}

pub async fn get_content(
    State(state): State<SharedState>,
    Path((id, field)): Path<(Uuid, String)>,
) -> Result<Json<EditorState>, AppError> {
    let handle = find(&state, id)?;
    let flow = handle.lock().await;
    Ok(Json(flow.rich_text(&field)?))
}

pub async fn put_content(
    State(state): State<SharedState>,
    Path((id, field)): Path<(Uuid, String)>,
    Json(content): Json<EditorState>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    flow.set_rich_text(&field, &content)?;
    Ok(Json(DraftView::new(id, &flow)))
}

pub async fn next(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    flow.next()?;
    Ok(Json(DraftView::new(id, &flow)))
}

pub async fn previous(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    flow.previous()?;
    Ok(Json(DraftView::new(id, &flow)))
}

pub async fn upload_files(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let handle = find(&state, id)?;
    let files = upload::parse_files(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;

    let mut flow = handle.lock().await;
    let outcome = flow.attach_files(files)?;
    for reason in &outcome.rejected {
        tracing::debug!("Draft {id}: rejected upload: {reason}");
    }

    Ok(Json(UploadResponse {
        accepted: outcome.accepted,
        rejected: outcome.rejected,
        draft: DraftView::new(id, &flow),
    }))
}

pub async fn remove_file(
    State(state): State<SharedState>,
    Path((id, file_id)): Path<(Uuid, u64)>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    if !flow.remove_file(AttachmentId(file_id))? {
        return Err(AppError::NotFound("File not found".to_string()));
    }
    Ok(Json(DraftView::new(id, &flow)))
}

pub async fn add_link(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<LinkBody>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    flow.add_link(&body.url)?;
    Ok(Json(DraftView::new(id, &flow)))
}

pub async fn remove_link(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<LinkBody>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    flow.remove_link(&body.url)?;
    Ok(Json(DraftView::new(id, &flow)))
}

/// The draft lock is released while the gateway call is in flight; a second
/// submit arriving meanwhile finds the draft `Submitting` and is refused.
/// The gateway call runs in its own task, so a client that disconnects
/// mid-submit still gets its outcome recorded on the draft.
pub async fn submit(
    State(state): State<SharedState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<DraftView>), AppError> {
    let handle = find(&state, id)?;

    let payload = {
        let mut flow = handle.lock().await;
        let previous = flow.status().clone();
        let payload = flow.begin_submit()?;
        // Only submits that would reach the gateway count against the quota.
        if let Err(e) = check_rate_limit(&state, flow.kind(), peer, &headers) {
            flow.abort_submit(previous);
            return Err(e);
        }
        payload
    };

    let gateway = state.gateway.clone();
    let task_handle = handle.clone();
    let task = tokio::spawn(async move {
        let outcome = gateway.submit(payload).await;

        let mut flow = task_handle.lock().await;
        flow.finish_submit(outcome);

        let status = match flow.status() {
            SubmissionStatus::Failed { message } => {
                tracing::warn!("Draft {id} submission failed: {message}");
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::OK,
        };
        (status, DraftView::new(id, &flow))
    });

    let (status, view) = task
        .await
        .map_err(|e| AppError::Internal(format!("Submit task for draft {id} failed: {e}")))?;

    Ok((status, Json(view)))
}

pub async fn dismiss_error(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    flow.dismiss_error();
    Ok(Json(DraftView::new(id, &flow)))
}

/// "Submit another": start a fresh draft under the same id.
pub async fn reset(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, AppError> {
    let handle = find(&state, id)?;
    let mut flow = handle.lock().await;
    flow.start_over(state.config.is_development())?;
    Ok(Json(DraftView::new(id, &flow)))
}
