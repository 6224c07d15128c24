use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;

use crate::forms::attachments::FileMeta;
use crate::forms::schema::{self, FieldErrors};
use crate::forms::{FieldMap, FormKind, Step, policy};
use crate::sheets::{PITCH_SHEET, REQUEST_ASSISTANCE_SHEET, SheetLayout, SheetWriter};

use super::payload::{
    PitchSubmission, RequestAssistanceSubmission, SubmissionPayload, SubmitReceipt,
};
use super::{Gateway, GatewayError};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
}

/// Server side of the submission boundary. Re-validates everything the
/// client already checked before writing a row.
pub struct SubmissionService {
    sheets: Arc<dyn SheetWriter>,
    owner_email: String,
}

impl SubmissionService {
    pub fn new(sheets: Arc<dyn SheetWriter>, owner_email: impl Into<String>) -> Self {
        Self {
            sheets,
            owner_email: owner_email.into(),
        }
    }

    pub async fn submit_pitch(&self, pitch: PitchSubmission) -> Result<SubmitReceipt, GatewayError> {
        verify(FormKind::Pitch, &pitch.to_fields(), &pitch.files, &pitch.links)?;

        let submission_id = generate_submission_id(FormKind::Pitch, Utc::now());
        let submitted_at = timestamp(Utc::now());
        let row = vec![
            submission_id.clone(),
            pitch.full_name,
            pitch.course_and_year,
            pitch.cit_id,
            pitch.phone_number,
            pitch.personal_email,
            pitch.type_of_pitch,
            pitch.about_pitch,
            pitch.pen_name,
            join_files(&pitch.files),
            join_links(&pitch.links),
            submitted_at,
        ];

        self.write(&PITCH_SHEET, submission_id, row).await
    }

    pub async fn submit_request_assistance(
        &self,
        request: RequestAssistanceSubmission,
    ) -> Result<SubmitReceipt, GatewayError> {
        verify(
            FormKind::RequestAssistance,
            &request.to_fields(),
            &request.files,
            &request.links,
        )?;

        let submission_id = generate_submission_id(FormKind::RequestAssistance, Utc::now());
        let submitted_at = timestamp(Utc::now());
        let row = vec![
            submission_id.clone(),
            request.full_name,
            request.course_and_year,
            request.id_number,
            request.phone_number,
            request.personal_email,
            request.organization_name,
            request.type_of_request,
            request.request_date,
            request.request_time,
            request.location,
            request.request_description,
            join_files(&request.files),
            join_links(&request.links),
            submitted_at,
        ];

        self.write(&REQUEST_ASSISTANCE_SHEET, submission_id, row).await
    }

    async fn write(
        &self,
        layout: &SheetLayout,
        submission_id: String,
        row: Vec<String>,
    ) -> Result<SubmitReceipt, GatewayError> {
        let handle = self
            .sheets
            .append_row(layout.name, layout.headers, &row)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store {submission_id} in '{}': {e}", layout.name);
                GatewayError::from(e)
            })?;

        tracing::info!(
            "Stored {submission_id} in '{}' at row {}",
            layout.name,
            handle.0
        );

        Ok(SubmitReceipt {
            submission_id,
            row_id: handle.0,
        })
    }

    pub async fn test_connection(&self) -> ConnectionReport {
        match self.sheets.spreadsheet_title().await {
            Ok(title) => ConnectionReport {
                success: true,
                message: format!("Connected to spreadsheet '{title}' (owner {})", self.owner_email),
            },
            Err(e) => {
                tracing::warn!("Spreadsheet connection check failed: {e}");
                ConnectionReport {
                    success: false,
                    message: e.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl Gateway for SubmissionService {
    async fn submit(&self, payload: SubmissionPayload) -> Result<SubmitReceipt, GatewayError> {
        match payload {
            SubmissionPayload::Pitch(pitch) => self.submit_pitch(pitch).await,
            SubmissionPayload::RequestAssistance(request) => {
                self.submit_request_assistance(request).await
            }
        }
    }
}

/// Structural checks run on every incoming payload, whatever the client did.
fn verify(
    kind: FormKind,
    fields: &FieldMap,
    files: &[FileMeta],
    links: &[String],
) -> Result<(), GatewayError> {
    let mut errors = FieldErrors::new();
    for step in [Step::First, Step::Second] {
        if let Err(step_errors) = schema::validate(fields, kind.schema(step)) {
            errors.extend(step_errors);
        }
    }
    if !errors.is_empty() {
        return Err(GatewayError::Validation(errors));
    }

    policy::check_attachments(kind, files.len(), links.len())
        .map_err(GatewayError::MissingAttachment)?;

    for file in files {
        policy::check_file(file).map_err(GatewayError::FileRejected)?;
    }

    if let Some(link) = links.iter().find(|link| !schema::is_absolute_url(link)) {
        return Err(GatewayError::InvalidLink(link.clone()));
    }

    Ok(())
}

/// `<PREFIX>-<epoch millis>-<7 base36 chars>`. Not checked for collisions.
pub fn generate_submission_id(kind: FormKind, now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}-{suffix}", kind.id_prefix(), now.timestamp_millis())
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn join_files(files: &[FileMeta]) -> String {
    if files.is_empty() {
        return "No files uploaded".to_string();
    }
    files
        .iter()
        .map(|file| file.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_links(links: &[String]) -> String {
    if links.is_empty() {
        return "No links provided".to_string();
    }
    links.join(", ")
}
