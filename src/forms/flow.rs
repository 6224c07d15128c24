//! Two-step form state machine.
//!
//! A draft moves `Step1 -> Step2 -> Submitting -> Submitted | SubmitFailed`.
//! A failed submit leaves the draft on step two with everything the user
//! entered, and `Submitted` is terminal until [`FormFlow::start_over`].

use serde::Serialize;

use crate::gateway::{Gateway, GatewayError, SubmissionPayload, SubmitReceipt};
use crate::richtext::{self, EditorState};

use super::attachments::{AttachmentCollector, AttachmentId, FileMeta};
use super::schema::{self, FieldErrors};
use super::{FieldMap, FormKind, Step, policy, samples};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    #[serde(rename_all = "camelCase")]
    Submitted { submission_id: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Step1,
    Step2,
    Submitting,
    Submitted(String),
    SubmitFailed(String),
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Step1 => "step1",
            FlowState::Step2 => "step2",
            FlowState::Submitting => "submitting",
            FlowState::Submitted(_) => "submitted",
            FlowState::SubmitFailed(_) => "submitFailed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("{0} is not a rich-text field")]
    NotRichText(String),

    #[error("Not available on step {}", .0.number())]
    WrongStep(Step),

    #[error("Please complete all required fields")]
    Invalid(FieldErrors),

    #[error("{0}")]
    MissingAttachment(&'static str),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("A submission is already in progress")]
    SubmitInProgress,

    #[error("This draft has already been submitted")]
    AlreadySubmitted,
}

/// Result of handing a batch of files to a draft.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttachOutcome {
    pub accepted: Vec<AttachmentId>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FormFlow {
    kind: FormKind,
    step: Step,
    fields: FieldMap,
    attachments: AttachmentCollector,
    status: SubmissionStatus,
    errors: FieldErrors,
}

impl FormFlow {
    pub fn new(kind: FormKind) -> Self {
        let fields = kind
            .field_names()
            .map(|name| (name.to_string(), String::new()))
            .collect();
        Self::with_fields(kind, fields)
    }

    /// Draft pre-filled with sample values, for development.
    pub fn prefilled(kind: FormKind) -> Self {
        let mut flow = Self::new(kind);
        flow.fields.extend(samples::defaults(kind));
        flow
    }

    fn with_fields(kind: FormKind, fields: FieldMap) -> Self {
        Self {
            kind,
            step: Step::First,
            fields,
            attachments: AttachmentCollector::new(),
            status: SubmissionStatus::Idle,
            errors: FieldErrors::new(),
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn attachments(&self) -> &AttachmentCollector {
        &self.attachments
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Field errors from the last rejected `next` or submit.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn state(&self) -> FlowState {
        match (&self.status, self.step) {
            (SubmissionStatus::Submitting, _) => FlowState::Submitting,
            (SubmissionStatus::Submitted { submission_id }, _) => {
                FlowState::Submitted(submission_id.clone())
            }
            (SubmissionStatus::Failed { message }, _) => FlowState::SubmitFailed(message.clone()),
            (SubmissionStatus::Idle, Step::First) => FlowState::Step1,
            (SubmissionStatus::Idle, Step::Second) => FlowState::Step2,
        }
    }

    fn ensure_editable(&self) -> Result<(), FlowError> {
        match self.status {
            SubmissionStatus::Submitting => Err(FlowError::SubmitInProgress),
            SubmissionStatus::Submitted { .. } => Err(FlowError::AlreadySubmitted),
            _ => Ok(()),
        }
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FlowError> {
        self.ensure_editable()?;
        if !self.kind.has_field(name) {
            return Err(FlowError::UnknownField(name.to_string()));
        }
        self.fields.insert(name.to_string(), value.to_string());
        self.errors.remove(name);
        Ok(())
    }

    /// Merge several values at once. Nothing is applied if any key is unknown.
    pub fn set_fields(&mut self, values: FieldMap) -> Result<(), FlowError> {
        self.ensure_editable()?;
        if let Some(unknown) = values.keys().find(|name| !self.kind.has_field(name)) {
            return Err(FlowError::UnknownField(unknown.clone()));
        }
        for (name, value) in values {
            self.errors.remove(&name);
            self.fields.insert(name, value);
        }
        Ok(())
    }

    pub fn set_rich_text(&mut self, name: &str, state: &EditorState) -> Result<(), FlowError> {
        self.ensure_rich_text(name)?;
        self.set_field(name, &richtext::to_plain_text(state))
    }

    pub fn rich_text(&self, name: &str) -> Result<EditorState, FlowError> {
        self.ensure_rich_text(name)?;
        let text = self.fields.get(name).map(String::as_str).unwrap_or("");
        Ok(richtext::from_plain_text(text))
    }

    fn ensure_rich_text(&self, name: &str) -> Result<(), FlowError> {
        if self.kind.rich_text_fields().contains(&name) {
            Ok(())
        } else {
            Err(FlowError::NotRichText(name.to_string()))
        }
    }

    /// Validate step one and move on to step two.
    pub fn next(&mut self) -> Result<(), FlowError> {
        self.ensure_editable()?;
        if self.step != Step::First {
            return Err(FlowError::WrongStep(self.step));
        }

        match schema::validate(&self.fields, self.kind.schema(Step::First)) {
            Ok(()) => {
                self.errors.clear();
                self.step = Step::Second;
                tracing::debug!("{} draft advanced to step 2", self.kind.label());
                Ok(())
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(FlowError::Invalid(errors))
            }
        }
    }

    /// Back to step one. Entered values and attachments are kept.
    pub fn previous(&mut self) -> Result<(), FlowError> {
        self.ensure_editable()?;
        self.step = Step::First;
        Ok(())
    }

    /// Add files that pass the upload policy; the rest are reported back.
    pub fn attach_files(&mut self, files: Vec<FileMeta>) -> Result<AttachOutcome, FlowError> {
        self.ensure_editable()?;

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for file in files {
            match policy::check_file(&file) {
                Ok(()) => accepted.push(file),
                Err(reason) => rejected.push(reason),
            }
        }

        Ok(AttachOutcome {
            accepted: self.attachments.add_files(accepted),
            rejected,
        })
    }

    pub fn remove_file(&mut self, id: AttachmentId) -> Result<bool, FlowError> {
        self.ensure_editable()?;
        Ok(self.attachments.remove_file(id))
    }

    /// Returns whether the link was added; duplicates and blanks are ignored.
    pub fn add_link(&mut self, url: &str) -> Result<bool, FlowError> {
        self.ensure_editable()?;
        let trimmed = url.trim();
        if !trimmed.is_empty() && !schema::is_absolute_url(trimmed) {
            return Err(FlowError::InvalidLink(trimmed.to_string()));
        }
        Ok(self.attachments.add_link(trimmed))
    }

    pub fn remove_link(&mut self, url: &str) -> Result<bool, FlowError> {
        self.ensure_editable()?;
        Ok(self.attachments.remove_link(url))
    }

    /// Validate the whole draft and enter `Submitting`, returning the payload
    /// to hand to the gateway. Refused while a submission is in flight.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, FlowError> {
        self.ensure_editable()?;
        if self.step != Step::Second {
            return Err(FlowError::WrongStep(self.step));
        }

        let mut errors = FieldErrors::new();
        for step in [Step::First, Step::Second] {
            if let Err(step_errors) = schema::validate(&self.fields, self.kind.schema(step)) {
                errors.extend(step_errors);
            }
        }
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(FlowError::Invalid(errors));
        }
        self.errors.clear();

        policy::check_attachments(
            self.kind,
            self.attachments.files().len(),
            self.attachments.links().len(),
        )
        .map_err(FlowError::MissingAttachment)?;

        self.status = SubmissionStatus::Submitting;
        Ok(SubmissionPayload::build(
            self.kind,
            &self.fields,
            self.attachments.file_metas(),
            self.attachments.links().to_vec(),
        ))
    }

    /// Record the gateway's answer for the submission started by
    /// [`FormFlow::begin_submit`].
    pub fn finish_submit(&mut self, outcome: Result<SubmitReceipt, GatewayError>) {
        if self.status != SubmissionStatus::Submitting {
            tracing::warn!("Ignoring submit result for a draft that is not submitting");
            return;
        }

        self.status = match outcome {
            Ok(receipt) => {
                tracing::debug!("{} draft submitted as {}", self.kind.label(), receipt.submission_id);
                SubmissionStatus::Submitted {
                    submission_id: receipt.submission_id,
                }
            }
            Err(e) => SubmissionStatus::Failed {
                message: e.to_string(),
            },
        };
    }

    /// Undo a `begin_submit` whose payload was never handed to a gateway.
    pub fn abort_submit(&mut self, previous: SubmissionStatus) {
        if self.status == SubmissionStatus::Submitting {
            self.status = previous;
        }
    }

    /// Begin, call the gateway once, and record the outcome.
    pub async fn submit(&mut self, gateway: &dyn Gateway) -> Result<FlowState, FlowError> {
        let payload = self.begin_submit()?;
        let outcome = gateway.submit(payload).await;
        self.finish_submit(outcome);
        Ok(self.state())
    }

    /// Clear a failure banner; the draft stays on step two.
    pub fn dismiss_error(&mut self) {
        if let SubmissionStatus::Failed { .. } = self.status {
            self.status = SubmissionStatus::Idle;
        }
    }

    /// Replace this draft with a fresh one of the same kind.
    pub fn start_over(&mut self, prefill: bool) -> Result<(), FlowError> {
        if self.status == SubmissionStatus::Submitting {
            return Err(FlowError::SubmitInProgress);
        }
        *self = if prefill {
            Self::prefilled(self.kind)
        } else {
            Self::new(self.kind)
        };
        Ok(())
    }
}
