pub mod attachments;
pub mod flow;
pub mod policy;
pub mod samples;
pub mod schema;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use schema::{FieldRule, StepSchema};

/// Field name -> raw value as entered in the form.
pub type FieldMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    Pitch,
    RequestAssistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    First,
    Second,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::First => 1,
            Step::Second => 2,
        }
    }
}

impl FormKind {
    /// Prefix of the generated submission id.
    pub fn id_prefix(self) -> &'static str {
        match self {
            FormKind::Pitch => "PITCH",
            FormKind::RequestAssistance => "RA",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormKind::Pitch => "pitch",
            FormKind::RequestAssistance => "request assistance",
        }
    }

    pub fn schema(self, step: Step) -> &'static StepSchema {
        match (self, step) {
            (FormKind::Pitch, Step::First) => schema::PITCH_PERSONAL_INFO,
            (FormKind::Pitch, Step::Second) => schema::PITCH_DETAILS,
            (FormKind::RequestAssistance, Step::First) => schema::REQUESTER_INFO,
            (FormKind::RequestAssistance, Step::Second) => schema::REQUEST_DETAILS,
        }
    }

    /// Every field key a draft of this kind carries, step one first.
    pub fn field_names(self) -> impl Iterator<Item = &'static str> {
        self.schema(Step::First)
            .iter()
            .chain(self.schema(Step::Second).iter())
            .map(|rule: &FieldRule| rule.field)
    }

    pub fn has_field(self, name: &str) -> bool {
        self.field_names().any(|field| field == name)
    }

    /// Long-form fields edited through the rich-text editor.
    pub fn rich_text_fields(self) -> &'static [&'static str] {
        match self {
            FormKind::Pitch => &["aboutPitch"],
            FormKind::RequestAssistance => &["requestDescription"],
        }
    }

    /// Whether a submission must carry at least one file or link.
    pub fn requires_attachment(self) -> bool {
        matches!(self, FormKind::Pitch)
    }
}
