use serde::{Deserialize, Serialize};

use crate::forms::attachments::FileMeta;
use crate::forms::{FieldMap, FormKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PitchSubmission {
    pub full_name: String,
    pub course_and_year: String,
    pub cit_id: String,
    pub phone_number: String,
    pub personal_email: String,
    pub type_of_pitch: String,
    pub about_pitch: String,
    pub pen_name: String,
    pub link_url: String,
    pub files: Vec<FileMeta>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestAssistanceSubmission {
    pub full_name: String,
    pub course_and_year: String,
    pub id_number: String,
    pub phone_number: String,
    pub personal_email: String,
    pub organization_name: String,
    pub type_of_request: String,
    pub request_date: String,
    pub request_time: String,
    pub location: String,
    pub request_description: String,
    pub link_url: String,
    pub files: Vec<FileMeta>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SubmissionPayload {
    Pitch(PitchSubmission),
    RequestAssistance(RequestAssistanceSubmission),
}

fn take(fields: &FieldMap, name: &str) -> String {
    fields.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn put(fields: &mut FieldMap, name: &str, value: &str) {
    fields.insert(name.to_string(), value.to_string());
}

impl PitchSubmission {
    pub fn from_fields(fields: &FieldMap, files: Vec<FileMeta>, links: Vec<String>) -> Self {
        PitchSubmission {
            full_name: take(fields, "fullName"),
            course_and_year: take(fields, "courseAndYear"),
            cit_id: take(fields, "citId"),
            phone_number: take(fields, "phoneNumber"),
            personal_email: take(fields, "personalEmail"),
            type_of_pitch: take(fields, "typeOfPitch"),
            about_pitch: take(fields, "aboutPitch"),
            pen_name: take(fields, "penName"),
            link_url: take(fields, "linkUrl"),
            files,
            links,
        }
    }

    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        put(&mut fields, "fullName", &self.full_name);
        put(&mut fields, "courseAndYear", &self.course_and_year);
        put(&mut fields, "citId", &self.cit_id);
        put(&mut fields, "phoneNumber", &self.phone_number);
        put(&mut fields, "personalEmail", &self.personal_email);
        put(&mut fields, "typeOfPitch", &self.type_of_pitch);
        put(&mut fields, "aboutPitch", &self.about_pitch);
        put(&mut fields, "penName", &self.pen_name);
        put(&mut fields, "linkUrl", &self.link_url);
        fields
    }
}

impl RequestAssistanceSubmission {
    pub fn from_fields(fields: &FieldMap, files: Vec<FileMeta>, links: Vec<String>) -> Self {
        RequestAssistanceSubmission {
            full_name: take(fields, "fullName"),
            course_and_year: take(fields, "courseAndYear"),
            id_number: take(fields, "idNumber"),
            phone_number: take(fields, "phoneNumber"),
            personal_email: take(fields, "personalEmail"),
            organization_name: take(fields, "organizationName"),
            type_of_request: take(fields, "typeOfRequest"),
            request_date: take(fields, "requestDate"),
            request_time: take(fields, "requestTime"),
            location: take(fields, "location"),
            request_description: take(fields, "requestDescription"),
            link_url: take(fields, "linkUrl"),
            files,
            links,
        }
    }

    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        put(&mut fields, "fullName", &self.full_name);
        put(&mut fields, "courseAndYear", &self.course_and_year);
        put(&mut fields, "idNumber", &self.id_number);
        put(&mut fields, "phoneNumber", &self.phone_number);
        put(&mut fields, "personalEmail", &self.personal_email);
        put(&mut fields, "organizationName", &self.organization_name);
        put(&mut fields, "typeOfRequest", &self.type_of_request);
        put(&mut fields, "requestDate", &self.request_date);
        put(&mut fields, "requestTime", &self.request_time);
        put(&mut fields, "location", &self.location);
        put(&mut fields, "requestDescription", &self.request_description);
        put(&mut fields, "linkUrl", &self.link_url);
        fields
    }
}

impl SubmissionPayload {
    pub fn build(
        kind: FormKind,
        fields: &FieldMap,
        files: Vec<FileMeta>,
        links: Vec<String>,
    ) -> Self {
        match kind {
            FormKind::Pitch => {
                SubmissionPayload::Pitch(PitchSubmission::from_fields(fields, files, links))
            }
            FormKind::RequestAssistance => SubmissionPayload::RequestAssistance(
                RequestAssistanceSubmission::from_fields(fields, files, links),
            ),
        }
    }

    pub fn kind(&self) -> FormKind {
        match self {
            SubmissionPayload::Pitch(_) => FormKind::Pitch,
            SubmissionPayload::RequestAssistance(_) => FormKind::RequestAssistance,
        }
    }
}

/// What the gateway hands back for an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub submission_id: String,
    pub row_id: u64,
}
