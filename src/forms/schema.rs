use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use validator::{ValidateEmail, ValidateUrl};

use super::FieldMap;

static CIT_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+-\d+-\d+$").unwrap());

/// Field name -> message, one entry per failing field.
pub type FieldErrors = BTreeMap<String, String>;

pub type StepSchema = [FieldRule];

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Non-empty after trimming.
    Required,
    Email,
    /// Institutional id, digit groups separated by dashes.
    CitId,
    MinTrimmed(usize),
    /// Empty, or an absolute URL.
    OptionalUrl,
    /// Calendar date as `YYYY-MM-DD`.
    Date,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub rule: Rule,
    pub message: &'static str,
}

const fn field(field: &'static str, rule: Rule, message: &'static str) -> FieldRule {
    FieldRule {
        field,
        rule,
        message,
    }
}

pub const PITCH_TYPES: &[&str] = &[
    "News",
    "Feature",
    "Editorial",
    "Literary",
    "Event Coverage",
    "Content Idea",
];

pub const REQUEST_TYPES: &[&str] = &["news-coverage", "camera-assistance", "others"];

pub static PITCH_PERSONAL_INFO: &StepSchema = &[
    field("fullName", Rule::Required, "Full name is required"),
    field("courseAndYear", Rule::Required, "Course and year is required"),
    field("citId", Rule::CitId, "CIT ID must be in format XX-XXXX-XXX"),
    field("phoneNumber", Rule::Required, "Phone number is required"),
    field("personalEmail", Rule::Email, "Please enter a valid email address"),
];

pub static PITCH_DETAILS: &StepSchema = &[
    field("typeOfPitch", Rule::OneOf(PITCH_TYPES), "Please select a pitch type"),
    field(
        "aboutPitch",
        Rule::MinTrimmed(10),
        "Please provide more details about your pitch",
    ),
    field("penName", Rule::Required, "Pen name is required"),
    field("linkUrl", Rule::OptionalUrl, "Please enter a valid URL"),
];

pub static REQUESTER_INFO: &StepSchema = &[
    field("fullName", Rule::Required, "Full name is required"),
    field("courseAndYear", Rule::Required, "Course and year is required"),
    field("idNumber", Rule::Required, "ID number is required"),
    field("phoneNumber", Rule::Required, "Phone number is required"),
    field("personalEmail", Rule::Email, "Please enter a valid email address"),
    field(
        "organizationName",
        Rule::Required,
        "Organization or college name is required",
    ),
];

pub static REQUEST_DETAILS: &StepSchema = &[
    field(
        "typeOfRequest",
        Rule::OneOf(REQUEST_TYPES),
        "Please select a request type",
    ),
    field("requestDate", Rule::Date, "Please select a date"),
    field("requestTime", Rule::Required, "Please select a time"),
    field("location", Rule::Required, "Location is required"),
    field(
        "requestDescription",
        Rule::MinTrimmed(10),
        "Please provide more details about your request",
    ),
    field("linkUrl", Rule::OptionalUrl, "Please enter a valid URL"),
];

/// Validate `fields` against one step's rules. Every failing field is
/// reported; a missing key is treated as an empty value.
pub fn validate(fields: &FieldMap, schema: &StepSchema) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    for rule in schema {
        let value = fields.get(rule.field).map(String::as_str).unwrap_or("");
        if !check(rule.rule, value) {
            errors
                .entry(rule.field.to_string())
                .or_insert_with(|| rule.message.to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn check(rule: Rule, value: &str) -> bool {
    match rule {
        Rule::Required => !value.trim().is_empty(),
        Rule::Email => value.trim().validate_email(),
        Rule::CitId => is_valid_cit_id(value),
        Rule::MinTrimmed(min) => value.trim().chars().count() >= min,
        Rule::OptionalUrl => value.is_empty() || is_absolute_url(value),
        Rule::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        Rule::OneOf(options) => options.contains(&value),
    }
}

pub fn is_valid_cit_id(value: &str) -> bool {
    CIT_ID_RE.is_match(value)
}

pub fn is_absolute_url(value: &str) -> bool {
    value.validate_url()
}
