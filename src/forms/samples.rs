//! Sample values used to pre-fill drafts in development mode.

use super::{FieldMap, FormKind};

const PITCH_SAMPLE: &[(&str, &str)] = &[
    ("fullName", "John Doe"),
    ("courseAndYear", "BS Computer Science 3rd Year"),
    ("citId", "22-1437-172"),
    ("phoneNumber", "+63 912 345 6789"),
    ("personalEmail", "john.doe@example.com"),
    ("typeOfPitch", "Feature"),
    (
        "aboutPitch",
        "This is a sample pitch about technology trends in 2024. I want to write about how \
         artificial intelligence is transforming various industries and what this means for \
         the future of work.",
    ),
    ("penName", "TechWriter"),
    ("linkUrl", "https://example.com/sample-document.pdf"),
];

const REQUEST_SAMPLE: &[(&str, &str)] = &[
    ("fullName", "John Doe"),
    ("courseAndYear", "BS Computer Science 3rd Year"),
    ("idNumber", "22-1437-172"),
    ("phoneNumber", "+63 912 345 6789"),
    ("personalEmail", "john.doe@example.com"),
    ("organizationName", "College of Computer Studies"),
    ("typeOfRequest", "news-coverage"),
    ("requestDate", "2025-01-15"),
    ("requestTime", "09:00 AM"),
    ("location", "CIT-U Gymnasium"),
    (
        "requestDescription",
        "Coverage of the annual college week opening ceremony, including photos for the \
         official page.",
    ),
    ("linkUrl", ""),
];

pub fn defaults(kind: FormKind) -> FieldMap {
    let sample = match kind {
        FormKind::Pitch => PITCH_SAMPLE,
        FormKind::RequestAssistance => REQUEST_SAMPLE,
    };

    sample
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
