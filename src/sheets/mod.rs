pub mod auth;
pub mod google;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use google::GoogleSheetsClient;
pub use memory::MemorySheets;

/// 1-based row number of an appended row (the header is row 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowHandle(pub u64);

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("Google Sheets authentication failed: {0}")]
    Auth(String),

    #[error("Google Sheets error: {0}")]
    Request(String),

    #[error("Google Sheets error: {message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Google Sheets error: {0}")]
    Rejected(String),
}

/// Append-only row store backing the submissions.
#[async_trait]
pub trait SheetWriter: Send + Sync {
    /// Append `values` to `sheet`, creating it if needed. The header row is
    /// rewritten to `headers` on every call.
    async fn append_row(
        &self,
        sheet: &str,
        headers: &[&str],
        values: &[String],
    ) -> Result<RowHandle, SheetsError>;

    /// Title of the backing spreadsheet; doubles as a connectivity check.
    async fn spreadsheet_title(&self) -> Result<String, SheetsError>;
}

pub struct SheetLayout {
    pub name: &'static str,
    pub headers: &'static [&'static str],
}

pub const PITCH_SHEET: SheetLayout = SheetLayout {
    name: "Pitch Submissions",
    headers: &[
        "Submission ID",
        "Full Name",
        "Course and Year",
        "CIT ID",
        "Phone Number",
        "Personal Email",
        "Type of Pitch",
        "About Pitch",
        "Pen Name",
        "Files",
        "Links",
        "Submitted At",
    ],
};

pub const REQUEST_ASSISTANCE_SHEET: SheetLayout = SheetLayout {
    name: "Request Assistance",
    headers: &[
        "Submission ID",
        "Full Name",
        "Course and Year",
        "ID Number",
        "Phone Number",
        "Personal Email",
        "Organization Name",
        "Type of Request",
        "Request Date",
        "Request Time",
        "Location",
        "Request Description",
        "Files",
        "Links",
        "Submitted At",
    ],
};
