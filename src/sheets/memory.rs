use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{RowHandle, SheetWriter, SheetsError};

/// In-process spreadsheet with the same header semantics as the Google
/// backend, with latency and failure injection. Backs the test suite; the
/// service binary always writes to Google Sheets.
pub struct MemorySheets {
    title: String,
    /// sheet name -> rows, row 0 being the header
    sheets: Mutex<BTreeMap<String, Vec<Vec<String>>>>,
    latency: Option<Duration>,
    failure: Mutex<Option<String>>,
    appends: AtomicUsize,
}

impl MemorySheets {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            sheets: Mutex::new(BTreeMap::new()),
            latency: None,
            failure: Mutex::new(None),
            appends: AtomicUsize::new(0),
        }
    }

    /// Delay every append, to keep a submission in flight for a while.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make subsequent calls fail with `message`, or succeed again with `None`.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.lock_failure() = message.map(|m| m.to_string());
    }

    /// Number of append calls received, failed ones included.
    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn header(&self, sheet: &str) -> Option<Vec<String>> {
        self.lock_sheets()
            .get(sheet)
            .and_then(|rows| rows.first().cloned())
    }

    /// Data rows of `sheet`, header excluded.
    pub fn rows(&self, sheet: &str) -> Vec<Vec<String>> {
        self.lock_sheets()
            .get(sheet)
            .map(|rows| rows.iter().skip(1).cloned().collect())
            .unwrap_or_default()
    }

    /// Overwrite the header row, as someone editing the sheet by hand would.
    pub fn set_header(&self, sheet: &str, header: Vec<String>) {
        let mut sheets = self.lock_sheets();
        let rows = sheets.entry(sheet.to_string()).or_default();
        match rows.first_mut() {
            Some(first) => *first = header,
            None => rows.push(header),
        }
    }

    fn lock_sheets(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<Vec<String>>>> {
        self.sheets.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_failure(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.failure.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SheetWriter for MemorySheets {
    async fn append_row(
        &self,
        sheet: &str,
        headers: &[&str],
        values: &[String],
    ) -> Result<RowHandle, SheetsError> {
        self.appends.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.lock_failure().clone() {
            return Err(SheetsError::Rejected(message));
        }

        let mut sheets = self.lock_sheets();
        let rows = sheets.entry(sheet.to_string()).or_default();
        let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        match rows.first_mut() {
            Some(first) => *first = header,
            None => rows.push(header),
        }
        rows.push(values.to_vec());

        Ok(RowHandle(rows.len() as u64))
    }

    async fn spreadsheet_title(&self) -> Result<String, SheetsError> {
        if let Some(message) = self.lock_failure().clone() {
            return Err(SheetsError::Rejected(message));
        }
        Ok(self.title.clone())
    }
}
