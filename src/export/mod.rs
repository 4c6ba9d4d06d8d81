//! Export of the filtered reimbursement view
//!
//! Every format shares the same six-column row shape built by
//! [`rows_for_export`]. Each serializer renders the whole file in memory and
//! [`export`] writes it next to its final name before renaming it in place.

pub mod csv;
pub mod pdf;
pub mod xlsx;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

use crate::reimbursement::Reimbursement;

/// Column headers, in order, for all three formats
pub const COLUMNS: [&str; 6] = [
    "Expense Category",
    "Driver",
    "Amount (FRW)",
    "Status",
    "Date",
    "Created Date",
];

pub const AMOUNT_COLUMN: usize = 2;

/// Base name shared by every exported file
const FILE_STEM: &str = "reimbursements";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Excel error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Pdf, ExportFormat::Xlsx, ExportFormat::Csv];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.{}", FILE_STEM, self.extension())
    }

    /// Label used in the download menu
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "Download as PDF",
            ExportFormat::Xlsx => "Download as Excel",
            ExportFormat::Csv => "Download as CSV",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF downloaded successfully",
            ExportFormat::Xlsx => "Excel file downloaded successfully",
            ExportFormat::Csv => "CSV file downloaded successfully",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "Error generating PDF",
            ExportFormat::Xlsx => "Error generating Excel file",
            ExportFormat::Csv => "Error generating CSV file",
        }
    }
}

/// One exported line, already formatted as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub category: String,
    pub driver: String,
    pub amount: String,
    pub status: String,
    pub date: String,
    pub created_date: String,
}

impl ExportRow {
    pub fn from_record(record: &Reimbursement) -> Self {
        Self {
            category: record.category().unwrap_or_default().to_string(),
            driver: record.phone_number().unwrap_or_default().to_string(),
            amount: record.amount().map(|a| a.to_string()).unwrap_or_default(),
            status: record.status_label().to_string(),
            date: record.date().unwrap_or_default().to_string(),
            created_date: format_created_date(record.created_at.as_deref()),
        }
    }

    /// Cells in [`COLUMNS`] order
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.category,
            &self.driver,
            &self.amount,
            &self.status,
            &self.date,
            &self.created_date,
        ]
    }
}

pub fn rows_for_export(records: &[&Reimbursement]) -> Vec<ExportRow> {
    records.iter().map(|r| ExportRow::from_record(r)).collect()
}

/// Short local date (`M/D/YYYY`) for a server timestamp.
///
/// Accepts RFC 3339, an offset-less `YYYY-MM-DDTHH:MM:SS[.f]` (read as local
/// time) and a bare `YYYY-MM-DD` (read as UTC midnight). Anything else, or a
/// missing value, prints `Invalid Date`.
pub fn format_created_date(created_at: Option<&str>) -> String {
    match created_at.and_then(parse_timestamp) {
        Some(local) => format_short_date(&local),
        None => "Invalid Date".to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).with_timezone(&Local))
}

pub fn format_short_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%-m/%-d/%Y").to_string()
}

/// Render `rows` as `format` and write the file into `dir`
pub fn export(format: ExportFormat, rows: &[ExportRow], dir: &Path) -> Result<PathBuf, ExportError> {
    let bytes = match format {
        ExportFormat::Pdf => pdf::render(rows, Local::now())?,
        ExportFormat::Xlsx => xlsx::render(rows)?,
        ExportFormat::Csv => csv::render(rows)?,
    };

    let path = dir.join(format.file_name());
    write_atomic(&path, &bytes)?;
    tracing::info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// Write to a sibling temp file and rename over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| FILE_STEM.to_string());
    let tmp = path.with_file_name(format!(".{}.part", file_name));

    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
