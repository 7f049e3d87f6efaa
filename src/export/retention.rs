use crate::constants::{REPORT_DATE_PATTERN, REPORT_EXTENSION, REPORT_MARKERS};
use crate::errors::{AppError, AppResult};
use crate::models::ReportFile;
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Cached regex matching the trailing `MM-DD-YYYY` of a report name.
static REPORT_DATE_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportNameError {
    /// The name lacks the report marker or the archive extension
    #[error("not a report archive")]
    NotAReport,
    /// The name looks like a report but carries no valid date
    #[error("no valid MM-DD-YYYY date in '{0}'")]
    InvalidDate(String),
}

/// Counts reported by [`prune`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub kept: usize,
    pub deleted: usize,
    /// Report archives left alone because their date could not be parsed
    pub skipped: usize,
    /// Deletions that failed
    pub failed: usize,
}

/// Parses the report date embedded in an archive name.
///
/// Recognised names carry a report marker (`All Grades-` or its URL-encoded
/// form) followed by `MM-DD-YYYY`, optionally a `T...` time part, and end in
/// `.zip`, e.g. `All Grades-10-19-2026T06-00-00.zip`.
pub fn parse_report_date(filename: &str) -> Result<NaiveDate, ReportNameError> {
    let stem = filename
        .strip_suffix(REPORT_EXTENSION)
        .ok_or(ReportNameError::NotAReport)?;
    let after_marker = REPORT_MARKERS
        .iter()
        .find_map(|marker| stem.split_once(marker).map(|(_, rest)| rest))
        .ok_or(ReportNameError::NotAReport)?;

    let date_part = after_marker.split('T').next().unwrap_or_default();

    let regex = REPORT_DATE_REGEX.get_or_init(|| {
        Regex::new(REPORT_DATE_PATTERN).expect("REPORT_DATE_PATTERN is a valid regex pattern")
    });
    let invalid = || ReportNameError::InvalidDate(filename.to_string());
    let caps = regex.captures(date_part).ok_or_else(invalid)?;

    let month: u32 = caps[1].parse().map_err(|_| invalid())?;
    let day: u32 = caps[2].parse().map_err(|_| invalid())?;
    let year: i32 = caps[3].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Keeps the `keep` most recent report archives in `directory` and deletes
/// the rest.
///
/// # Behavior
///
/// - Files without the report marker or `.zip` extension are ignored.
/// - Report archives whose date cannot be parsed are logged and never deleted.
/// - Archives are ordered by date, newest first; archives sharing a date are
///   ordered by filename, descending.
/// - A failed deletion is logged and the remaining archives are still
///   processed.
///
/// # Errors
///
/// Returns `IoError` only if the directory listing itself fails. A missing
/// directory is treated as empty.
pub async fn prune(directory: &Path, keep: usize) -> AppResult<PruneSummary> {
    let mut summary = PruneSummary::default();

    if !directory.exists() {
        info!(directory = %directory.display(), "Download directory does not exist, nothing to prune");
        return Ok(summary);
    }

    let mut reports = Vec::new();
    let mut entries = tokio::fs::read_dir(directory).await.map_err(|e| {
        AppError::IoError(format!("Failed to list {}: {e}", directory.display()))
    })?;

    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        AppError::IoError(format!("Failed to list {}: {e}", directory.display()))
    })? {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        match parse_report_date(&filename) {
            Ok(report_date) => reports.push(ReportFile {
                report_date,
                filename,
                path: entry.path(),
            }),
            Err(ReportNameError::NotAReport) => {
                debug!(filename = %filename, "Ignoring non-report file");
            }
            Err(e) => {
                summary.skipped += 1;
                warn!(filename = %filename, error = %e, "Skipping report with unparseable date");
            }
        }
    }

    reports.sort_by(|a, b| {
        b.report_date
            .cmp(&a.report_date)
            .then_with(|| b.filename.cmp(&a.filename))
    });

    summary.kept = reports.len().min(keep);

    for report in reports.iter().skip(keep) {
        match tokio::fs::remove_file(&report.path).await {
            Ok(()) => {
                summary.deleted += 1;
                info!(file_path = %report.path.display(), report_date = %report.report_date, "Deleted old report");
            }
            Err(e) => {
                summary.failed += 1;
                warn!(
                    file_path = %report.path.display(),
                    error = %e,
                    "Failed to delete old report"
                );
            }
        }
    }

    info!(
        kept = summary.kept,
        deleted = summary.deleted,
        skipped = summary.skipped,
        failed = summary.failed,
        "Retention completed"
    );

    Ok(summary)
}
