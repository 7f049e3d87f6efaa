use crate::constants::FILTER_DATE_FORMAT;
use chrono::{Months, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Access and refresh token pair returned by the OAuth token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    /// Short-lived bearer token, kept in memory for the current run only
    pub access_token: String,
    /// Rotated refresh token, persisted for the next run
    pub refresh_token: String,
}

/// Single `{Name, Value}` filter of a data export request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFilter {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl ExportFilter {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Body of `POST dataExport/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportJobRequest {
    #[serde(rename = "DataSetId")]
    pub dataset_id: String,
    #[serde(rename = "Filters")]
    pub filters: Vec<ExportFilter>,
}

impl ExportJobRequest {
    /// Builds the org-level "All Grades" request covering `lookback_years`
    /// up to and including `today`.
    ///
    /// A start date that does not exist in the target year (Feb 29) is
    /// clamped to the last day of that month.
    pub fn all_grades(
        dataset_id: &str,
        org_unit_id: u64,
        today: NaiveDate,
        lookback_years: u32,
    ) -> Self {
        let start = today
            .checked_sub_months(Months::new(lookback_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);

        Self {
            dataset_id: dataset_id.to_string(),
            filters: vec![
                ExportFilter::new("parentOrgUnitId", org_unit_id.to_string()),
                ExportFilter::new("startDate", start.format(FILTER_DATE_FORMAT).to_string()),
                ExportFilter::new("endDate", today.format(FILTER_DATE_FORMAT).to_string()),
            ],
        }
    }
}

/// State of a server-side export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Not finished yet; carries the raw server code (0 queued, 1 processing)
    Pending(i64),
    Completed,
    Failed,
    Deleted,
    /// The response carried no usable status code
    Unknown,
}

impl JobStatus {
    /// Maps the `Status` field of a job response.
    ///
    /// 2, 3 and 4 are terminal; every other code means the job is still
    /// queued or processing.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(2) => Self::Completed,
            Some(3) => Self::Failed,
            Some(4) => Self::Deleted,
            Some(code) => Self::Pending(code),
            None => Self::Unknown,
        }
    }

    /// Server-side stage name, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Pending(0) => "queued",
            Self::Pending(1) => "processing",
            Self::Pending(_) => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Deleted => "deleted",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending(_) => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Deleted => "Deleted",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A downloaded report archive whose date was parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub report_date: NaiveDate,
    pub filename: String,
    pub path: PathBuf,
}
