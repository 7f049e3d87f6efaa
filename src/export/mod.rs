//! Export job lifecycle against the D2L data export API.
//!
//! This module submits an export job, waits for it to finish, streams the
//! resulting archive to disk and prunes old archives. The main entry points
//! are [`ExportJobClient`], [`poll_until_terminal`], [`save`] and [`prune`].

mod client;
mod poller;
mod report_writer;
mod retention;

// Re-export public API
pub use client::{filename_from_content_disposition, ExportJobClient, ReportDownload};
pub use poller::{poll_until_terminal, PollOutcome, PollReport, PollSettings};
pub use report_writer::save;
pub use retention::{parse_report_date, prune, PruneSummary, ReportNameError};
