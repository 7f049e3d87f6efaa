use crate::constants::DATA_EXPORT_API_PATH;
use crate::errors::{AppError, AppResult};
use crate::models::{ExportJobRequest, JobStatus};
use reqwest::header::CONTENT_DISPOSITION;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// A completed export whose body has not been read yet.
#[derive(Debug)]
pub struct ReportDownload {
    /// Archive name taken from the `Content-Disposition` header
    pub filename: String,
    /// Response to stream the archive from, e.g. via `bytes_stream()`
    pub response: reqwest::Response,
}

/// Bearer-authenticated calls against the data export API.
#[derive(Debug, Clone)]
pub struct ExportJobClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl ExportJobClient {
    pub fn new(client: reqwest::Client, base_url: &str, access_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Absolute URL of a data export endpoint, e.g. `jobs/{id}`.
    pub fn endpoint(&self, path: &str) -> AppResult<Url> {
        Ok(Url::parse(&format!(
            "{}{DATA_EXPORT_API_PATH}{path}",
            self.base_url
        ))?)
    }

    /// Submits an export job and returns its `ExportJobId`.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` if the request fails, the API answers with a
    /// non-success status, or the response carries no `ExportJobId`.
    pub async fn create_job(&self, request: &ExportJobRequest) -> AppResult<String> {
        let url = self.endpoint("create")?;

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::SubmissionError(format!("POST {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SubmissionError(format!(
                "HTTP {}: POST {url} was rejected: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::SubmissionError(format!("Malformed response from {url}: {e}"))
        })?;

        let job_id = match body.get("ExportJobId") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(AppError::SubmissionError(format!(
                    "Response from {url} has no ExportJobId"
                )))
            }
        };

        info!(job_id = %job_id, dataset_id = %request.dataset_id, "Export job submitted");
        Ok(job_id)
    }

    /// Queries the current state of an export job.
    ///
    /// # Errors
    ///
    /// Returns `PollError` on transport failures, non-success statuses, or an
    /// unreadable body. The poller treats these as transient.
    pub async fn get_status(&self, job_id: &str) -> AppResult<JobStatus> {
        let url = self.endpoint(&format!("jobs/{job_id}"))?;

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::PollError(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::PollError(format!(
                "HTTP {}: GET {url} failed",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::PollError(format!("Malformed response from {url}: {e}")))?;

        let code = body.get("Status").and_then(Value::as_i64);
        debug!(job_id = job_id, code = ?code, "Job status received");
        Ok(JobStatus::from_code(code))
    }

    /// Starts the archive download of a completed job.
    ///
    /// Only the headers are read here; the body is left on the returned
    /// response so it can be streamed to disk.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the request fails, the status is not a
    /// success, or no usable filename is found in `Content-Disposition`.
    pub async fn download(&self, job_id: &str) -> AppResult<ReportDownload> {
        let url = self.endpoint(&format!("download/{job_id}"))?;

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::DownloadError(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::DownloadError(format!(
                "HTTP {}: GET {url} failed",
                status.as_u16()
            )));
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition)
            .ok_or_else(|| {
                AppError::DownloadError(format!(
                    "Response from {url} has no filename in Content-Disposition"
                ))
            })?;

        Ok(ReportDownload { filename, response })
    }
}

/// Extracts the `filename=` value of a `Content-Disposition` header.
///
/// A quoted value runs to its closing quote and may contain `;`. An unquoted
/// value ends at the next parameter. Only the final path component is kept,
/// so a server cannot direct the write outside the download directory.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let (_, raw) = value.split_once("filename=")?;
    let raw = raw.trim_start();
    let raw = match raw.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next()?,
        None => raw.split(';').next()?,
    }
    .trim();
    let name = Path::new(raw).file_name()?.to_str()?;
    Some(name.to_string())
}
