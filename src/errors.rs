use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file missing, malformed or invalid
    #[error("Config error: {0}")]
    ConfigError(String),
    /// Connection lost while a response body was streaming
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Token exchange rejected or malformed
    #[error("Auth error: {0}")]
    AuthError(String),
    /// Export job creation rejected or malformed
    #[error("Job submission error: {0}")]
    SubmissionError(String),
    /// Status check failed; recoverable inside the polling loop
    #[error("Job status error: {0}")]
    PollError(String),
    /// Export job reached a failed or deleted state
    #[error("Export job {job_id} ended as {outcome}")]
    JobOutcomeError { job_id: String, outcome: String },
    /// Export job never reached a terminal state
    #[error("Export job {job_id} did not complete within {timeout_secs}s")]
    TimeoutError { job_id: String, timeout_secs: u64 },
    /// Download rejected or missing filename metadata
    #[error("Download error: {0}")]
    DownloadError(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
}

impl AppError {
    /// Process exit code for this error kind. Every kind maps to a distinct
    /// non-zero value so a scheduler can tell failures apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ConfigError(_) => 2,
            AppError::NetworkError(_) => 3,
            AppError::AuthError(_) => 4,
            AppError::SubmissionError(_) => 5,
            AppError::PollError(_) => 6,
            AppError::JobOutcomeError { .. } => 7,
            AppError::TimeoutError { .. } => 8,
            AppError::DownloadError(_) => 9,
            AppError::IoError(_) => 10,
        }
    }
}

// Conversion implementations for common errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError(format!("invalid URL: {err}"))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ConfigError(format!("Failed to parse config: {err}"))
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
