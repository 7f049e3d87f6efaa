// OAuth token endpoint
pub const DEFAULT_AUTH_URL: &str = "https://auth.brightspace.com/core/connect/token";

// Data export API, relative to the tenant base URL
pub const DATA_EXPORT_API_PATH: &str = "/d2l/api/lp/1.51/dataExport/";

// Export request defaults
pub const DEFAULT_ORG_UNIT_ID: u64 = 6606;
pub const DEFAULT_LOOKBACK_YEARS: u32 = 4;
pub const FILTER_DATE_FORMAT: &str = "%Y-%m-%d";

// Polling defaults
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 2 * 60 * 60;

// Storage defaults
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_KEEP_REPORTS: usize = 3;

// Report archive naming
pub const REPORT_MARKERS: &[&str] = &["All Grades-", "All%20Grades-"];
pub const REPORT_EXTENSION: &str = ".zip";
pub const REPORT_DATE_PATTERN: &str = r"([0-9]{2})-([0-9]{2})-([0-9]{4})$";
pub const PARTIAL_SUFFIX: &str = ".part";
