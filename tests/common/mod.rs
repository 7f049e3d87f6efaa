//! Common test utilities for integration tests

use std::fs;
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API: &str = "/d2l/api/lp/1.51/dataExport";
pub const TOKEN_PATH: &str = "/core/connect/token";

/// Writes a config file pointing both the tenant and the token endpoint at
/// `server`, downloading into `download_dir`.
#[allow(dead_code)]
pub fn write_config(dir: &Path, server: &MockServer, download_dir: &Path) -> PathBuf {
    let config_path = dir.join("export.toml");
    let contents = format!(
        r#"base_url = "{uri}"
client_id = "client"
client_secret = "secret"
scope = "datahub:dataexports:*"
refresh_token = "rt-1"
dataset_id = "ds-1"

[run]
auth_url = "{uri}{TOKEN_PATH}"
download_dir = "{download_dir}"
poll_interval_secs = 1
poll_timeout_secs = 30
"#,
        uri = server.uri(),
        download_dir = download_dir.display().to_string().replace('\\', "/"),
    );
    fs::write(&config_path, contents).unwrap();
    config_path
}

/// Token endpoint answering with a rotated pair.
#[allow(dead_code)]
pub async fn mount_token(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "access_token": "at-2",
            "refresh_token": "rt-2",
        })))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub async fn mount_create(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("{API}/create")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ExportJobId": job_id })),
        )
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub async fn mount_status(server: &MockServer, job_id: &str, code: i64) {
    Mock::given(method("GET"))
        .and(path(format!("{API}/jobs/{job_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "ExportJobId": job_id, "Status": code })),
        )
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub async fn mount_download(server: &MockServer, job_id: &str, filename: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("{API}/download/{job_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Content-Disposition",
                    format!("attachment; filename=\"{filename}\"").as_str(),
                )
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
}

/// Creates an empty report archive with the given name.
#[allow(dead_code)]
pub fn touch_report(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), b"PK").unwrap();
}

/// Sorted file names in `dir`.
#[allow(dead_code)]
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}
