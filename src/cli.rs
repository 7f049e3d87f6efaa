use crate::auth::TokenManager;
use crate::credentials::{CredentialStore, FileCredentialStore};
use crate::errors::{AppError, AppResult};
use crate::export::{poll_until_terminal, prune, save, ExportJobClient, PollSettings};
use crate::models::ExportJobRequest;
use chrono::{Local, NaiveDate};
use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

fn keep_arg() -> Arg<'static> {
    Arg::new("keep")
        .short('k')
        .long("keep")
        .help("Number of most recent report archives to keep")
        .value_parser(clap::value_parser!(usize))
        .action(ArgAction::Set)
}

fn build_command() -> Command<'static> {
    Command::new("d2l-export")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand(
            Command::new("run")
                .about("Renew the token, run the export job, download the report and prune old ones")
                .after_help("Example:\n  d2l-export run export.toml --keep 5")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file (its refresh_token is rewritten)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("download_dir")
                        .short('d')
                        .long("download-dir")
                        .help("Directory receiving the report archives")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(keep_arg()),
        )
        .subcommand(
            Command::new("prune")
                .about("Only delete old report archives from a directory")
                .arg(
                    Arg::new("dir")
                        .help("Directory holding the report archives")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(keep_arg().default_value("3")),
        )
}

/// Parses command-line arguments and executes the selected subcommand.
///
/// - `run`: full export lifecycle, see [`run_export`]
/// - `prune`: retention policy only
///
/// Without a subcommand the help text is printed.
pub async fn cli() -> AppResult<()> {
    let cmd = build_command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    match matches.subcommand() {
        Some(("run", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .expect("config is required");

            let mut store = FileCredentialStore::open(config_path)?;
            if let Some(dir) = sub.get_one::<PathBuf>("download_dir") {
                store.run_settings_mut().download_dir = dir.clone();
            }
            if let Some(&keep) = sub.get_one::<usize>("keep") {
                if keep == 0 {
                    return Err(AppError::ConfigError("--keep must be greater than 0".into()));
                }
                store.run_settings_mut().keep_reports = keep;
            }

            let client = reqwest::Client::new();
            run_export(&mut store, &client, Local::now().date_naive()).await?;
        }
        Some(("prune", sub)) => {
            let dir = sub.get_one::<PathBuf>("dir").expect("dir is required");
            let keep = *sub.get_one::<usize>("keep").expect("keep has default_value");
            if keep == 0 {
                return Err(AppError::ConfigError("--keep must be greater than 0".into()));
            }
            prune(dir, keep).await?;
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
        }
    }

    Ok(())
}

/// Runs the export lifecycle once.
///
/// 1. Renews the access token and persists the rotated refresh token
/// 2. Submits the "All Grades" export covering the configured lookback up to `today`
/// 3. Polls the job until it completes, fails, is deleted or times out
/// 4. Streams the archive into the download directory
/// 5. Prunes old archives (failures here are logged, never returned)
///
/// Returns the path of the downloaded archive.
pub async fn run_export<S: CredentialStore>(
    store: &mut S,
    client: &reqwest::Client,
    today: NaiveDate,
) -> AppResult<PathBuf> {
    info!("Started export run");
    let config = store.current().clone();

    let token_manager = TokenManager::new(client.clone(), &config.run.auth_url)?;
    let tokens = token_manager.renew(&config).await?;
    store.persist(&tokens.refresh_token)?;
    info!("Tokens are set");

    let export_client = ExportJobClient::new(client.clone(), &config.base_url, &tokens.access_token);
    let request = ExportJobRequest::all_grades(
        &config.dataset_id,
        config.run.org_unit_id,
        today,
        config.run.lookback_years,
    );
    let job_id = export_client.create_job(&request).await?;

    let settings = PollSettings::from(&config.run);
    let poller_client = &export_client;
    let poller_job_id = job_id.as_str();
    let report = poll_until_terminal(&job_id, &settings, move || {
        poller_client.get_status(poller_job_id)
    })
    .await;
    report.into_result(&job_id, &settings)?;
    info!(
        job_id = %job_id,
        polls = report.polls,
        waited_secs = report.elapsed.as_secs(),
        "Export job completed"
    );

    let download = export_client.download(&job_id).await?;
    let path = save(
        &download.filename,
        download.response.bytes_stream(),
        &config.run.download_dir,
    )
    .await?;

    prune_best_effort(&config.run.download_dir, config.run.keep_reports).await;

    info!(file_path = %path.display(), job_id = %job_id, "Export run completed");
    Ok(path)
}

async fn prune_best_effort(dir: &Path, keep: usize) {
    if let Err(e) = prune(dir, keep).await {
        warn!(directory = %dir.display(), error = %e, "Retention failed, old reports kept");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_valid() {
        build_command().debug_assert();
    }

    #[test]
    fn run_command_parses_overrides() {
        let matches = build_command()
            .try_get_matches_from(vec![
                "d2l-export",
                "run",
                "export.toml",
                "--download-dir",
                "out",
                "-k",
                "5",
            ])
            .unwrap();
        let sub = matches.subcommand_matches("run").unwrap();
        assert_eq!(
            sub.get_one::<PathBuf>("config").unwrap(),
            &PathBuf::from("export.toml")
        );
        assert_eq!(
            sub.get_one::<PathBuf>("download_dir").unwrap(),
            &PathBuf::from("out")
        );
        assert_eq!(sub.get_one::<usize>("keep"), Some(&5));
    }

    #[test]
    fn run_command_requires_config() {
        let result = build_command().try_get_matches_from(vec!["d2l-export", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn prune_command_defaults_keep_to_three() {
        let matches = build_command()
            .try_get_matches_from(vec!["d2l-export", "prune", "downloads"])
            .unwrap();
        let sub = matches.subcommand_matches("prune").unwrap();
        assert_eq!(sub.get_one::<usize>("keep"), Some(&3));
    }

    #[test]
    fn keep_must_be_a_number() {
        let result = build_command().try_get_matches_from(vec![
            "d2l-export",
            "prune",
            "downloads",
            "--keep",
            "many",
        ]);
        assert!(result.is_err());
    }
}
