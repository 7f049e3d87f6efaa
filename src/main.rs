use d2l_export::{cli, errors};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("d2l_export=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    init_tracing();

    let result = tokio::runtime::Runtime::new()
        .map_err(|e| errors::AppError::IoError(e.to_string()))
        .and_then(|rt| rt.block_on(cli::cli()));

    if let Err(e) = result {
        let code = e.exit_code();
        error!(exit_code = code, error = %e, "Export run failed");
        std::process::exit(code);
    }
}
