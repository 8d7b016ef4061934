use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rot8d::app;
use rot8d::config::{self, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_matches(&config::command().get_matches()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    info!("rot8d v{} starting", env!("CARGO_PKG_VERSION"));

    match app::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
