//! # Orderly Server
//!
//! Main entry point. Depending on `app.run_mode` the process serves the
//! read API, consumes the order queue, or both.

use orderly_config::ConfigLoader;
use orderly_core::{OrderlyResult, ShutdownCoordinator, Telemetry};
use orderly_server::{startup::print_banner, Application};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application error: {}", e);
        eprintln!("orderly-server: {e}");
        std::process::exit(1);
    }
}

async fn run() -> OrderlyResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get().await;

    let telemetry = Telemetry::init(&config.telemetry())?;
    print_banner();
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let shutdown = Arc::new(ShutdownCoordinator::new(config.ingest.shutdown_timeout()));
    Application::new(config, shutdown).run(telemetry).await
}
