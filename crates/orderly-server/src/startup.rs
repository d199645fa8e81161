//! Server startup utilities.

use orderly_config::AppConfig;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r#"
   ____          __          __
  / __ \_________/ /__  _____/ /_  __
 / / / / ___/ __  / _ \/ ___/ / / / /
/ /_/ / /  / /_/ /  __/ /  / / /_/ /
\____/_/   \__,_/\___/_/  /_/\__, /
                            /____/
    "#
    );
}

/// Prints the endpoints the process serves.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let base = format!("http://{}", config.server.addr());
    info!("{}", separator);
    info!("Orders:    {}/api/v1/orders/{{order_uid}}", base);
    info!("Health:    {}/health", base);
    info!("Swagger:   {}/swagger-ui", base);
    if config.observability.metrics_enabled {
        info!("Metrics:   {}/metrics", base);
    }
    info!("Run mode:  {}", config.app.run_mode);
    info!("{}", separator);
}
