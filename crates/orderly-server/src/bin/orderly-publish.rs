//! Publishes order JSON files onto the ingestion queue.
//!
//! ```bash
//! orderly-publish orders/*.json
//! ```
//!
//! A file holding a JSON array publishes one message per element.

use orderly_config::ConfigLoader;
use orderly_core::{OrderlyError, OrderlyResult, Telemetry};
use orderly_ingest::{create_pool, RedisOrderQueue};
use std::path::Path;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Publish failed: {}", e);
        eprintln!("orderly-publish: {e}");
        std::process::exit(1);
    }
}

async fn run() -> OrderlyResult<()> {
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        return Err(OrderlyError::Configuration(
            "usage: orderly-publish <order.json>...".to_string(),
        ));
    }

    let config = ConfigLoader::from_default_location()?.get().await;
    let telemetry = Telemetry::init(&config.telemetry())?;

    let pool = create_pool(&config.broker).await?;
    let queue = RedisOrderQueue::new(pool, &config.broker);

    let mut published = 0usize;
    for path in &paths {
        for payload in read_payloads(Path::new(path)).await? {
            let depth = queue.publish(&payload).await?;
            published += 1;
            info!(file = %path, queue_depth = depth, "Published order");
        }
    }

    info!(published, files = paths.len(), "Done");
    telemetry.shutdown();
    Ok(())
}

async fn read_payloads(path: &Path) -> OrderlyResult<Vec<Vec<u8>>> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| OrderlyError::Configuration(format!("{}: {e}", path.display())))?;

    match serde_json::from_slice::<serde_json::Value>(&raw)? {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| serde_json::to_vec(item).map_err(OrderlyError::from))
            .collect(),
        _ => Ok(vec![raw]),
    }
}
