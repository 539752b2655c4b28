//! impressions-server: ad impression ingestion service
//!
//! Serves the REST API and writes each accepted impression to the object
//! archive and then to the metadata index.
//!
//! ## Architecture
//! ```text
//! [client] -> [REST API :8080] -> [ObjectArchive (S3/filesystem/memory)]
//!                              -> [MetadataIndex (DynamoDB/memory)]
//! ```
//!
//! ## Configuration
//! - First argument or IMPRESSIONS_CONFIG: YAML config file path
//! - IMPRESSIONS__*: per-key overrides (e.g. IMPRESSIONS__SERVER__PORT)
//! - IMPRESSIONS_LOG: tracing filter (default: info)

use tracing::{error, info};

use impressions::archive::init_archive;
use impressions::config::Config;
use impressions::handlers;
use impressions::index::init_index;
use impressions::utils::bootstrap::{init_tracing, shutdown_signal};
use impressions::ImpressionService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!(error = %e, "failed to load configuration");
        e
    })?;

    info!(
        archive = ?config.archive.archive_type,
        index = ?config.index.index_type,
        "starting impressions server"
    );

    let archive = init_archive(&config.archive).await.map_err(|e| {
        error!(error = %e, "failed to initialize object archive");
        e
    })?;
    let index = init_index(&config.index).await.map_err(|e| {
        error!(error = %e, "failed to initialize metadata index");
        e
    })?;

    let service = ImpressionService::new(archive, index);

    handlers::serve(service, &config.server.bind_address(), shutdown_signal())
        .await
        .map_err(|e| -> Box<dyn std::error::Error> {
            error!(error = %e, "REST API failed");
            e
        })?;

    info!("impressions server stopped");
    Ok(())
}
