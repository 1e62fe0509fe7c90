mod api_service;
mod chunk_registry;
mod config;
mod ingest;

use chunk_registry::ChunkRegistry;
use config::Config;
use ingest::ChunkIngestor;
use storage::file_storage::FileStorage;
use utilities::{
    logger::{error, info, init_logger},
    result::Result,
};

use crate::api_service::rocket;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error while reading the config hence shutting down: {e}");
            return Err(e.to_string().into());
        }
    };
    let _guard = init_logger(
        "Chunkserver",
        &config.id,
        &config.log_level,
        &config.log_base,
        config.apm_endpoint.as_deref(),
    )?;
    info!(staging_dir=%config.staging_directory,"Creating chunk store");
    let store = FileStorage::new(config.storage_config());
    let registry = ChunkRegistry::new();
    let ingestor = ChunkIngestor::new(store, registry.clone());

    let rocket = match rocket(ingestor, &config) {
        Ok(v) => v,
        Err(e) => {
            error!(error=%e,"Error while building the api service hence shutting down");
            return Err(e);
        }
    };
    info!(address=%config.listen_address,port=%config.port,"Starting : rocket server");
    if let Err(e) = rocket.launch().await {
        error!(error=%e,"Rocket service has stopped");
        return Err(format!("Rocket service has stopped: {e}").into());
    }
    info!(tracked_files = registry.file_count().await, "Rocket service shut down");
    Ok(())
}
