use rocket::{
    Build, Config as RocketConfig, Rocket,
    data::{Limits, ToByteUnit},
};
use rocket_cors::CorsOptions;
use std::{net::IpAddr, path::PathBuf};
use storage::file_storage::FileStorage;
use utilities::result::Result;

pub mod controller;
pub mod routes;

use crate::{api_service::controller::catchers, config::Config, ingest::ChunkIngestor};

pub type FileIngestor = ChunkIngestor<FileStorage>;

pub fn rocket(ingestor: FileIngestor, config: &Config) -> Result<Rocket<Build>> {
    let cors = CorsOptions::default()
        .to_cors()
        .map_err(|e| format!("Error creating CORS fairing: {e}"))?;
    let form_memory_limit = config.form_memory_limit_in_mega_byte.mebibytes();
    let max_chunk_size = config.max_chunk_size_in_mega_byte.mebibytes();
    // whole body gets room for the other fields, so an oversized chunk trips the file limit
    let limits = Limits::default()
        .limit("form", form_memory_limit)
        .limit("data-form", max_chunk_size + form_memory_limit)
        .limit("file", max_chunk_size);
    let mut rocket_config = RocketConfig {
        address: config.listen_address.parse::<IpAddr>()?,
        port: config.port,
        limits,
        ..RocketConfig::default()
    };
    if let Some(upload_temp_dir) = &config.upload_temp_dir {
        rocket_config.temp_dir = PathBuf::from(upload_temp_dir).into();
    }
    Ok(rocket::custom(rocket_config)
        .manage(ingestor)
        .mount("/", routes::upload::routes())
        .register("/", catchers::catchers())
        .attach(cors))
}
