use figment::{
    Figment,
    providers::{Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use storage::file_storage::FileStorageConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub id: String,
    pub listen_address: String,
    pub port: u16,
    // flat dir holding one file per uploaded chunk
    pub staging_directory: String,
    // cap for the non file fields of an upload, file parts always stream to disk
    pub form_memory_limit_in_mega_byte: u64,
    pub max_chunk_size_in_mega_byte: u64,
    // where file parts are spooled before being copied to staging, os temp dir when unset
    #[serde(default)]
    pub upload_temp_dir: Option<String>,
    pub log_level: String,
    pub log_base: String,
    #[serde(default)]
    pub apm_endpoint: Option<String>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            id: "chunkserver".to_string(),
            listen_address: "0.0.0.0".to_string(),
            port: 8080,
            staging_directory: "temp".to_string(),
            form_memory_limit_in_mega_byte: 5,
            max_chunk_size_in_mega_byte: 64,
            upload_temp_dir: None,
            log_level: "info".to_string(),
            log_base: "./logs".to_string(),
            apm_endpoint: None,
        }
    }
}
impl Config {
    /// Reads `CONFIG_PATH`, or `./chunkserver/config/<ENV>.yaml` when unset, over the defaults.
    pub fn load() -> Result<Self, figment::Error> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "default".to_owned());
        let config_file_path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| format!("./chunkserver/config/{}.yaml", env));
        Self::from_file(&config_file_path)
    }
    pub fn from_file(config_file_path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_file_path))
            .extract()
    }
    pub fn storage_config(&self) -> FileStorageConfig {
        FileStorageConfig {
            staging_dir: self.staging_directory.clone(),
        }
    }
}
