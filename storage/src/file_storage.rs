use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

use crate::storage::{Result, Storage, StoredChunk};
use tokio::{
    fs::{self, File},
    io::copy,
};

const PART_SEPARATOR: &str = "_part_";

#[derive(Clone, Debug)]
pub struct FileStorageConfig {
    pub staging_dir: String,
}

#[derive(Clone, Debug)]
pub struct FileStorage {
    staging_dir: PathBuf,
}
impl FileStorage {
    // staging dir is created lazily by the first write
    pub fn new(config: FileStorageConfig) -> Self {
        FileStorage {
            staging_dir: PathBuf::from(config.staging_dir),
        }
    }
    #[cfg(test)]
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }
    pub fn chunk_path(&self, file_id: &str, index: u64) -> PathBuf {
        self.staging_dir
            .join(format!("{file_id}{PART_SEPARATOR}{index}"))
    }
}
impl Storage for FileStorage {
    #[instrument(name = "file_storage_write", skip(self, chunk_stream))]
    async fn write(
        &self,
        file_id: &str,
        index: u64,
        chunk_stream: &mut (impl tokio::io::AsyncRead + Unpin),
    ) -> Result<StoredChunk> {
        if let Err(e) = fs::create_dir_all(&self.staging_dir).await {
            error!(staging_dir=?self.staging_dir,error=%e,"Error while creating the staging dir");
            return Err(e.into());
        }
        let chunk_path = self.chunk_path(file_id, index);
        // truncates whatever an earlier upload of the same chunk left behind
        let mut chunk_file = File::create(&chunk_path).await?;
        let bytes_written = copy(chunk_stream, &mut chunk_file).await?;
        chunk_file.sync_all().await?;
        info!(location=?chunk_path,%bytes_written,"chunk data copied successfully");
        Ok(StoredChunk {
            location: chunk_path,
            bytes_written,
        })
    }
    #[instrument(name = "file_storage_read", skip(self))]
    async fn read(&self, location: &Path) -> Result<Box<dyn tokio::io::AsyncRead + Unpin + Send>> {
        let chunk_file = File::open(location).await?;
        Ok(Box::new(chunk_file))
    }
}
