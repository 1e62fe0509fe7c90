use std::path::{Path, PathBuf};

use tokio::io;
pub use utilities::result::Result;

/// Where a chunk landed and how many bytes were copied there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredChunk {
    pub location: PathBuf,
    pub bytes_written: u64,
}

pub trait Storage {
    /// Persists the whole of `chunk_stream` as chunk `index` of `file_id`. The bytes are durable
    /// once this returns `Ok`, writing the same `(file_id, index)` again replaces them.
    async fn write(
        &self,
        file_id: &str,
        index: u64,
        chunk_stream: &mut (impl io::AsyncRead + Unpin),
    ) -> Result<StoredChunk>;
    async fn read(&self, location: &Path) -> Result<Box<dyn io::AsyncRead + Unpin + Send>>;
}
