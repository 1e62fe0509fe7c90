use std::{error::Error, num::ParseIntError};

use storage::storage::Storage;
use tokio::io::AsyncRead;
use tracing::{error, info, instrument};

use crate::chunk_registry::{ChunkDescriptor, ChunkRegistry};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("missing file payload")]
    MissingPayload,
    #[error("missing file name")]
    MissingFileName,
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
    #[error("missing chunk index")]
    MissingIndex,
    #[error("invalid chunk index: {0}")]
    InvalidIndex(#[from] ParseIntError),
    #[error("error while storing chunk: {0}")]
    Storage(Box<dyn Error + Send + Sync>),
}

impl IngestError {
    /// Rejected before anything touched storage or the registry.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IngestError::Storage(_))
    }
}

pub fn parse_index(raw: Option<&str>) -> Result<u64, IngestError> {
    let raw = raw.ok_or(IngestError::MissingIndex)?;
    Ok(raw.parse::<u64>()?)
}

/// The file name ends up as a path component inside the staging dir, so it must be exactly one.
pub fn validate_file_id(file_id: &str) -> Result<(), IngestError> {
    if file_id.is_empty() {
        return Err(IngestError::MissingFileName);
    }
    if file_id.contains(['/', '\\', '\0']) {
        return Err(IngestError::InvalidFileName(format!(
            "path separator not allowed: {file_id}"
        )));
    }
    if file_id == "." || file_id == ".." {
        return Err(IngestError::InvalidFileName(format!(
            "directory reference not allowed: {file_id}"
        )));
    }
    Ok(())
}

/// Stores chunk bytes and, only once they are durable, records them in the registry.
#[derive(Clone, Debug)]
pub struct ChunkIngestor<S> {
    store: S,
    registry: ChunkRegistry,
}

impl<S: Storage> ChunkIngestor<S> {
    pub fn new(store: S, registry: ChunkRegistry) -> Self {
        Self { store, registry }
    }

    #[cfg(test)]
    pub fn registry(&self) -> &ChunkRegistry {
        &self.registry
    }

    #[instrument(name = "chunk_ingest", skip(self, chunk_stream))]
    pub async fn ingest(
        &self,
        file_id: &str,
        index: u64,
        chunk_stream: &mut (impl AsyncRead + Unpin),
    ) -> Result<ChunkDescriptor, IngestError> {
        validate_file_id(file_id)?;
        let stored = match self.store.write(file_id, index, chunk_stream).await {
            Ok(v) => v,
            Err(e) => {
                error!(error=%e,"Error while writing chunk to store");
                return Err(IngestError::Storage(e));
            }
        };
        let descriptor = self.registry.record(file_id, index, stored.location).await;
        info!(bytes_written = stored.bytes_written, "chunk ingested");
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, io::Cursor, path::Path};
    use storage::file_storage::{FileStorage, FileStorageConfig};
    use tempfile::TempDir;

    fn ingestor_in(staging_dir: &Path) -> ChunkIngestor<FileStorage> {
        let store = FileStorage::new(FileStorageConfig {
            staging_dir: staging_dir.to_string_lossy().into_owned(),
        });
        ChunkIngestor::new(store, ChunkRegistry::new())
    }

    #[test]
    fn index_must_be_a_non_negative_integer() {
        assert_eq!(parse_index(Some("7")).unwrap(), 7);
        assert!(matches!(parse_index(None), Err(IngestError::MissingIndex)));
        assert!(matches!(parse_index(Some("x")), Err(IngestError::InvalidIndex(_))));
        assert!(matches!(parse_index(Some("")), Err(IngestError::InvalidIndex(_))));
        assert!(matches!(parse_index(Some("-1")), Err(IngestError::InvalidIndex(_))));
    }

    #[test]
    fn file_id_must_be_a_single_path_component() {
        assert!(validate_file_id("report.pdf").is_ok());
        assert!(validate_file_id("archive.tar.gz").is_ok());
        assert!(matches!(validate_file_id(""), Err(IngestError::MissingFileName)));
        for bad in ["../etc/passwd", "a/b", "a\\b", "..", ".", "nul\0byte"] {
            assert!(
                matches!(validate_file_id(bad), Err(IngestError::InvalidFileName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn only_storage_failures_are_server_errors() {
        assert!(IngestError::MissingPayload.is_client_error());
        assert!(parse_index(Some("x")).unwrap_err().is_client_error());
        assert!(!IngestError::Storage("disk full".into()).is_client_error());
    }

    #[tokio::test]
    async fn ingested_chunks_resolve_to_their_bytes() {
        let dir = TempDir::new().unwrap();
        let ingestor = ingestor_in(dir.path());

        ingestor
            .ingest("report.pdf", 0, &mut Cursor::new(b"AAA"))
            .await
            .unwrap();
        ingestor
            .ingest("report.pdf", 1, &mut Cursor::new(b"BBB"))
            .await
            .unwrap();

        let chunks = ingestor.registry().chunks("report.pdf").await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(std::fs::read(&chunks[0].location).unwrap(), b"AAA");
        assert_eq!(chunks[1].index, 1);
        assert_eq!(std::fs::read(&chunks[1].location).unwrap(), b"BBB");
    }

    #[tokio::test]
    async fn reupload_overwrites_bytes_but_adds_descriptor() {
        let dir = TempDir::new().unwrap();
        let ingestor = ingestor_in(dir.path());

        let first = ingestor
            .ingest("report.pdf", 2, &mut Cursor::new(b"first"))
            .await
            .unwrap();
        let second = ingestor
            .ingest("report.pdf", 2, &mut Cursor::new(b"second"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second.location).unwrap(), b"second");
        let chunks = ingestor.registry().chunks("report.pdf").await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.index == 2));
    }

    #[tokio::test]
    async fn storage_failure_leaves_registry_untouched() {
        let dir = TempDir::new().unwrap();
        let staging_dir = dir.path().join("staged");
        std::fs::write(&staging_dir, b"in the way").unwrap();
        let ingestor = ingestor_in(&staging_dir);

        let err = ingestor
            .ingest("report.pdf", 0, &mut Cursor::new(b"AAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Storage(_)));
        assert!(ingestor.registry().chunks("report.pdf").await.is_empty());
        assert_eq!(ingestor.registry().file_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_file_id_is_rejected_before_storage() {
        let dir = TempDir::new().unwrap();
        let staging_dir = dir.path().join("staged");
        let ingestor = ingestor_in(&staging_dir);

        let err = ingestor
            .ingest("../escape", 0, &mut Cursor::new(b"AAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidFileName(_)));
        assert!(!staging_dir.exists());
        assert_eq!(ingestor.registry().file_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ingests_record_every_chunk() {
        let dir = TempDir::new().unwrap();
        let ingestor = ingestor_in(dir.path());
        let mut handles = vec![];
        for index in 0..32_u64 {
            let ingestor = ingestor.clone();
            handles.push(tokio::spawn(async move {
                let payload = format!("chunk-{index}").into_bytes();
                ingestor
                    .ingest("movie.mkv", index, &mut Cursor::new(payload))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let chunks = ingestor.registry().chunks("movie.mkv").await;
        assert_eq!(chunks.len(), 32);
        let indices: HashSet<u64> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices.len(), 32);
        for chunk in chunks {
            let expected = format!("chunk-{}", chunk.index).into_bytes();
            assert_eq!(std::fs::read(&chunk.location).unwrap(), expected);
        }
    }
}
