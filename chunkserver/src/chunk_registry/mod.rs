pub mod chunk_descriptor;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, instrument};

pub use chunk_descriptor::ChunkDescriptor;

/// In memory record of every chunk stored so far, keyed by the uploaded file name.
///
/// A single lock guards the whole map, so appends for unrelated files are serialized too.
/// Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct ChunkRegistry {
    file_to_chunk_map: Arc<Mutex<HashMap<String, Vec<ChunkDescriptor>>>>,
}

impl ChunkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor for bytes that are already durable at `location`.
    #[instrument(name = "chunk_registry_record", skip(self))]
    pub async fn record(&self, file_id: &str, index: u64, location: PathBuf) -> ChunkDescriptor {
        let descriptor = ChunkDescriptor::new(index, location);
        let mut file_to_chunk_map = self.file_to_chunk_map.lock().await;
        let chunks = file_to_chunk_map.entry(file_id.to_owned()).or_default();
        chunks.push(descriptor.clone());
        debug!(chunk_count = chunks.len(), "chunk recorded");
        descriptor
    }

    /// Copy of the descriptors recorded for `file_id`, in arrival order.
    #[cfg(test)]
    pub async fn chunks(&self, file_id: &str) -> Vec<ChunkDescriptor> {
        self.file_to_chunk_map
            .lock()
            .await
            .get(file_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn file_count(&self) -> usize {
        self.file_to_chunk_map.lock().await.len()
    }
}
