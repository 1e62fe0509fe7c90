use std::path::PathBuf;

/// One recorded arrival of a chunk. Indices are not unique within a file, every successful
/// upload adds its own descriptor even when it overwrote an earlier chunk on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub index: u64,
    pub location: PathBuf,
}

impl ChunkDescriptor {
    pub fn new(index: u64, location: PathBuf) -> Self {
        Self { index, location }
    }
}
