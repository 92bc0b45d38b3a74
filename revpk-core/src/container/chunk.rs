pub const CHUNK_MAX: u64 = crate::codec::CHUNK_MAX as u64;

/// One fragment of a logical file stored at `pack_offset` in some data file.
/// `compressed_size == uncompressed_size` means the fragment is stored raw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub load_flags: u32,
    pub texture_flags: u16,
    pub pack_offset: u64,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl ChunkDescriptor {
    pub fn is_placeholder(&self) -> bool {
        self.pack_offset == 0 && self.compressed_size == 0
    }
}
