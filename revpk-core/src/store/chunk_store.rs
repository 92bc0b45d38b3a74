use crate::container::ChunkDescriptor;
use crate::error::Result;
use crate::hash::fingerprint;
use std::collections::HashMap;
use std::fs::File;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[cfg(unix)]
fn write_at(file: &File, offset: u64, buf: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn write_at(file: &File, offset: u64, buf: &[u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut written = 0usize;
    while written < buf.len() {
        let n = file.seek_write(&buf[written..], offset + written as u64)?;
        written += n;
    }
    Ok(())
}

#[derive(Default)]
pub struct ChunkStoreStats {
    pub chunks_written: AtomicU64,
    pub chunks_deduped: AtomicU64,
    pub bytes_written: AtomicU64,
}

/// Append-only data writer plus fingerprint→descriptor index. Dedup is
/// keyed on the *pre-codec* chunk bytes (see the hash-site design note);
/// the bytes actually appended to the data file are whatever the caller
/// decided to store (raw or codec output).
pub struct ChunkStore {
    data_file: File,
    offset: AtomicU64,
    index: Mutex<HashMap<String, ChunkDescriptor>>,
    pub stats: ChunkStoreStats,
}

impl ChunkStore {
    pub fn new(data_file: File) -> Self {
        ChunkStore {
            data_file,
            offset: AtomicU64::new(0),
            index: Mutex::new(HashMap::new()),
            stats: ChunkStoreStats::default(),
        }
    }

    /// `raw_bytes` are the pre-codec bytes used for the dedup fingerprint;
    /// `stored_bytes` are what actually gets appended to the data file
    /// (equal to `raw_bytes` when the chunk was stored uncompressed).
    /// `template` supplies `load_flags`/`texture_flags`/`uncompressed_size`
    /// for the first writer of a given fingerprint.
    pub fn put(
        &self,
        raw_bytes: &[u8],
        stored_bytes: &[u8],
        template: ChunkDescriptor,
    ) -> Result<ChunkDescriptor> {
        let key = fingerprint(raw_bytes);

        {
            let map = self.index.lock().unwrap();
            if let Some(existing) = map.get(&key) {
                self.stats.chunks_deduped.fetch_add(1, Ordering::Relaxed);
                return Ok(*existing);
            }
        }

        let reserved = self
            .offset
            .fetch_add(stored_bytes.len() as u64, Ordering::SeqCst);
        write_at(&self.data_file, reserved, stored_bytes)?;

        let descriptor = ChunkDescriptor {
            load_flags: template.load_flags,
            texture_flags: template.texture_flags,
            pack_offset: reserved,
            compressed_size: stored_bytes.len() as u64,
            uncompressed_size: template.uncompressed_size,
        };

        {
            let mut map = self.index.lock().unwrap();
            // First to finish inserting wins; a racing loser's bytes are
            // orphaned-but-harmless padding in the data file.
            map.entry(key).or_insert(descriptor);
        }
        self.stats.chunks_written.fetch_add(1, Ordering::Relaxed);
        self.stats
            .bytes_written
            .fetch_add(stored_bytes.len() as u64, Ordering::Relaxed);
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn descriptor(uncompressed_size: u64) -> ChunkDescriptor {
        ChunkDescriptor {
            load_flags: 0,
            texture_flags: 0,
            pack_offset: 0,
            compressed_size: 0,
            uncompressed_size,
        }
    }

    #[test]
    fn dedup_returns_same_descriptor() {
        let dir = tempdir().unwrap();
        let file = File::create(dir.path().join("data.vpk")).unwrap();
        let store = ChunkStore::new(file);

        let a = store.put(b"hello", b"hello", descriptor(5)).unwrap();
        let b = store.put(b"hello", b"hello", descriptor(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.stats.chunks_written.load(Ordering::Relaxed), 1);
        assert_eq!(store.stats.chunks_deduped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn distinct_chunks_get_distinct_offsets() {
        let dir = tempdir().unwrap();
        let file = File::create(dir.path().join("data.vpk")).unwrap();
        let store = ChunkStore::new(file);

        let a = store.put(b"aaaaa", b"aaaaa", descriptor(5)).unwrap();
        let b = store.put(b"bbbbb", b"bbbbb", descriptor(5)).unwrap();
        assert_ne!(a.pack_offset, b.pack_offset);
    }
}
