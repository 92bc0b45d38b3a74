use crate::codec::{self, Method, CHUNK_MAX, ZSTD_IMPLEMENTATION_LEVEL};
use crate::container::{ChunkDescriptor, Directory, EntryBlock};
use crate::error::{RevpkError, Result};
use crate::manifest::{Manifest, ManifestEntry};
use crate::store::ChunkStore;
use crate::util::crc_forward::CrcForward;
use crate::worker::WorkerPool;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct PackWarning {
    pub entry_path: String,
    pub message: String,
}

/// `level` selects the codec: the literal `"zstd"` drives the ZSTD codec
/// at a fixed implementation level; any LZHAM effort token
/// (`fastest|faster|default|better|uber`) selects the LZHAM codec, which
/// this build cannot execute (see `codec::lzham`) and therefore always
/// falls back to raw storage, per the pack-time codec-failure policy.
pub(crate) fn method_for_level(level: &str) -> (Method, i32) {
    if level == "zstd" {
        (Method::Zstd, ZSTD_IMPLEMENTATION_LEVEL)
    } else {
        let lvl = codec::Level::parse(level).unwrap_or(codec::Level::Uber);
        (Method::Lzham, lvl.as_lzham_level())
    }
}

/// Resolves `<workspace>/content/<locale>/<entry_path>`, falling back to
/// `<workspace>/content/english/<entry_path>` on miss.
fn resolve_source(workspace: &Path, locale: &str, entry_path: &str) -> Option<PathBuf> {
    let primary = workspace.join("content").join(locale).join(entry_path);
    if primary.is_file() {
        return Some(primary);
    }
    let fallback = workspace.join("content").join("english").join(entry_path);
    if fallback.is_file() {
        return Some(fallback);
    }
    None
}

/// Reads a source file and computes its whole-file CRC-32 in the same
/// pass, streaming through `CrcForward` rather than hashing a second time
/// over an already-buffered copy.
pub(crate) fn read_source_with_crc(path: &Path) -> Result<(Vec<u8>, u32)> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = Vec::new();
    {
        let mut forward = CrcForward::new(&mut buf, &mut hasher);
        std::io::copy(&mut file, &mut forward)?;
        forward.flush()?;
    }
    Ok((buf, hasher.finalize()))
}

/// Splits `use_compression`-gated chunk bytes into the bytes that should
/// actually be appended to the data file, per the "keep only if strictly
/// smaller" rule. Codec failures (the LZHAM case) are swallowed into raw
/// storage, matching the pack-time error policy.
fn encode_chunk(raw: &[u8], use_compression: bool, method: Method, level: i32) -> Vec<u8> {
    if !use_compression {
        return raw.to_vec();
    }
    match codec::compressor_for(method).compress(raw, level) {
        Ok(encoded) if encoded.len() < raw.len() => encoded,
        _ => raw.to_vec(),
    }
}

/// Packs one already-resolved source file into the shared `chunk_store`,
/// returning its entry block. `pack_index` is the index this entry's
/// fragments are recorded under (0 for single-locale/multi-locale shared
/// data files, the reserved shared index for delta-common).
pub fn pack_one_file(
    chunk_store: &ChunkStore,
    entry_path: &str,
    bytes: &[u8],
    crc32: u32,
    manifest_entry: &ManifestEntry,
    method: Method,
    level: i32,
    pack_index: u16,
) -> Result<EntryBlock> {
    let preload_len = (manifest_entry.preload_size as usize).min(bytes.len());
    let preload_bytes = bytes[..preload_len].to_vec();
    let body = &bytes[preload_len..];

    let mut fragments = Vec::new();
    if body.is_empty() && bytes.is_empty() {
        // Zero-length source: emit a zero-fragment entry block (unified
        // empty-file rule).
    } else {
        for raw_chunk in body.chunks(CHUNK_MAX) {
            let stored = encode_chunk(raw_chunk, manifest_entry.use_compression, method, level);
            let template = ChunkDescriptor {
                load_flags: manifest_entry.load_flags,
                texture_flags: manifest_entry.texture_flags,
                pack_offset: 0,
                compressed_size: 0,
                uncompressed_size: raw_chunk.len() as u64,
            };
            let descriptor = chunk_store.put(raw_chunk, &stored, template)?;
            fragments.push(descriptor);
        }
    }

    Ok(EntryBlock {
        crc32,
        preload_size: preload_len as u16,
        pack_index,
        preload_bytes,
        fragments,
        entry_path: entry_path.to_string(),
    })
}

pub struct PackOptions {
    pub workspace: PathBuf,
    pub locale: String,
    pub level: String,
    pub num_threads: Option<usize>,
}

/// Single-locale pack: reads `manifest`, resolves each entry under
/// `opts.locale` (falling back to english), and writes every chunk into
/// `chunk_store`. Missing sources are warnings, not failures.
pub fn pack(
    manifest: &Manifest,
    chunk_store: &ChunkStore,
    opts: &PackOptions,
) -> Result<(Vec<EntryBlock>, Vec<PackWarning>)> {
    let pool = WorkerPool::new(opts.num_threads);
    let (method, level) = method_for_level(&opts.level);
    let locale = crate::locale::normalize(&opts.locale).to_string();

    let tasks: Vec<_> = manifest
        .entries
        .iter()
        .map(|(entry_path, manifest_entry)| {
            let entry_path = entry_path.clone();
            let manifest_entry = manifest_entry.clone();
            let workspace = opts.workspace.clone();
            let locale = locale.clone();
            move || -> Result<std::result::Result<EntryBlock, PackWarning>> {
                let Some(source) = resolve_source(&workspace, &locale, &entry_path) else {
                    return Ok(Err(PackWarning {
                        entry_path: entry_path.clone(),
                        message: "missing source file in both locale and english content trees"
                            .to_string(),
                    }));
                };
                let (bytes, crc32) = read_source_with_crc(&source)
                    .map_err(|_| RevpkError::MissingSource(source.clone()))?;
                let entry = pack_one_file(
                    chunk_store,
                    &entry_path,
                    &bytes,
                    crc32,
                    &manifest_entry,
                    method,
                    level,
                    0,
                )?;
                Ok(Ok(entry))
            }
        })
        .collect();

    let results = pool.install_many(tasks);

    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    for result in results {
        match result? {
            Ok(entry) => entries.push(entry),
            Err(warning) => warnings.push(warning),
        }
    }
    Ok((entries, warnings))
}

pub fn write_directory(entries: Vec<EntryBlock>, dir_path: PathBuf) -> Result<Directory> {
    Ok(Directory::new(dir_path, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manifest_entry() -> ManifestEntry {
        ManifestEntry {
            preload_size: 0,
            load_flags: 0,
            texture_flags: 0,
            use_compression: false,
            de_duplicate: true,
        }
    }

    #[test]
    fn tiny_file_is_one_raw_fragment() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(std::fs::File::create(dir.path().join("d.vpk")).unwrap());
        let entry = pack_one_file(
            &store,
            "a/b.txt",
            b"hello",
            crc32fast::hash(b"hello"),
            &manifest_entry(),
            Method::Zstd,
            6,
            0,
        )
        .unwrap();
        assert_eq!(entry.fragments.len(), 1);
        let frag = entry.fragments[0];
        assert_eq!(frag.compressed_size, 5);
        assert_eq!(frag.uncompressed_size, 5);
        assert_eq!(frag.pack_offset, 0);
    }

    #[test]
    fn exact_boundary_splits_into_two_fragments() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(std::fs::File::create(dir.path().join("d.vpk")).unwrap());
        let data = vec![7u8; CHUNK_MAX + 1];
        let crc32 = crc32fast::hash(&data);
        let entry = pack_one_file(
            &store,
            "big.bin",
            &data,
            crc32,
            &manifest_entry(),
            Method::Zstd,
            6,
            0,
        )
        .unwrap();
        assert_eq!(entry.fragments.len(), 2);
        assert_eq!(entry.fragments[0].uncompressed_size, CHUNK_MAX as u64);
        assert_eq!(entry.fragments[1].uncompressed_size, 1);
    }

    #[test]
    fn empty_file_has_zero_fragments() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(std::fs::File::create(dir.path().join("d.vpk")).unwrap());
        let entry = pack_one_file(
            &store,
            "empty.dat",
            b"",
            crc32fast::hash(b""),
            &manifest_entry(),
            Method::Zstd,
            6,
            0,
        )
        .unwrap();
        assert!(entry.fragments.is_empty());
    }

    #[test]
    fn dedup_across_files_shares_offset() {
        let dir = tempdir().unwrap();
        let store = ChunkStore::new(std::fs::File::create(dir.path().join("d.vpk")).unwrap());
        let crc32 = crc32fast::hash(b"same bytes");
        let a = pack_one_file(
            &store,
            "a.txt",
            b"same bytes",
            crc32,
            &manifest_entry(),
            Method::Zstd,
            6,
            0,
        )
        .unwrap();
        let b = pack_one_file(
            &store,
            "b.txt",
            b"same bytes",
            crc32,
            &manifest_entry(),
            Method::Zstd,
            6,
            0,
        )
        .unwrap();
        assert_eq!(a.fragments[0].pack_offset, b.fragments[0].pack_offset);
        assert_eq!(a.fragments[0].compressed_size, b.fragments[0].compressed_size);
    }

    #[test]
    fn read_source_with_crc_matches_one_shot_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"streamed content").unwrap();
        let (bytes, crc32) = read_source_with_crc(&path).unwrap();
        assert_eq!(bytes, b"streamed content");
        assert_eq!(crc32, crc32fast::hash(b"streamed content"));
    }
}
