use crate::codec::{self, DetectedMethod};
use crate::container::{Directory, EntryBlock};
use crate::error::{RevpkError, Result};
use crate::locale::{self, SHARED_PACK_INDEX};
use crate::worker::WorkerPool;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

fn split_target_level(stripped_dir_name: &str) -> Option<(String, String)> {
    let without_suffix = stripped_dir_name.strip_suffix(".bsp.pak000_dir.vpk")?;
    let idx = without_suffix.rfind('_')?;
    Some((
        without_suffix[..idx].to_string(),
        without_suffix[idx + 1..].to_string(),
    ))
}

/// Maps a directory file's name and a fragment's `pack_index` to the data
/// file that holds it: the reserved shared index resolves to the
/// delta-common file; everything else strips the locale prefix and swaps
/// `pak000_dir` for `pak000_<index:03>`.
pub fn data_file_name_for_index(dir_file_name: &str, pack_index: u16) -> Option<String> {
    let (_, stripped) = locale::strip_locale_prefix(dir_file_name);
    if pack_index == SHARED_PACK_INDEX {
        let (target, _level) = split_target_level(stripped)?;
        Some(locale::shared_data_file_name(&target))
    } else {
        Some(stripped.replacen("pak000_dir", &format!("pak000_{pack_index:03}"), 1))
    }
}

fn decode_fragment(compressed_size: u64, uncompressed_size: u64, stored: &[u8]) -> Result<Vec<u8>> {
    let detected = codec::detect(compressed_size, uncompressed_size, stored);
    match detected {
        DetectedMethod::Raw => Ok(stored.to_vec()),
        DetectedMethod::Zstd | DetectedMethod::Lzham => codec::decode_stored(detected, stored),
    }
}

pub fn unpack_entry(entry: &EntryBlock, data_file: &Path, out_root: &Path) -> Result<()> {
    let out_path = out_root.join(&entry.entry_path);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = File::create(&out_path)?;
    out.write_all(&entry.preload_bytes)?;

    let mut data = File::open(data_file)?;
    for fragment in &entry.fragments {
        if fragment.is_placeholder() {
            continue;
        }
        data.seek(SeekFrom::Start(fragment.pack_offset))?;
        let mut stored = vec![0u8; fragment.compressed_size as usize];
        data.read_exact(&mut stored)
            .map_err(|_| RevpkError::Truncated(format!("fragment at {}", fragment.pack_offset)))?;

        match decode_fragment(fragment.compressed_size, fragment.uncompressed_size, &stored) {
            Ok(decoded) => out.write_all(&decoded)?,
            Err(e) => {
                eprintln!(
                    "warning: {}: fragment at {} failed to decode ({e}); output left short",
                    entry.entry_path, fragment.pack_offset
                );
            }
        }
    }
    Ok(())
}

/// Unpacks every entry in `directory` into `out_root`. Each `pack_index`
/// present resolves to its own data file, opened once per unpacking task
/// (tasks own their handles rather than sharing one, matching the
/// per-task resource scoping used for packing).
pub fn unpack(
    directory: &Directory,
    dir_file_path: &Path,
    out_root: &Path,
    num_threads: Option<usize>,
) -> Result<usize> {
    let dir_file_name = dir_file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let data_dir = dir_file_path.parent().unwrap_or_else(|| Path::new("."));

    let pool = WorkerPool::new(num_threads);
    let tasks: Vec<_> = directory
        .entries
        .iter()
        .cloned()
        .map(|entry| {
            let dir_file_name = dir_file_name.clone();
            let data_dir = data_dir.to_path_buf();
            let out_root = out_root.to_path_buf();
            move || -> Result<()> {
                let data_name = data_file_name_for_index(&dir_file_name, entry.pack_index)
                    .ok_or_else(|| RevpkError::BadHeader("cannot derive data file name".into()))?;
                let data_file: PathBuf = data_dir.join(data_name);
                unpack_entry(&entry, &data_file, &out_root)
            }
        })
        .collect();

    let mut count = 0;
    for result in pool.install_many(tasks) {
        result?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_index_maps_to_delta_common_file() {
        let name = data_file_name_for_index("frenchmp_blah_uber.bsp.pak000_dir.vpk", SHARED_PACK_INDEX)
            .unwrap();
        assert_eq!(name, "mp_blah_mp_delta_common.bsp.pak000_000.vpk");
    }

    #[test]
    fn ordinary_index_substitutes_patch_number() {
        let name = data_file_name_for_index("mp_blah_uber.bsp.pak000_dir.vpk", 3).unwrap();
        assert_eq!(name, "mp_blah_uber.bsp.pak000_003.vpk");
    }
}
