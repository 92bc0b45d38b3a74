use super::packer::{method_for_level, pack_one_file, read_source_with_crc, PackWarning};
use crate::container::EntryBlock;
use crate::error::Result;
use crate::manifest::{ManifestEntry, MultiLocaleManifest};
use crate::store::ChunkStore;
use crate::worker::WorkerPool;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

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

pub struct PackMultiOptions {
    pub workspace: PathBuf,
    pub level: String,
    pub num_threads: Option<usize>,
}

/// Packs every `(locale, entry)` pair from `manifest` into a single shared
/// `chunk_store`, returning each locale's entry blocks (all with
/// `pack_index == 0`, since there is one shared data file).
pub fn pack_multi(
    manifest: &MultiLocaleManifest,
    chunk_store: &ChunkStore,
    opts: &PackMultiOptions,
) -> Result<(BTreeMap<String, Vec<EntryBlock>>, Vec<PackWarning>)> {
    let pool = WorkerPool::new(opts.num_threads);
    let (method, level) = method_for_level(&opts.level);

    struct Job {
        locale: String,
        entry_path: String,
        manifest_entry: ManifestEntry,
    }

    let jobs: Vec<Job> = manifest
        .locales
        .iter()
        .flat_map(|(locale, entries)| {
            entries.iter().map(move |(path, entry)| Job {
                locale: locale.clone(),
                entry_path: path.clone(),
                manifest_entry: entry.clone(),
            })
        })
        .collect();

    let tasks: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let workspace = opts.workspace.clone();
            move || -> Result<(String, std::result::Result<EntryBlock, PackWarning>)> {
                let Some(source) = resolve_source(&workspace, &job.locale, &job.entry_path) else {
                    return Ok((
                        job.locale,
                        Err(PackWarning {
                            entry_path: job.entry_path,
                            message: "missing source in locale and english content trees".into(),
                        }),
                    ));
                };
                let (bytes, crc32) = read_source_with_crc(&source)?;
                let entry = pack_one_file(
                    chunk_store,
                    &job.entry_path,
                    &bytes,
                    crc32,
                    &job.manifest_entry,
                    method,
                    level,
                    0,
                )?;
                Ok((job.locale, Ok(entry)))
            }
        })
        .collect();

    let mut by_locale: BTreeMap<String, Vec<EntryBlock>> = BTreeMap::new();
    let mut warnings = Vec::new();
    for result in pool.install_many(tasks) {
        let (locale, outcome) = result?;
        match outcome {
            Ok(entry) => by_locale.entry(locale).or_default().push(entry),
            Err(warning) => warnings.push(warning),
        }
    }
    Ok((by_locale, warnings))
}

/// English-fallback differencing: given the english directory's
/// `{entry_path -> crc32}` map and a locale's entries, returns only the
/// entries that must be unpacked (those whose crc differs from, or whose
/// path is absent from, english).
pub fn diff_against_fallback<'a>(
    fallback: &BTreeMap<String, u32>,
    locale_entries: &'a [EntryBlock],
) -> Vec<&'a EntryBlock> {
    locale_entries
        .iter()
        .filter(|e| fallback.get(&e.entry_path) != Some(&e.crc32))
        .collect()
}

pub fn fallback_crc_map(english_entries: &[EntryBlock]) -> BTreeMap<String, u32> {
    english_entries
        .iter()
        .map(|e| (e.entry_path.clone(), e.crc32))
        .collect()
}

/// `from_directory` sibling used by the multi-locale manifest writer:
/// builds the merged manifest directly from per-locale entry lists rather
/// than `Directory`s (convenient when the caller already has the entries
/// in hand from `pack_multi`).
pub fn manifest_from_entries(by_locale: &BTreeMap<String, Vec<EntryBlock>>) -> MultiLocaleManifest {
    let mut locales = BTreeMap::new();
    let english: BTreeMap<String, ManifestEntry> = by_locale
        .get("english")
        .map(|entries| {
            entries
                .iter()
                .map(|e| (e.entry_path.clone(), ManifestEntry::from_entry_block(e)))
                .collect()
        })
        .unwrap_or_default();

    let all_paths: std::collections::BTreeSet<String> = by_locale
        .values()
        .flat_map(|entries| entries.iter().map(|e| e.entry_path.clone()))
        .collect();

    for (locale, entries) in by_locale {
        let local: BTreeMap<String, ManifestEntry> = entries
            .iter()
            .map(|e| (e.entry_path.clone(), ManifestEntry::from_entry_block(e)))
            .collect();
        let mut merged = BTreeMap::new();
        for path in &all_paths {
            if let Some(entry) = local.get(path) {
                merged.insert(path.clone(), entry.clone());
            } else if let Some(entry) = english.get(path) {
                merged.insert(path.clone(), entry.clone());
            }
        }
        locales.insert(locale.clone(), merged);
    }
    MultiLocaleManifest { locales }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ChunkDescriptor;

    fn entry(path: &str, crc: u32) -> EntryBlock {
        EntryBlock {
            crc32: crc,
            preload_size: 0,
            pack_index: 0,
            preload_bytes: vec![],
            fragments: vec![ChunkDescriptor {
                load_flags: 0,
                texture_flags: 0,
                pack_offset: 0,
                compressed_size: 1,
                uncompressed_size: 1,
            }],
            entry_path: path.to_string(),
        }
    }

    #[test]
    fn diff_skips_matching_crc() {
        let fallback = fallback_crc_map(&[entry("a.txt", 1), entry("b.txt", 2)]);
        let spanish = vec![entry("a.txt", 1), entry("b.txt", 99)];
        let diff = diff_against_fallback(&fallback, &spanish);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].entry_path, "b.txt");
    }
}
