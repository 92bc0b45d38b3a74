use super::packer::{method_for_level, pack_one_file, read_source_with_crc, PackWarning};
use crate::container::EntryBlock;
use crate::error::Result;
use crate::manifest::{Manifest, ManifestEntry};
use crate::store::ChunkStore;
use crate::worker::WorkerPool;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SERVER_EXCLUDED_EXTENSIONS: &[&str] = &[
    "raw", "vcs", "vtf", "vfont", "vbf", "bsp_lump", "vvd", "vtx",
];
const SERVER_EXCLUDED_TOP_DIRS: &[&str] = &["depot", "media", "shaders", "sound"];
const SERVER_EXCLUDED_MAP: &str = "mp_npe";

#[derive(Clone, Debug)]
pub struct DeltaCommonRecord {
    pub map: String,
    pub locale: String,
    pub entry_path: String,
    pub manifest_entry: ManifestEntry,
}

/// Walks `<workspace>/manifest/<locale>/<map>.vdf`, one keyed-record text
/// manifest per map per locale, and flattens them into per-file records.
pub fn discover_records(workspace: &Path) -> Result<Vec<DeltaCommonRecord>> {
    let manifest_root = workspace.join("manifest");
    let mut records = Vec::new();
    if !manifest_root.is_dir() {
        return Ok(records);
    }
    for locale_dir in std::fs::read_dir(&manifest_root)? {
        let locale_dir = locale_dir?;
        if !locale_dir.file_type()?.is_dir() {
            continue;
        }
        let locale = locale_dir.file_name().to_string_lossy().into_owned();
        for entry in WalkDir::new(locale_dir.path())
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            if entry.file_type().is_file() && entry.path().extension().map(|e| e == "vdf").unwrap_or(false) {
                let map = entry
                    .path()
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let text = std::fs::read_to_string(entry.path())?;
                let manifest = Manifest::from_text(&text)?;
                for (entry_path, manifest_entry) in manifest.entries {
                    records.push(DeltaCommonRecord {
                        map: map.clone(),
                        locale: locale.clone(),
                        entry_path,
                        manifest_entry,
                    });
                }
            }
        }
    }
    Ok(records)
}

fn extension_of(entry_path: &str) -> &str {
    entry_path.rsplit('.').next().unwrap_or("")
}

fn top_dir_of(entry_path: &str) -> &str {
    entry_path.split('/').next().unwrap_or("")
}

fn excluded_from_server(map: &str, entry_path: &str) -> bool {
    SERVER_EXCLUDED_EXTENSIONS.contains(&extension_of(entry_path))
        || SERVER_EXCLUDED_TOP_DIRS.contains(&top_dir_of(entry_path))
        || map == SERVER_EXCLUDED_MAP
}

/// `.bsp` files are rehomed into `mp_common` regardless of the originating
/// map; everything else keeps its source map.
pub fn effective_map(map: &str, entry_path: &str) -> String {
    if extension_of(entry_path) == "bsp" {
        "mp_common".to_string()
    } else {
        map.to_string()
    }
}

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

pub struct PackDeltaCommonOptions {
    pub workspace: PathBuf,
    pub level: String,
    pub num_threads: Option<usize>,
}

/// Key identifying one output directory file: `(locale, effective_map)`.
pub type DirectoryKey = (String, String);

/// Routes each record into the client stream (always) and the server
/// stream (unless excluded), packing English first so non-English misses
/// can be filled in from the recorded English entry for the same
/// `(map, path)`.
pub fn pack_delta_common(
    records: &[DeltaCommonRecord],
    client_store: &ChunkStore,
    server_store: &ChunkStore,
    opts: &PackDeltaCommonOptions,
) -> Result<(
    BTreeMap<DirectoryKey, Vec<EntryBlock>>,
    BTreeMap<DirectoryKey, Vec<EntryBlock>>,
    Vec<PackWarning>,
)> {
    let pool = WorkerPool::new(opts.num_threads);
    let (method, level) = method_for_level(&opts.level);

    let (english, rest): (Vec<_>, Vec<_>) =
        records.iter().cloned().partition(|r| r.locale == "english");

    let mut client_out: BTreeMap<DirectoryKey, Vec<EntryBlock>> = BTreeMap::new();
    let mut server_out: BTreeMap<DirectoryKey, Vec<EntryBlock>> = BTreeMap::new();
    let mut warnings = Vec::new();
    let mut english_by_map_path: BTreeMap<(String, String), EntryBlock> = BTreeMap::new();

    let english_tasks: Vec<_> = english
        .iter()
        .cloned()
        .map(|record| {
            let workspace = opts.workspace.clone();
            move || -> Result<(DeltaCommonRecord, Option<(Vec<u8>, u32)>)> {
                let Some(source) = resolve_source(&workspace, &record.locale, &record.entry_path)
                else {
                    return Ok((record, None));
                };
                Ok((record, Some(read_source_with_crc(&source)?)))
            }
        })
        .collect();

    for result in pool.install_many(english_tasks) {
        let (record, source) = result?;
        let Some((bytes, crc32)) = source else {
            warnings.push(PackWarning {
                entry_path: record.entry_path.clone(),
                message: "missing english source for delta-common pack".into(),
            });
            continue;
        };
        let key = (record.locale.clone(), effective_map(&record.map, &record.entry_path));
        let client_entry = pack_one_file(
            client_store,
            &record.entry_path,
            &bytes,
            crc32,
            &record.manifest_entry,
            method,
            level,
            0,
        )?;
        english_by_map_path.insert((record.map.clone(), record.entry_path.clone()), client_entry.clone());
        client_out.entry(key.clone()).or_default().push(client_entry);

        if !excluded_from_server(&record.map, &record.entry_path) {
            let server_entry = pack_one_file(
                server_store,
                &record.entry_path,
                &bytes,
                crc32,
                &record.manifest_entry,
                method,
                level,
                0,
            )?;
            server_out.entry(key).or_default().push(server_entry);
        }
    }

    let rest_tasks: Vec<_> = rest
        .iter()
        .cloned()
        .map(|record| {
            let workspace = opts.workspace.clone();
            move || -> Result<(DeltaCommonRecord, Option<(Vec<u8>, u32)>)> {
                match resolve_source(&workspace, &record.locale, &record.entry_path) {
                    Some(source) => Ok((record, Some(read_source_with_crc(&source)?))),
                    None => Ok((record, None)),
                }
            }
        })
        .collect();

    for result in pool.install_many(rest_tasks) {
        let (record, source) = result?;
        let key = (record.locale.clone(), effective_map(&record.map, &record.entry_path));

        let (client_entry, source) = match source {
            Some((bytes, crc32)) => {
                let entry = pack_one_file(
                    client_store,
                    &record.entry_path,
                    &bytes,
                    crc32,
                    &record.manifest_entry,
                    method,
                    level,
                    0,
                )?;
                (entry, Some((bytes, crc32)))
            }
            None => match english_by_map_path.get(&(record.map.clone(), record.entry_path.clone())) {
                Some(fallback) => (fallback.clone(), None),
                None => {
                    warnings.push(PackWarning {
                        entry_path: record.entry_path.clone(),
                        message: "missing source and no english fallback recorded".into(),
                    });
                    continue;
                }
            },
        };
        client_out.entry(key.clone()).or_default().push(client_entry);

        if !excluded_from_server(&record.map, &record.entry_path) {
            let reread = match source {
                Some(pair) => Some(pair),
                None => resolve_source(&opts.workspace, &record.locale, &record.entry_path)
                    .map(|source| read_source_with_crc(&source))
                    .transpose()?,
            };
            if let Some((bytes, crc32)) = reread {
                let server_entry = pack_one_file(
                    server_store,
                    &record.entry_path,
                    &bytes,
                    crc32,
                    &record.manifest_entry,
                    method,
                    level,
                    0,
                )?;
                server_out.entry(key).or_default().push(server_entry);
            }
        }
    }

    Ok((client_out, server_out, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bsp_is_always_rehomed() {
        assert_eq!(effective_map("mp_blah", "maps/mp_blah.bsp"), "mp_common");
        assert_eq!(effective_map("mp_blah", "sound/foo.wav"), "mp_blah");
    }

    #[test]
    fn server_excludes_flagged_extensions_and_dirs() {
        assert!(excluded_from_server("mp_blah", "textures/foo.vtf"));
        assert!(excluded_from_server("mp_blah", "sound/foo.wav"));
        assert!(excluded_from_server("mp_npe", "maps/mp_npe.bsp"));
        assert!(!excluded_from_server("mp_blah", "scripts/vscripts/foo.nut"));
    }
}
