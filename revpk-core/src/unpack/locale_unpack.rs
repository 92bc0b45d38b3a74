use super::unpacker::{data_file_name_for_index, unpack, unpack_entry};
use crate::container::Directory;
use crate::error::{RevpkError, Result};
use crate::locale::{self, KNOWN_LOCALES};
use crate::manifest::MultiLocaleManifest;
use crate::pack::locale_pack::{diff_against_fallback, fallback_crc_map, manifest_from_entries};
use crate::worker::WorkerPool;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Derives the shared base name and scans the directory file's parent for
/// every sibling `<known_locale><base>` file ending in `_dir.vpk`,
/// returning `(locale, path)` pairs including the one passed in.
fn discover_locale_directories(any_dir_file: &Path) -> Result<Vec<(String, PathBuf)>> {
    let file_name = any_dir_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| RevpkError::BadHeader("not a file path".into()))?;
    let (_, base) = locale::strip_locale_prefix(&file_name);
    let parent = any_dir_file.parent().unwrap_or_else(|| Path::new("."));

    let mut found = Vec::new();
    for locale in KNOWN_LOCALES {
        let candidate_name = if *locale == "english" {
            base.to_string()
        } else {
            format!("{locale}{base}")
        };
        let candidate = parent.join(&candidate_name);
        if candidate.is_file() {
            found.push((locale.to_string(), candidate));
        }
    }
    if found.is_empty() {
        found.push(("english".to_string(), any_dir_file.to_path_buf()));
    }
    Ok(found)
}

pub struct UnpackMultiOptions {
    pub out_root: PathBuf,
    pub sanitize: bool,
    pub num_threads: Option<usize>,
}

/// Unpacks a multi-locale archive given the path to any one of its
/// directory files: the fallback locale (english, or the first available)
/// is unpacked in full; every other locale emits only the entries whose
/// CRC differs from the fallback. Finishes by writing a combined
/// multi-locale manifest under `<out>/manifest/`.
pub fn unpack_multi(any_dir_file: &Path, opts: &UnpackMultiOptions) -> Result<usize> {
    let dir_file = if opts.sanitize {
        PathBuf::from(locale::sanitize_to_directory_path(
            &any_dir_file.to_string_lossy(),
        ))
    } else {
        any_dir_file.to_path_buf()
    };

    let siblings = discover_locale_directories(&dir_file)?;

    let mut parsed: BTreeMap<String, Directory> = BTreeMap::new();
    for (locale, path) in &siblings {
        let mut file = std::fs::File::open(path)?;
        let directory = Directory::read_from(path.clone(), &mut file)?;
        parsed.insert(locale.clone(), directory);
    }

    let fallback_locale = if parsed.contains_key("english") {
        "english".to_string()
    } else {
        parsed
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| RevpkError::BadHeader("no locale directories found".into()))?
    };

    let fallback_dir = parsed.get(&fallback_locale).unwrap().clone();
    let fallback_crcs = fallback_crc_map(&fallback_dir.entries);

    let fallback_out = opts.out_root.join("content").join(&fallback_locale);
    let mut total = unpack(
        &fallback_dir,
        &fallback_dir.dir_path,
        &fallback_out,
        opts.num_threads,
    )?;

    let pool = WorkerPool::new(opts.num_threads);
    let mut entries_for_manifest: BTreeMap<String, Vec<crate::container::EntryBlock>> =
        BTreeMap::new();
    entries_for_manifest.insert(fallback_locale.clone(), fallback_dir.entries.clone());

    for (locale, directory) in &parsed {
        if *locale == fallback_locale {
            continue;
        }
        let to_unpack = diff_against_fallback(&fallback_crcs, &directory.entries);
        let dir_file_name = directory
            .dir_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data_dir = directory.dir_path.parent().unwrap_or_else(|| Path::new("."));

        let locale_out = opts.out_root.join("content").join(locale);
        let tasks: Vec<_> = to_unpack
            .into_iter()
            .cloned()
            .map(|entry| {
                let dir_file_name = dir_file_name.clone();
                let data_dir = data_dir.to_path_buf();
                let locale_out = locale_out.clone();
                move || -> Result<()> {
                    let data_name = data_file_name_for_index(&dir_file_name, entry.pack_index)
                        .ok_or_else(|| RevpkError::BadHeader("cannot derive data file name".into()))?;
                    unpack_entry(&entry, &data_dir.join(data_name), &locale_out)
                }
            })
            .collect();
        for result in pool.install_many(tasks) {
            result?;
            total += 1;
        }
        entries_for_manifest.insert(locale.clone(), directory.entries.clone());
    }

    let manifest = manifest_from_entries(&entries_for_manifest);
    write_multi_manifest(&opts.out_root, &manifest)?;

    Ok(total)
}

fn write_multi_manifest(out_root: &Path, manifest: &MultiLocaleManifest) -> Result<()> {
    let manifest_dir = out_root.join("manifest");
    std::fs::create_dir_all(&manifest_dir)?;
    std::fs::write(manifest_dir.join("multiLangManifest.vdf"), manifest.to_text())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_falls_back_to_single_file_when_no_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mp_blah_uber.bsp.pak000_dir.vpk");
        std::fs::write(&path, b"").unwrap();
        let found = discover_locale_directories(&path).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "english");
    }
}
