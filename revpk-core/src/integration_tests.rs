//! Whole-pipeline tests exercising pack and unpack together, since the
//! per-module unit tests only ever look at one side at a time.

use crate::container::Directory;
use crate::manifest::{Manifest, ManifestEntry};
use crate::pack::{pack, PackOptions};
use crate::store::ChunkStore;
use crate::unpack::unpack;
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

fn write_entry(entry: &ManifestEntry, preload: bool) -> ManifestEntry {
    let mut e = entry.clone();
    e.preload_size = if preload { 2 } else { 0 };
    e
}

#[test]
fn pack_then_unpack_round_trips_file_bytes() {
    let workspace = tempdir().unwrap();
    let build = tempdir().unwrap();
    let out = tempdir().unwrap();

    let content_dir = workspace.path().join("content").join("english");
    fs::create_dir_all(content_dir.join("sound")).unwrap();
    fs::write(content_dir.join("sound").join("boom.wav"), b"big bang payload").unwrap();
    fs::write(content_dir.join("readme.txt"), b"").unwrap();

    let mut manifest = Manifest::default();
    let base = ManifestEntry {
        preload_size: 0,
        load_flags: 0,
        texture_flags: 0,
        use_compression: true,
        de_duplicate: true,
    };
    manifest
        .entries
        .insert("sound/boom.wav".to_string(), write_entry(&base, true));
    manifest
        .entries
        .insert("readme.txt".to_string(), base.clone());

    let data_name = crate::locale::data_file_name("mp_blah", "zstd", 0);
    let data_path = build.path().join(&data_name);
    let chunk_store = ChunkStore::new(fs::File::create(&data_path).unwrap());

    let opts = PackOptions {
        workspace: workspace.path().to_path_buf(),
        locale: "english".to_string(),
        level: "zstd".to_string(),
        num_threads: Some(2),
    };
    let (entries, warnings) = pack(&manifest, &chunk_store, &opts).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(entries.len(), 2);

    let dir_name = crate::locale::directory_file_name("", "mp_blah", "zstd");
    let dir_path = build.path().join(&dir_name);
    let directory = Directory::new(dir_path.clone(), entries);
    {
        let mut f = fs::File::create(&dir_path).unwrap();
        directory.write_to(&mut f).unwrap();
    }

    drop(chunk_store);
    let mut dir_file = fs::File::open(&dir_path).unwrap();
    let reloaded = Directory::read_from(dir_path.clone(), &mut dir_file).unwrap();

    let count = unpack(&reloaded, &dir_path, out.path(), None).unwrap();
    assert_eq!(count, 2);

    let roundtripped = fs::read(out.path().join("sound").join("boom.wav")).unwrap();
    assert_eq!(roundtripped, b"big bang payload");
    let empty = fs::read(out.path().join("readme.txt")).unwrap();
    assert!(empty.is_empty());
}

#[test]
fn locale_fallback_only_unpacks_entries_that_differ_from_english() {
    use crate::pack::locale_pack::diff_against_fallback;

    let mut fallback: BTreeMap<String, u32> = BTreeMap::new();
    fallback.insert("shared.txt".to_string(), 111);
    fallback.insert("translated.txt".to_string(), 222);

    let locale_entries = vec![
        crate::container::EntryBlock {
            crc32: 111,
            preload_size: 0,
            pack_index: 0,
            preload_bytes: vec![],
            fragments: vec![],
            entry_path: "shared.txt".to_string(),
        },
        crate::container::EntryBlock {
            crc32: 999,
            preload_size: 0,
            pack_index: 0,
            preload_bytes: vec![],
            fragments: vec![],
            entry_path: "translated.txt".to_string(),
        },
    ];

    let diffed = diff_against_fallback(&fallback, &locale_entries);
    assert_eq!(diffed.len(), 1);
    assert_eq!(diffed[0].entry_path, "translated.txt");
}

#[test]
fn unknown_locale_falls_back_to_english_content() {
    let workspace = tempdir().unwrap();
    let build = tempdir().unwrap();

    fs::create_dir_all(workspace.path().join("content").join("english")).unwrap();
    fs::write(
        workspace.path().join("content").join("english").join("a.txt"),
        b"english only",
    )
    .unwrap();

    let mut manifest = Manifest::default();
    manifest.entries.insert(
        "a.txt".to_string(),
        ManifestEntry {
            preload_size: 0,
            load_flags: 0,
            texture_flags: 0,
            use_compression: false,
            de_duplicate: true,
        },
    );

    let data_path = build.path().join("data.vpk");
    let chunk_store = ChunkStore::new(fs::File::create(&data_path).unwrap());
    let opts = PackOptions {
        workspace: workspace.path().to_path_buf(),
        locale: "french".to_string(),
        level: "zstd".to_string(),
        num_threads: None,
    };
    let (entries, warnings) = pack(&manifest, &chunk_store, &opts).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(entries.len(), 1);
}
