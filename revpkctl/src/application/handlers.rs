use revpk_core::container::Directory;
use revpk_core::error::{RevpkError, Result};
use revpk_core::manifest::{Manifest, MultiLocaleManifest};
use revpk_core::pack::{self, PackOptions};
use revpk_core::pack::delta_common::{self, DeltaCommonRecord, PackDeltaCommonOptions};
use revpk_core::pack::locale_pack::{self, PackMultiOptions};
use revpk_core::store::ChunkStore;
use revpk_core::unpack::{self, UnpackMultiOptions};
use revpk_core::{locale, list as ls, Stats};
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

fn stats_from(entries: &[revpk_core::container::EntryBlock], store: &ChunkStore, started: Instant) -> Stats {
    use std::sync::atomic::Ordering;
    let bytes_in = entries
        .iter()
        .map(|e| e.preload_bytes.len() as u64 + e.fragments.iter().map(|f| f.uncompressed_size).sum::<u64>())
        .sum();
    Stats {
        files_processed: entries.len() as u64,
        chunks_written: store.stats.chunks_written.load(Ordering::Relaxed),
        chunks_deduped: store.stats.chunks_deduped.load(Ordering::Relaxed),
        bytes_in,
        bytes_out: store.stats.bytes_written.load(Ordering::Relaxed),
        elapsed: started.elapsed(),
    }
}

pub fn handle_pack(
    locale_arg: String,
    context: String,
    level: String,
    workspace: PathBuf,
    build_path: PathBuf,
    num_threads: Option<usize>,
) -> Result<()> {
    let started = Instant::now();
    std::fs::create_dir_all(&build_path)?;

    let manifest_path = workspace.join("manifest").join(format!("{context}.vdf"));
    let text = std::fs::read_to_string(&manifest_path)?;
    let manifest = Manifest::from_text(&text)?;

    let data_path = build_path.join(locale::data_file_name(&context, &level, 0));
    let chunk_store = ChunkStore::new(File::create(&data_path)?);

    let opts = PackOptions {
        workspace,
        locale: locale_arg.clone(),
        level: level.clone(),
        num_threads,
    };
    let (entries, warnings) = pack::pack(&manifest, &chunk_store, &opts)?;
    for w in &warnings {
        eprintln!("warning: {}: {}", w.entry_path, w.message);
    }

    let dir_path = build_path.join(locale::directory_file_name(&locale_arg, &context, &level));
    let directory = Directory::new(dir_path.clone(), entries);
    let mut dir_file = File::create(&dir_path)?;
    directory.write_to(&mut dir_file)?;

    let stats = stats_from(&directory.entries, &chunk_store, started);
    println!("pack: {} -> {}", dir_path.display(), stats);
    Ok(())
}

pub fn handle_unpack(
    dir_file: PathBuf,
    out_path: PathBuf,
    sanitize: bool,
) -> Result<()> {
    let started = Instant::now();
    let dir_file = if sanitize {
        PathBuf::from(locale::sanitize_to_directory_path(&dir_file.to_string_lossy()))
    } else {
        dir_file
    };
    let mut file = File::open(&dir_file)?;
    let directory = Directory::read_from(dir_file.clone(), &mut file)?;
    let count = unpack::unpack(&directory, &dir_file, &out_path, None)?;
    println!(
        "unpack: {} entries from {} in {:.2}s",
        count,
        dir_file.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

pub fn handle_packmulti(
    context: String,
    level: String,
    workspace: PathBuf,
    build_path: PathBuf,
    num_threads: Option<usize>,
) -> Result<()> {
    let started = Instant::now();
    std::fs::create_dir_all(&build_path)?;

    let manifest_path = workspace.join("manifest").join("multiLangManifest.vdf");
    let text = std::fs::read_to_string(&manifest_path)?;
    let manifest = MultiLocaleManifest::from_text(&text)?;

    let data_path = build_path.join(locale::data_file_name(&context, &level, 0));
    let chunk_store = ChunkStore::new(File::create(&data_path)?);

    let opts = PackMultiOptions {
        workspace,
        level: level.clone(),
        num_threads,
    };
    let (by_locale, warnings) = locale_pack::pack_multi(&manifest, &chunk_store, &opts)?;
    for w in &warnings {
        eprintln!("warning: {}: {}", w.entry_path, w.message);
    }

    let mut all_entries = Vec::new();
    for (loc, entries) in &by_locale {
        let dir_path = build_path.join(locale::directory_file_name(loc, &context, &level));
        let directory = Directory::new(dir_path.clone(), entries.clone());
        let mut dir_file = File::create(&dir_path)?;
        directory.write_to(&mut dir_file)?;
        all_entries.extend(entries.iter().cloned());
    }

    let stats = stats_from(&all_entries, &chunk_store, started);
    println!("packmulti: {} locales -> {}", by_locale.len(), stats);
    Ok(())
}

pub fn handle_unpackmulti(any_dir_file: PathBuf, out_path: PathBuf, sanitize: bool) -> Result<()> {
    let started = Instant::now();
    let opts = UnpackMultiOptions {
        out_root: out_path,
        sanitize,
        num_threads: None,
    };
    let count = unpack::unpack_multi(&any_dir_file, &opts)?;
    println!(
        "unpackmulti: {} entries in {:.2}s",
        count,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

pub fn handle_packdeltacommon(
    context: String,
    workspace: PathBuf,
    build_path: PathBuf,
    num_threads: Option<usize>,
    level: String,
) -> Result<()> {
    let started = Instant::now();
    std::fs::create_dir_all(&build_path)?;

    let records: Vec<DeltaCommonRecord> = delta_common::discover_records(&workspace)?;
    if records.is_empty() {
        return Err(RevpkError::ManifestParse(
            "no per-map manifests found under workspace/manifest/<locale>/".into(),
        ));
    }

    let client_data = build_path.join(format!("{context}_client_common.bsp.pak000_000.vpk"));
    let server_data = build_path.join(format!("{context}_server_common.bsp.pak000_000.vpk"));
    let client_store = ChunkStore::new(File::create(&client_data)?);
    let server_store = ChunkStore::new(File::create(&server_data)?);

    let opts = PackDeltaCommonOptions {
        workspace,
        level: level.clone(),
        num_threads,
    };
    let (client_out, server_out, warnings) =
        delta_common::pack_delta_common(&records, &client_store, &server_store, &opts)?;
    for w in &warnings {
        eprintln!("warning: {}: {}", w.entry_path, w.message);
    }

    let mut all_entries = Vec::new();
    for ((locale, map), entries) in &client_out {
        let dir_path = build_path.join(locale::directory_file_name(locale, map, &level));
        let directory = Directory::new(dir_path.clone(), entries.clone());
        let mut f = File::create(&dir_path)?;
        directory.write_to(&mut f)?;
        all_entries.extend(entries.iter().cloned());
    }
    for ((locale, map), entries) in &server_out {
        let dir_name = locale::directory_file_name(locale, map, &level).replace(".vpk", "_server.vpk");
        let dir_path = build_path.join(dir_name);
        let directory = Directory::new(dir_path.clone(), entries.clone());
        let mut f = File::create(&dir_path)?;
        directory.write_to(&mut f)?;
    }

    let stats = stats_from(&all_entries, &client_store, started);
    println!(
        "packdeltacommon: {} client directories, {} server directories -> {}",
        client_out.len(),
        server_out.len(),
        stats
    );
    Ok(())
}

pub fn handle_ls(dir_file: PathBuf) -> Result<()> {
    let entries = ls::list(&dir_file)?;
    ls::print_listing(&entries);
    Ok(())
}
