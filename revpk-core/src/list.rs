//! `ls`: enumerate a directory file's entries with reconstructed sizes.

use crate::container::Directory;
use crate::error::Result;
use std::path::Path;

pub struct ListedEntry {
    pub entry_path: String,
    pub reconstructed_size: u64,
    pub fragment_count: usize,
}

pub fn list(dir_file_path: &Path) -> Result<Vec<ListedEntry>> {
    let mut file = std::fs::File::open(dir_file_path)?;
    let directory = Directory::read_from(dir_file_path.to_path_buf(), &mut file)?;
    Ok(directory
        .entries
        .iter()
        .map(|e| ListedEntry {
            entry_path: e.entry_path.clone(),
            reconstructed_size: e.preload_bytes.len() as u64
                + e.fragments.iter().map(|f| f.uncompressed_size).sum::<u64>(),
            fragment_count: e.fragments.len(),
        })
        .collect())
}

pub fn print_listing(entries: &[ListedEntry]) {
    for entry in entries {
        println!(
            "{:>12}  {:>3} frag  {}",
            entry.reconstructed_size, entry.fragment_count, entry.entry_path
        );
    }
    println!("{} entries", entries.len());
}
