//! Manifest read/write.
//!
//! The KeyValues-style textual grammar real archives use is treated as an
//! opaque, delegated format; we persist a simple deterministic
//! keyed-record text format instead (one `entry_path` block per record,
//! `key = value` lines, blank-line separated). `serde` backs the
//! in-memory structs purely so the rest of the crate can serialize them
//! for tooling/tests; the on-disk reader/writer below is hand-rolled and
//! is the only thing that actually has to round-trip.

use crate::container::Directory;
use crate::error::{RevpkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub preload_size: u16,
    pub load_flags: u32,
    pub texture_flags: u16,
    pub use_compression: bool,
    pub de_duplicate: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: BTreeMap<String, ManifestEntry>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MultiLocaleManifest {
    pub locales: BTreeMap<String, BTreeMap<String, ManifestEntry>>,
}

impl ManifestEntry {
    /// `useCompression` is true iff any fragment was stored smaller than
    /// its uncompressed length. `loadFlags`/`textureFlags` come from the
    /// first fragment (0 when there are none).
    pub fn from_entry_block(entry: &crate::container::EntryBlock) -> Self {
        let use_compression = entry
            .fragments
            .iter()
            .any(|f| f.compressed_size < f.uncompressed_size);
        let (load_flags, texture_flags) = entry
            .fragments
            .first()
            .map(|f| (f.load_flags, f.texture_flags))
            .unwrap_or((0, 0));
        ManifestEntry {
            preload_size: entry.preload_size,
            load_flags,
            texture_flags,
            use_compression,
            de_duplicate: true,
        }
    }
}

impl Manifest {
    pub fn from_directory(dir: &Directory) -> Self {
        let entries = dir
            .entries
            .iter()
            .map(|e| (e.entry_path.clone(), ManifestEntry::from_entry_block(e)))
            .collect();
        Manifest { entries }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (path, entry) in &self.entries {
            write_record(&mut out, path, entry);
        }
        out
    }

    pub fn from_text(text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (path, entry) in parse_records(text)? {
            entries.insert(path, entry);
        }
        Ok(Manifest { entries })
    }
}

impl MultiLocaleManifest {
    pub fn from_directories(dirs: &[(&str, &Directory)]) -> Self {
        let mut locales = BTreeMap::new();
        let english: BTreeMap<String, ManifestEntry> = dirs
            .iter()
            .find(|(locale, _)| *locale == "english")
            .map(|(_, dir)| Manifest::from_directory(dir).entries)
            .unwrap_or_default();

        let all_paths: std::collections::BTreeSet<String> = dirs
            .iter()
            .flat_map(|(_, dir)| dir.entries.iter().map(|e| e.entry_path.clone()))
            .collect();

        for (locale, dir) in dirs {
            let local = Manifest::from_directory(dir).entries;
            let mut merged = BTreeMap::new();
            for path in &all_paths {
                if let Some(entry) = local.get(path) {
                    merged.insert(path.clone(), entry.clone());
                } else if let Some(entry) = english.get(path) {
                    merged.insert(path.clone(), entry.clone());
                }
            }
            locales.insert(locale.to_string(), merged);
        }
        MultiLocaleManifest { locales }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (locale, entries) in &self.locales {
            let _ = writeln!(out, "[locale {locale}]");
            for (path, entry) in entries {
                write_record(&mut out, path, entry);
            }
        }
        out
    }

    pub fn from_text(text: &str) -> Result<Self> {
        let mut locales: BTreeMap<String, BTreeMap<String, ManifestEntry>> = BTreeMap::new();
        let mut current_locale: Option<String> = None;
        let mut current_section = String::new();

        for line in text.lines() {
            if let Some(name) = line.trim().strip_prefix("[locale ").and_then(|s| s.strip_suffix(']')) {
                if let Some(locale) = current_locale.take() {
                    locales.insert(locale, Manifest::from_text(&current_section)?.entries);
                }
                current_locale = Some(name.to_string());
                current_section.clear();
            } else {
                current_section.push_str(line);
                current_section.push('\n');
            }
        }
        if let Some(locale) = current_locale.take() {
            locales.insert(locale, Manifest::from_text(&current_section)?.entries);
        }
        Ok(MultiLocaleManifest { locales })
    }
}

fn write_record(out: &mut String, path: &str, entry: &ManifestEntry) {
    let _ = writeln!(out, "entry_path = {path}");
    let _ = writeln!(out, "preloadSize = {}", entry.preload_size);
    let _ = writeln!(out, "loadFlags = {}", entry.load_flags);
    let _ = writeln!(out, "textureFlags = {}", entry.texture_flags);
    let _ = writeln!(out, "useCompression = {}", entry.use_compression);
    let _ = writeln!(out, "deDuplicate = {}", entry.de_duplicate);
    out.push('\n');
}

fn parse_records(text: &str) -> Result<Vec<(String, ManifestEntry)>> {
    let mut records = Vec::new();
    let mut path: Option<String> = None;
    let mut entry = ManifestEntry::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if let Some(p) = path.take() {
                records.push((p, std::mem::take(&mut entry)));
            }
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| RevpkError::ManifestParse(format!("malformed line: {line}")))?;
        let key = key.trim();
        let value = value.trim();
        match key {
            "entry_path" => path = Some(value.to_string()),
            "preloadSize" => {
                entry.preload_size = value
                    .parse()
                    .map_err(|_| RevpkError::ManifestParse(format!("bad preloadSize: {value}")))?
            }
            "loadFlags" => {
                entry.load_flags = value
                    .parse()
                    .map_err(|_| RevpkError::ManifestParse(format!("bad loadFlags: {value}")))?
            }
            "textureFlags" => {
                entry.texture_flags = value
                    .parse()
                    .map_err(|_| RevpkError::ManifestParse(format!("bad textureFlags: {value}")))?
            }
            "useCompression" => {
                entry.use_compression = value
                    .parse()
                    .map_err(|_| RevpkError::ManifestParse(format!("bad useCompression: {value}")))?
            }
            "deDuplicate" => {
                entry.de_duplicate = value
                    .parse()
                    .map_err(|_| RevpkError::ManifestParse(format!("bad deDuplicate: {value}")))?
            }
            other => return Err(RevpkError::ManifestParse(format!("unknown key: {other}"))),
        }
    }
    if let Some(p) = path.take() {
        records.push((p, entry));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_locale_manifest_round_trips_through_text() {
        let mut m = MultiLocaleManifest::default();
        let mut english = BTreeMap::new();
        english.insert(
            "a.txt".to_string(),
            ManifestEntry {
                preload_size: 0,
                load_flags: 0,
                texture_flags: 0,
                use_compression: false,
                de_duplicate: true,
            },
        );
        m.locales.insert("english".to_string(), english.clone());
        m.locales.insert("french".to_string(), english);

        let text = m.to_text();
        let back = MultiLocaleManifest::from_text(&text).unwrap();
        assert_eq!(m.locales, back.locales);
    }

    #[test]
    fn manifest_round_trips_through_text() {
        let mut m = Manifest::default();
        m.entries.insert(
            "a/b.txt".into(),
            ManifestEntry {
                preload_size: 4,
                load_flags: 1,
                texture_flags: 2,
                use_compression: true,
                de_duplicate: true,
            },
        );
        let text = m.to_text();
        let back = Manifest::from_text(&text).unwrap();
        assert_eq!(m.entries, back.entries);
    }
}
