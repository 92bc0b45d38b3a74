use super::chunk::ChunkDescriptor;

/// Metadata for one logical file: CRC, preload, pack index, and ordered
/// fragment list. `entry_path` is the full path as it appears in the
/// manifest/content tree (e.g. `"maps/mp_blah.bsp"`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryBlock {
    pub crc32: u32,
    pub preload_size: u16,
    pub pack_index: u16,
    pub preload_bytes: Vec<u8>,
    pub fragments: Vec<ChunkDescriptor>,
    pub entry_path: String,
}

/// Splits an entry path into `(extension, path, filename)` per the
/// directory tree's ingestion rule: last `.` splits name from extension,
/// last `/` splits path from name, empty path becomes `" "`. Files with no
/// extension get an empty extension string.
pub fn split_entry_path(entry_path: &str) -> (String, String, String) {
    let (dir, name) = match entry_path.rfind('/') {
        Some(idx) => (&entry_path[..idx], &entry_path[idx + 1..]),
        None => ("", entry_path),
    };
    let (filename, extension) = match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx + 1..]),
        None => (name, ""),
    };
    let path = if dir.is_empty() { " ".to_string() } else { dir.to_string() };
    (extension.to_string(), path, filename.to_string())
}

/// Inverse of `split_entry_path`, used when reading the tree back into
/// entry paths.
pub fn join_entry_path(extension: &str, path: &str, filename: &str) -> String {
    let dir = if path == " " { "" } else { path };
    let mut out = String::new();
    if !dir.is_empty() {
        out.push_str(dir);
        out.push('/');
    }
    out.push_str(filename);
    if !extension.is_empty() {
        out.push('.');
        out.push_str(extension);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_nested_path() {
        assert_eq!(
            split_entry_path("maps/mp_blah.bsp"),
            ("bsp".into(), "maps".into(), "mp_blah".into())
        );
    }

    #[test]
    fn root_path_uses_sentinel() {
        assert_eq!(
            split_entry_path("readme.txt"),
            ("txt".into(), " ".into(), "readme".into())
        );
    }

    #[test]
    fn no_extension_is_empty() {
        assert_eq!(
            split_entry_path("bin/tool"),
            ("".into(), "bin".into(), "tool".into())
        );
    }

    #[test]
    fn join_is_inverse_of_split() {
        for p in ["maps/mp_blah.bsp", "readme.txt", "bin/tool", "a/b/c.d"] {
            let (ext, path, name) = split_entry_path(p);
            assert_eq!(join_entry_path(&ext, &path, &name), p);
        }
    }
}
