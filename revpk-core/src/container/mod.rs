pub mod chunk;
pub mod directory;
pub mod entry;
pub mod header;

pub use chunk::ChunkDescriptor;
pub use directory::Directory;
pub use entry::EntryBlock;
pub use header::Header;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn frag(off: u64, c: u64, u: u64) -> ChunkDescriptor {
        ChunkDescriptor {
            load_flags: 0,
            texture_flags: 0,
            pack_offset: off,
            compressed_size: c,
            uncompressed_size: u,
        }
    }

    #[test]
    fn directory_round_trips_and_is_idempotent() {
        let entries = vec![
            EntryBlock {
                crc32: 0xdead_beef,
                preload_size: 0,
                pack_index: 0,
                preload_bytes: vec![],
                fragments: vec![frag(0, 5, 5)],
                entry_path: "a/b.txt".into(),
            },
            EntryBlock {
                crc32: 0x1234,
                preload_size: 2,
                pack_index: 0,
                preload_bytes: vec![1, 2],
                fragments: vec![frag(5, 10, 20), frag(15, 3, 3)],
                entry_path: "tool".into(),
            },
            EntryBlock {
                crc32: 0,
                preload_size: 0,
                pack_index: 0,
                preload_bytes: vec![],
                fragments: vec![],
                entry_path: "empty.dat".into(),
            },
        ];
        let dir = Directory::new(PathBuf::from("x_dir.vpk"), entries);
        let mut buf = Vec::new();
        dir.write_to(&mut buf).unwrap();

        let parsed = Directory::read_from(PathBuf::from("x_dir.vpk"), &mut &buf[..]).unwrap();
        let mut expected = dir.entries.clone();
        let mut actual = parsed.entries.clone();
        expected.sort_by(|a, b| a.entry_path.cmp(&b.entry_path));
        actual.sort_by(|a, b| a.entry_path.cmp(&b.entry_path));
        assert_eq!(expected, actual);

        let mut buf2 = Vec::new();
        parsed.write_to(&mut buf2).unwrap();
        assert_eq!(buf, buf2, "re-serializing a parsed directory must be byte-identical");
    }
}
