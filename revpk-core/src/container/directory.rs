use super::chunk::ChunkDescriptor;
use super::entry::{EntryBlock, join_entry_path, split_entry_path};
use super::header::Header;
use crate::error::{RevpkError, Result};
use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::PathBuf;

/// A parsed or in-progress directory file: header plus the flat list of
/// entry blocks it indexes. Built once during pack (finalized and
/// written); read-only during unpack.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    pub dir_path: PathBuf,
    pub entries: Vec<EntryBlock>,
}

impl Directory {
    pub fn new(dir_path: PathBuf, entries: Vec<EntryBlock>) -> Self {
        Directory { dir_path, entries }
    }

    pub fn pack_indices(&self) -> BTreeSet<u16> {
        self.entries.iter().map(|e| e.pack_index).collect()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut tree = Vec::new();
        write_tree(&self.entries, &mut tree)?;
        let header = Header::new(tree.len() as u32);
        header.write_to(w)?;
        w.write_all(&tree)?;
        Ok(())
    }

    pub fn read_from<R: Read>(dir_path: PathBuf, r: &mut R) -> Result<Self> {
        let header = Header::read_from(r)?;
        let mut tree = vec![0u8; header.directory_size as usize];
        r.read_exact(&mut tree)
            .map_err(|_| RevpkError::Truncated("directory tree".into()))?;
        let entries = read_tree(&tree)?;
        Ok(Directory { dir_path, entries })
    }
}

/// Groups entries by (extension, path) while preserving first-seen order,
/// matching "sorted by insertion in practice" from the format notes.
fn group_entries(entries: &[EntryBlock]) -> Vec<(String, Vec<(String, Vec<&EntryBlock>)>)> {
    let mut by_ext: Vec<(String, Vec<(String, Vec<&EntryBlock>)>)> = Vec::new();
    for entry in entries {
        let (ext, path, _) = split_entry_path(&entry.entry_path);
        let ext_group = match by_ext.iter_mut().find(|(e, _)| *e == ext) {
            Some(g) => g,
            None => {
                by_ext.push((ext.clone(), Vec::new()));
                by_ext.last_mut().unwrap()
            }
        };
        let path_group = match ext_group.1.iter_mut().find(|(p, _)| *p == path) {
            Some(g) => g,
            None => {
                ext_group.1.push((path.clone(), Vec::new()));
                ext_group.1.last_mut().unwrap()
            }
        };
        path_group.1.push(entry);
    }
    by_ext
}

fn write_tree(entries: &[EntryBlock], out: &mut Vec<u8>) -> Result<()> {
    for (ext, paths) in group_entries(entries) {
        // An empty extension string is itself a valid group (extensionless
        // files) and would otherwise be indistinguishable on the wire from
        // the end-of-extensions terminator; use the same " " sentinel the
        // path level already uses for its empty case.
        let ext_on_wire = if ext.is_empty() { " " } else { ext.as_str() };
        out.extend_from_slice(ext_on_wire.as_bytes());
        out.push(0);
        for (path, ents) in paths {
            out.extend_from_slice(path.as_bytes());
            out.push(0);
            for entry in ents {
                let (_, _, filename) = split_entry_path(&entry.entry_path);
                out.extend_from_slice(filename.as_bytes());
                out.push(0);
                out.extend_from_slice(&entry.crc32.to_le_bytes());
                out.extend_from_slice(&entry.preload_size.to_le_bytes());
                out.extend_from_slice(&entry.pack_index.to_le_bytes());
                out.extend_from_slice(&entry.preload_bytes);
                // The fragment loop below is a do-while on the read side (it
                // always consumes at least one ChunkDescriptor before
                // checking the terminator marker), so a zero-fragment entry
                // still needs one descriptor on the wire to carry that
                // terminator. Emit an all-zero placeholder; `is_placeholder`
                // recognizes it on the unpack side and `read_tree` strips it
                // back out of the in-memory fragment list below.
                if entry.fragments.is_empty() {
                    out.extend_from_slice(&0u32.to_le_bytes());
                    out.extend_from_slice(&0u16.to_le_bytes());
                    out.extend_from_slice(&0u64.to_le_bytes());
                    out.extend_from_slice(&0u64.to_le_bytes());
                    out.extend_from_slice(&0u64.to_le_bytes());
                    out.extend_from_slice(&0xFFFFu16.to_le_bytes());
                } else {
                    let last = entry.fragments.len().saturating_sub(1);
                    for (i, frag) in entry.fragments.iter().enumerate() {
                        out.extend_from_slice(&frag.load_flags.to_le_bytes());
                        out.extend_from_slice(&frag.texture_flags.to_le_bytes());
                        out.extend_from_slice(&frag.pack_offset.to_le_bytes());
                        out.extend_from_slice(&frag.compressed_size.to_le_bytes());
                        out.extend_from_slice(&frag.uncompressed_size.to_le_bytes());
                        let marker: u16 = if i == last { 0xFFFF } else { 0x0000 };
                        out.extend_from_slice(&marker.to_le_bytes());
                    }
                }
            }
            out.push(0);
        }
        out.push(0);
    }
    out.push(0);
    Ok(())
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn read_cstr(&mut self) -> Result<String> {
        let start = self.pos;
        loop {
            let b = *self
                .buf
                .get(self.pos)
                .ok_or_else(|| RevpkError::Truncated(format!("NUL-terminated string at {start}")))?;
            self.pos += 1;
            if b == 0 {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&self.buf[start..self.pos - 1]).into_owned())
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let start = self.pos;
        let end = start + n;
        if end > self.buf.len() {
            return Err(RevpkError::Truncated(format!("{n} bytes at {start}")));
        }
        self.pos = end;
        Ok(&self.buf[start..end])
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_bytes(2)?.try_into().unwrap()))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_bytes(8)?.try_into().unwrap()))
    }
}

fn read_tree(buf: &[u8]) -> Result<Vec<EntryBlock>> {
    let mut c = Cursor::new(buf);
    let mut entries = Vec::new();
    loop {
        let ext_wire = c.read_cstr()?;
        if ext_wire.is_empty() {
            break;
        }
        let ext = if ext_wire == " " { String::new() } else { ext_wire };
        loop {
            let path = c.read_cstr()?;
            if path.is_empty() {
                break;
            }
            loop {
                let filename = c.read_cstr()?;
                if filename.is_empty() {
                    break;
                }
                let crc32 = c.read_u32()?;
                let preload_size = c.read_u16()?;
                let pack_index = c.read_u16()?;
                let preload_bytes = c.read_bytes(preload_size as usize)?.to_vec();
                let mut fragments = Vec::new();
                loop {
                    let load_flags = c.read_u32()?;
                    let texture_flags = c.read_u16()?;
                    let pack_offset = c.read_u64()?;
                    let compressed_size = c.read_u64()?;
                    let uncompressed_size = c.read_u64()?;
                    let marker = c.read_u16()?;
                    fragments.push(ChunkDescriptor {
                        load_flags,
                        texture_flags,
                        pack_offset,
                        compressed_size,
                        uncompressed_size,
                    });
                    if marker == 0xFFFF {
                        break;
                    }
                }
                if fragments.len() == 1 && fragments[0].is_placeholder() {
                    fragments.clear();
                }
                let entry_path = join_entry_path(&ext, &path, &filename);
                entries.push(EntryBlock {
                    crc32,
                    preload_size,
                    pack_index,
                    preload_bytes,
                    fragments,
                    entry_path,
                });
            }
        }
    }
    Ok(entries)
}
