use std::io::{Result, Write};

/// Forwards written bytes to `inner` while folding them into a running
/// CRC-32 (zlib polynomial), so a file's entry-block checksum can be
/// computed in the same pass as a streaming copy.
pub struct CrcForward<'a, W: Write> {
    inner: W,
    hasher: &'a mut crc32fast::Hasher,
    pub counted: u64,
}

impl<'a, W: Write> CrcForward<'a, W> {
    pub fn new(inner: W, hasher: &'a mut crc32fast::Hasher) -> Self {
        Self {
            inner,
            hasher,
            counted: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<'a, W: Write> Write for CrcForward<'a, W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.hasher.update(buf);
        self.counted += buf.len() as u64;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_and_hashes() {
        let mut out = Vec::new();
        let mut hasher = crc32fast::Hasher::new();
        {
            let mut fwd = CrcForward::new(&mut out, &mut hasher);
            fwd.write_all(b"hello").unwrap();
            assert_eq!(fwd.counted, 5);
        }
        assert_eq!(out, b"hello");
        assert_eq!(hasher.finalize(), crc32fast::hash(b"hello"));
    }
}
