use super::{Method, ZSTD_MARKER_BYTES};
use crate::codec::Compressor;
use crate::error::{CodecError, Result};
use std::io::Write;

pub struct ZstdCodec;

impl Compressor for ZstdCodec {
    fn method(&self) -> Method {
        Method::Zstd
    }

    fn compress(&self, src: &[u8], level: i32) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(ZSTD_MARKER_BYTES.len() + src.len() / 2);
        out.extend_from_slice(&ZSTD_MARKER_BYTES);
        let mut enc = zstd::stream::Encoder::new(&mut out, level.max(1))
            .map_err(|e| CodecError::Failed(e.to_string()))?;
        enc.write_all(src)
            .map_err(|e| CodecError::Failed(e.to_string()))?;
        enc.finish().map_err(|e| CodecError::Failed(e.to_string()))?;
        Ok(out)
    }

    fn decompress(&self, src: &[u8]) -> Result<Vec<u8>> {
        if src.len() < 8 || src[..8] != ZSTD_MARKER_BYTES {
            return Err(CodecError::Failed("missing zstd marker".into()).into());
        }
        let mut dec = zstd::stream::Decoder::new(&src[8..])
            .map_err(|e| CodecError::Failed(e.to_string()))?;
        let mut out = Vec::new();
        std::io::copy(&mut dec, &mut out).map_err(|e| CodecError::Failed(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_and_carries_marker() {
        let src = b"hello hello hello hello hello hello".repeat(100);
        let packed = ZstdCodec.compress(&src, 6).unwrap();
        assert_eq!(&packed[..8], &ZSTD_MARKER_BYTES);
        let back = ZstdCodec.decompress(&packed).unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn decompress_rejects_missing_marker() {
        assert!(ZstdCodec.decompress(b"not zstd").is_err());
    }
}
