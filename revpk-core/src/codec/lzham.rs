use super::Method;
use crate::codec::Compressor;
use crate::error::{CodecError, Result};

/// No maintained LZHAM binding exists in the crates ecosystem this
/// workspace can draw on. This impl exists so the codec dispatch table and
/// the decode-detection path (`detect`) remain honest about the three
/// methods the format distinguishes, and so that encountering an LZHAM
/// chunk on a foreign archive fails loudly instead of being silently
/// misread as raw or ZSTD.
pub struct LzhamCodec;

impl Compressor for LzhamCodec {
    fn method(&self) -> Method {
        Method::Lzham
    }

    fn compress(&self, _src: &[u8], _level: i32) -> Result<Vec<u8>> {
        Err(CodecError::Unsupported("lzham").into())
    }

    fn decompress(&self, _src: &[u8]) -> Result<Vec<u8>> {
        Err(CodecError::Unsupported("lzham").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_fails() {
        assert!(LzhamCodec.compress(b"x", 0).is_err());
        assert!(LzhamCodec.decompress(b"x").is_err());
    }
}
