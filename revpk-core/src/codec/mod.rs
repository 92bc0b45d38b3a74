//! Per-chunk block codecs.
//!
//! A chunk is stored either raw, ZSTD-marker-prefixed, or (on archives this
//! tool did not write) LZHAM-encoded. We only ever *write* raw or ZSTD;
//! the LZHAM branch exists purely to detect and fail loudly on foreign
//! chunks rather than silently corrupt them.

pub mod lzham;
pub mod zstdc;

use crate::error::{CodecError, Result};

/// "PAM__1DR" read as a little-endian u64; prefixed to every ZSTD chunk.
pub const ZSTD_MARKER: u64 = 0x5244315F5F4D4150;
pub const ZSTD_MARKER_BYTES: [u8; 8] = ZSTD_MARKER.to_le_bytes();

pub const CHUNK_MAX: usize = 1_048_576;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Lzham,
    Zstd,
}

/// Compression-effort token as accepted on the CLI / in manifests.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    Fastest,
    Faster,
    Default,
    Better,
    Uber,
}

impl Level {
    pub fn parse(s: &str) -> Option<Level> {
        match s {
            "fastest" => Some(Level::Fastest),
            "faster" => Some(Level::Faster),
            "default" => Some(Level::Default),
            "better" => Some(Level::Better),
            "uber" => Some(Level::Uber),
            _ => None,
        }
    }

    /// Numeric LZHAM-style level; not used for the ZSTD path, which the
    /// packer always drives at a fixed implementation level.
    pub fn as_lzham_level(self) -> i32 {
        match self {
            Level::Fastest => 0,
            Level::Faster => 1,
            Level::Default => 2,
            Level::Better => 3,
            Level::Uber => 4,
        }
    }
}

/// The ZSTD level the packer actually drives, independent of the
/// manifest-facing `Level` token (only the literal `"zstd"` method selects
/// this path, and it always runs at this fixed level).
pub const ZSTD_IMPLEMENTATION_LEVEL: i32 = 6;

pub trait Compressor: Send + Sync {
    fn method(&self) -> Method;
    fn compress(&self, src: &[u8], level: i32) -> Result<Vec<u8>>;
    fn decompress(&self, src: &[u8]) -> Result<Vec<u8>>;
}

pub fn compressor_for(method: Method) -> &'static dyn Compressor {
    match method {
        Method::Zstd => &zstdc::ZstdCodec,
        Method::Lzham => &lzham::LzhamCodec,
    }
}

/// What codec produced a stored chunk, inferred from its size relation and
/// leading bytes. Mirrors the detection rule used by the unpacker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DetectedMethod {
    Raw,
    Zstd,
    Lzham,
}

pub fn detect(compressed_size: u64, uncompressed_size: u64, stored: &[u8]) -> DetectedMethod {
    if compressed_size == uncompressed_size {
        return DetectedMethod::Raw;
    }
    if stored.len() >= 8 && stored[..8] == ZSTD_MARKER_BYTES {
        return DetectedMethod::Zstd;
    }
    DetectedMethod::Lzham
}

/// Decompress a stored chunk given its detected method. `Raw` is handled by
/// the caller (no allocation needed); this only covers the two compressed
/// cases.
pub fn decode_stored(method: DetectedMethod, stored: &[u8]) -> Result<Vec<u8>> {
    match method {
        DetectedMethod::Raw => Ok(stored.to_vec()),
        DetectedMethod::Zstd => compressor_for(Method::Zstd).decompress(stored),
        DetectedMethod::Lzham => Err(CodecError::Unsupported("lzham").into()),
    }
}
