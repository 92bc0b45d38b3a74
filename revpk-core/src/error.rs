use std::path::PathBuf;
use thiserror::Error;

/// A single codec's compress/decompress call failed or isn't implemented.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("codec {0} is recognized but not implemented in this build")]
    Unsupported(&'static str),
    #[error("codec failure: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum RevpkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad directory header: {0}")]
    BadHeader(String),

    #[error("truncated directory stream: {0}")]
    Truncated(String),

    #[error("missing source file: {0}")]
    MissingSource(PathBuf),

    #[error("empty source file: {0}")]
    EmptySource(PathBuf),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("manifest parse error: {0}")]
    ManifestParse(String),
}

pub type Result<T> = std::result::Result<T, RevpkError>;
