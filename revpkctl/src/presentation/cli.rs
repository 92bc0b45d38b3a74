use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "revpkctl: chunked VPK-style archiver", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack one locale's content tree into a directory + data file.
    Pack {
        locale: String,
        context: String,
        level: String,
        #[arg(long, default_value = "ship")]
        workspace: PathBuf,
        #[arg(long, default_value = "vpk")]
        build_path: PathBuf,
        #[arg(long, default_value_t = -1)]
        num_threads: i64,
    },

    /// Unpack a directory file's entries into a content tree.
    Unpack {
        dir_file: PathBuf,
        #[arg(long, default_value = "ship")]
        out_path: PathBuf,
        #[arg(long, default_value_t = false)]
        sanitize: bool,
    },

    /// Pack every known locale into a shared, deduplicated data file.
    Packmulti {
        context: String,
        level: String,
        #[arg(long, default_value = "ship")]
        workspace: PathBuf,
        #[arg(long, default_value = "vpk")]
        build_path: PathBuf,
        #[arg(long, default_value_t = -1)]
        num_threads: i64,
    },

    /// Unpack a multi-locale archive with English-fallback differencing.
    Unpackmulti {
        any_dir_file: PathBuf,
        #[arg(long, default_value = "ship")]
        out_path: PathBuf,
        #[arg(long, default_value_t = false)]
        sanitize: bool,
    },

    /// Batch-pack per-map manifests into shared client/server data files.
    Packdeltacommon {
        context: String,
        #[arg(long, default_value = "ship")]
        workspace: PathBuf,
        #[arg(long, default_value = "vpk")]
        build_path: PathBuf,
        #[arg(long, default_value_t = -1)]
        num_threads: i64,
        #[arg(long, default_value = "uber")]
        level: String,
    },

    /// Enumerate a directory file's entries with reconstructed sizes.
    Ls { dir_file: PathBuf },
}

pub fn num_threads_opt(n: i64) -> Option<usize> {
    if n <= 0 { None } else { Some(n as usize) }
}
