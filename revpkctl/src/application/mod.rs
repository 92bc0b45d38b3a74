pub mod handlers;

use crate::presentation::cli::{num_threads_opt, Cli, Commands};
use clap::Parser;
use revpk_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Pack {
            locale,
            context,
            level,
            workspace,
            build_path,
            num_threads,
        } => handlers::handle_pack(
            locale,
            context,
            level,
            workspace,
            build_path,
            num_threads_opt(num_threads),
        ),
        Commands::Unpack {
            dir_file,
            out_path,
            sanitize,
        } => handlers::handle_unpack(dir_file, out_path, sanitize),
        Commands::Packmulti {
            context,
            level,
            workspace,
            build_path,
            num_threads,
        } => handlers::handle_packmulti(
            context,
            level,
            workspace,
            build_path,
            num_threads_opt(num_threads),
        ),
        Commands::Unpackmulti {
            any_dir_file,
            out_path,
            sanitize,
        } => handlers::handle_unpackmulti(any_dir_file, out_path, sanitize),
        Commands::Packdeltacommon {
            context,
            workspace,
            build_path,
            num_threads,
            level,
        } => handlers::handle_packdeltacommon(
            context,
            workspace,
            build_path,
            num_threads_opt(num_threads),
            level,
        ),
        Commands::Ls { dir_file } => handlers::handle_ls(dir_file),
    }
}
