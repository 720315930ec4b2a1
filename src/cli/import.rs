//! Import and preview subcommands.

use clap::Args;
use std::path::PathBuf;

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file to import (JSON, optionally gzip-compressed)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Report what would be imported without modifying the database
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress per-task progress lines
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the preview subcommand
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Backup file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl From<PreviewArgs> for ImportArgs {
    fn from(args: PreviewArgs) -> Self {
        Self {
            file: args.file,
            dry_run: true,
            quiet: true,
        }
    }
}
