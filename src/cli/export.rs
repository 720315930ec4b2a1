//! Export subcommand for tasks-backup
//!
//! Writes every task, entity and preference to a backup file that the
//! import subcommand (or the mobile app) can read back.

use clap::Args;
use std::path::PathBuf;

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path (default: stdout). A `.gz` extension compresses.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

impl ExportArgs {
    /// Check if this is a gzipped file based on extension
    pub fn is_gzipped(&self) -> bool {
        self.file
            .as_ref()
            .is_some_and(|f| f.extension().is_some_and(|ext| ext == "gz"))
    }
}
