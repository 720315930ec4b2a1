//! CLI command definitions for tasks-backup
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod export;
pub mod import;

use clap::{Parser, Subcommand};
use export::ExportArgs;
use import::{ImportArgs, PreviewArgs};

/// Import and export task backups
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge a backup file into the database
    Import(ImportArgs),

    /// Write the database to a backup file
    Export(ExportArgs),

    /// Show what importing a backup would do, without changing anything
    Preview(PreviewArgs),
}
