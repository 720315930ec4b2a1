//! tasks-backup command-line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tasks_backup::backup::BackupFile;
use tasks_backup::backup::migrations::MigrationRegistry;
use tasks_backup::cli::export::ExportArgs;
use tasks_backup::cli::import::ImportArgs;
use tasks_backup::cli::{Cli, Command};
use tasks_backup::config::Config;
use tasks_backup::db::Database;
use tasks_backup::db::import::{DryRunResult, ImportOptions, ImportResult};
use tasks_backup::logging;
use tasks_backup::progress::ProgressSink;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log, cli.verbose)?;

    let mut config = Config::resolve(cli.config.as_deref().map(Path::new))?;
    if let Some(db_path) = &cli.database {
        config.storage.db_path = db_path.into();
    }
    debug!(?config, "resolved configuration");

    match cli.command {
        Command::Import(args) => run_import(&config, args).await,
        Command::Preview(args) => run_import(&config, args.into()).await,
        Command::Export(args) => run_export(&config, args),
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let path = &config.storage.db_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!("Database: {:?}", path);
    Database::open(path)
}

async fn run_import(config: &Config, args: ImportArgs) -> Result<()> {
    let db = open_database(config)?;

    if args.dry_run {
        let backup = BackupFile::from_file(&args.file)?;
        let result = db.preview_import(&backup, &MigrationRegistry::standard())?;
        print_preview(&result);
        return Ok(());
    }

    let options = ImportOptions::default().with_theme_color_default(config.import.theme_color_default);
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let printer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            eprintln!("{}", message);
        }
    });

    let path = args.file.clone();
    let quiet = args.quiet;
    let result = tokio::task::spawn_blocking(move || {
        let sink: Option<&dyn ProgressSink> = if quiet { None } else { Some(&tx) };
        db.import_file(&path, &options, sink)
    })
    .await??;

    printer.await?;
    print_result(&result);
    Ok(())
}

fn run_export(config: &Config, args: ExportArgs) -> Result<()> {
    let db = open_database(config)?;
    let backup = db.export_backup()?;

    match &args.file {
        Some(path) => {
            backup.write_to(path)?;
            eprintln!(
                "Exported {} tasks to {}{}",
                backup.data.tasks.len(),
                path.display(),
                if args.is_gzipped() { " (gzip)" } else { "" }
            );
        }
        None => println!("{}", backup.to_json_pretty()?),
    }
    Ok(())
}

fn print_result(result: &ImportResult) {
    println!("Import complete:");
    println!("  Tasks read: {}", result.task_count);
    println!("  Imported: {}", result.import_count);
    println!("  Skipped: {}", result.skip_count);
    if !result.entities_imported.is_empty() {
        println!("  Entities imported:");
        for (table, count) in &result.entities_imported {
            println!("    {}: {}", table, count);
        }
    }
    if !result.entities_skipped.is_empty() {
        println!("  Entities skipped:");
        for (table, count) in &result.entities_skipped {
            println!("    {}: {}", table, count);
        }
    }
    for migration in &result.migrations {
        println!("  Migrated: {}", migration);
    }
}

fn print_preview(result: &DryRunResult) {
    println!("Dry run results:");
    println!("  Backup version: {}", result.version);
    println!("  Tasks: {}", result.task_count);
    println!("  Would import: {}", result.would_import);
    println!("  Would skip: {}", result.would_skip);
    println!("  Would insert:");
    for (table, count) in &result.entities_would_insert {
        println!("    {}: {}", table, count);
    }
    if !result.entities_would_skip.is_empty() {
        println!("  Would skip:");
        for (table, count) in &result.entities_would_skip {
            println!("    {}: {}", table, count);
        }
    }
    for migration in &result.migrations {
        println!("  Would migrate: {}", migration);
    }
}
