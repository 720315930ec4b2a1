//! Backup document model.
//!
//! A backup file is a JSON envelope `{ "version": .., "timestamp": .., "data": .. }`
//! where `version` is the app version code that wrote it and `data` holds
//! every entity collection plus the typed preference maps. Files may be
//! gzip-compressed; the reader sniffs the magic bytes.

pub mod legacy;
pub mod migrations;
pub mod palette;

use crate::error::ImportError;
use crate::types::{
    Alarm, CaldavAccount, CaldavCalendar, CaldavTask, Filter, Geofence, GoogleTask,
    GoogleTaskAccount, GoogleTaskList, LegacyLocation, Place, Tag, TagData, Task, TaskAttachment,
    UserActivity,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Version code written into new backups.
pub const CURRENT_VERSION: i32 = migrations::V9_7;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// On-disk envelope around a [`BackupDocument`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFile {
    /// Version code of the app that wrote the backup.
    pub version: i32,

    /// Milliseconds since the epoch when the backup was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    pub data: BackupDocument,
}

/// Every collection carried by a backup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupDocument {
    pub tasks: Vec<TaskBackup>,
    pub places: Vec<Place>,
    pub tags: Vec<TagData>,
    pub filters: Vec<Filter>,
    pub google_task_accounts: Vec<GoogleTaskAccount>,
    pub google_task_lists: Vec<GoogleTaskList>,
    pub caldav_accounts: Vec<CaldavAccount>,
    pub caldav_calendars: Vec<CaldavCalendar>,
    pub int_prefs: BTreeMap<String, i32>,
    pub long_prefs: BTreeMap<String, i64>,
    pub string_prefs: BTreeMap<String, String>,
    pub bool_prefs: BTreeMap<String, bool>,
}

/// A task and everything that hangs off it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskBackup {
    pub task: Task,
    pub alarms: Vec<Alarm>,
    pub comments: Vec<UserActivity>,
    pub google: Vec<GoogleTask>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<LegacyLocation>,
    pub tags: Vec<Tag>,
    pub geofences: Vec<Geofence>,
    pub attachments: Vec<TaskAttachment>,
    pub caldav_tasks: Vec<CaldavTask>,
}

impl TaskBackup {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            ..Self::default()
        }
    }
}

impl BackupFile {
    /// Wrap a document at the current version, stamped now.
    pub fn new(data: BackupDocument) -> Self {
        Self {
            version: CURRENT_VERSION,
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
            data,
        }
    }

    /// Parse a backup from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a backup from a file, plain JSON or gzip.
    ///
    /// The file handle is dropped on every return path.
    pub fn from_file(path: &Path) -> Result<Self, ImportError> {
        let file = File::open(path).map_err(|source| ImportError::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let gzipped = reader
            .fill_buf()
            .map_err(|source| ImportError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .starts_with(&GZIP_MAGIC);

        let parsed = if gzipped {
            let decoder = flate2::read::GzDecoder::new(reader);
            serde_json::from_reader(BufReader::new(decoder))
        } else {
            serde_json::from_reader(reader)
        };
        parsed.map_err(|err| {
            if err.is_io() {
                ImportError::Read {
                    path: path.to_path_buf(),
                    source: err.into(),
                }
            } else {
                ImportError::MalformedDocument(err)
            }
        })
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the backup, gzip-compressed when the path ends in `.gz`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create backup file {}", path.display()))?;
        let writer = BufWriter::new(file);

        if path.extension().is_some_and(|ext| ext == "gz") {
            let mut encoder = flate2::write::GzEncoder::new(writer, flate2::Compression::default());
            serde_json::to_writer_pretty(&mut encoder, self)?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        Ok(())
    }
}
