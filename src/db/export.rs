//! Backup export.
//!
//! Serializes the whole datastore into a [`BackupFile`] at the current
//! version. Every collection is read with deterministic ordering so two
//! exports of the same data are identical apart from the timestamp.

use super::Database;
use super::alarms::alarms_for_task;
use super::attachments::attachments_for_task;
use super::caldav::{caldav_tasks_for_task, parse_caldav_account_row, parse_caldav_calendar_row};
use super::comments::comments_for_task;
use super::filters::parse_filter_row;
use super::google::{google_tasks_for_task, parse_google_account_row, parse_google_list_row};
use super::locations::{geofences_for_task, parse_place_row};
use super::preferences::all_preferences;
use super::tags::{parse_tag_data_row, tags_for_task};
use super::tasks::all_tasks;
use crate::backup::{BackupDocument, BackupFile, TaskBackup};
use anyhow::Result;
use rusqlite::{Connection, Row};
use tracing::info;

fn select_all<T>(
    conn: &Connection,
    table: &str,
    parse: fn(&Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY id", table))?;
    let rows = stmt
        .query_map([], parse)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn export_document(conn: &Connection) -> Result<BackupDocument> {
    let mut tasks = Vec::new();
    for task in all_tasks(conn)? {
        let id = task.id;
        let uuid = task.uuid.clone();
        tasks.push(TaskBackup {
            alarms: alarms_for_task(conn, id)?,
            comments: comments_for_task(conn, &uuid)?,
            google: google_tasks_for_task(conn, id)?,
            locations: Vec::new(),
            tags: tags_for_task(conn, id)?,
            geofences: geofences_for_task(conn, id)?,
            attachments: attachments_for_task(conn, &uuid)?,
            caldav_tasks: caldav_tasks_for_task(conn, id)?,
            task,
        });
    }

    let prefs = all_preferences(conn)?;

    Ok(BackupDocument {
        tasks,
        places: select_all(conn, "places", parse_place_row)?,
        tags: select_all(conn, "tag_data", parse_tag_data_row)?,
        filters: select_all(conn, "filters", parse_filter_row)?,
        google_task_accounts: select_all(conn, "google_task_accounts", parse_google_account_row)?,
        google_task_lists: select_all(conn, "google_task_lists", parse_google_list_row)?,
        caldav_accounts: select_all(conn, "caldav_accounts", parse_caldav_account_row)?,
        caldav_calendars: select_all(conn, "caldav_lists", parse_caldav_calendar_row)?,
        int_prefs: prefs.ints,
        long_prefs: prefs.longs,
        string_prefs: prefs.strings,
        bool_prefs: prefs.bools,
    })
}

impl Database {
    /// Snapshot the datastore as a backup at the current version.
    pub fn export_backup(&self) -> Result<BackupFile> {
        let data = self.with_conn(export_document)?;
        info!(
            tasks = data.tasks.len(),
            tags = data.tags.len(),
            places = data.places.len(),
            "exported backup"
        );
        Ok(BackupFile::new(data))
    }
}
