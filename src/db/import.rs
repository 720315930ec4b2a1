//! Backup import.
//!
//! Merges a [`BackupFile`] into the datastore without duplicating anything
//! already present:
//! - Top-level entities (tags, accounts, places, lists, filters, calendars)
//!   are inserted only when no record shares their external id
//! - A task whose uuid already exists is skipped along with all its children
//! - Children of an imported task are re-pointed at its new local id (or uuid)
//! - Parent links are resolved in a single pass once every task is in place,
//!   so children may appear before their parents in the document
//! - Preferences are replayed, except the current-version key
//! - Version-gated migrations from [`MigrationRegistry`] are applied
//!
//! The whole merge runs in one transaction. A failure rolls everything back.

use super::alarms::insert_alarm;
use super::attachments::insert_attachment;
use super::caldav::{self, insert_caldav_task};
use super::comments::create_new_comment;
use super::google::{self, insert_google_task};
use super::locations::insert_geofence;
use super::mover::migrate_local_tasks;
use super::preferences::{self, P_CURRENT_VERSION, P_THEME_COLOR};
use super::records::{Record, Upsert, insert_if_absent};
use super::tags::insert_tag;
use super::tasks::{create_new_task, find_task_id};
use super::Database;
use crate::backup::migrations::{Migration, MigrationPlan, MigrationRegistry};
use crate::backup::palette::{ColorPalette, MaterialPalette};
use crate::backup::{BackupDocument, BackupFile, TaskBackup};
use crate::broadcast::LocalBroadcast;
use crate::error::ImportError;
use crate::progress::{self, ProgressSink, read_progress_message};
use crate::types::{
    Alarm, CaldavAccount, CaldavCalendar, CaldavTask, Filter, Geofence, GoogleTask,
    GoogleTaskAccount, GoogleTaskList, NO_ID, Place, Tag, TagData, Task, has_external_id,
};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, error, info};

/// Theme colour index assumed when an old backup never set one.
pub const DEFAULT_THEME_COLOR_INDEX: i32 = 7;

/// Options for controlling import behavior.
pub struct ImportOptions {
    /// Version gates to evaluate against the document version.
    pub registry: MigrationRegistry,
    /// Resolves legacy colour indexes.
    pub palette: Box<dyn ColorPalette + Send + Sync>,
    /// Theme colour index used when the datastore has none.
    pub theme_color_default: i32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            registry: MigrationRegistry::standard(),
            palette: Box::new(MaterialPalette),
            theme_color_default: DEFAULT_THEME_COLOR_INDEX,
        }
    }
}

impl ImportOptions {
    /// Substitute the colour palette (builder pattern).
    pub fn with_palette(mut self, palette: impl ColorPalette + Send + Sync + 'static) -> Self {
        self.palette = Box::new(palette);
        self
    }

    pub fn with_theme_color_default(mut self, index: i32) -> Self {
        self.theme_color_default = index;
        self
    }
}

/// Result of an import operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    /// Task records examined.
    pub task_count: usize,
    /// Task records written.
    pub import_count: usize,
    /// Task records skipped because their uuid already existed.
    pub skip_count: usize,
    /// Top-level entities inserted per table.
    pub entities_imported: BTreeMap<String, usize>,
    /// Top-level entities left untouched per table.
    pub entities_skipped: BTreeMap<String, usize>,
    /// Migrations the document version triggered.
    pub migrations: Vec<Migration>,
}

impl ImportResult {
    fn record(&mut self, table: &str, upsert: Upsert) {
        let counter = if upsert.inserted() {
            &mut self.entities_imported
        } else {
            &mut self.entities_skipped
        };
        *counter.entry(table.to_string()).or_insert(0) += 1;
    }

    /// Total number of top-level entities inserted.
    pub fn total_entities_imported(&self) -> usize {
        self.entities_imported.values().sum()
    }

    /// Total number of top-level entities skipped.
    pub fn total_entities_skipped(&self) -> usize {
        self.entities_skipped.values().sum()
    }
}

/// Result of a dry-run import preview.
/// Shows what would happen without making any changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DryRunResult {
    /// Version declared by the document.
    pub version: i32,
    /// Task records in the document.
    pub task_count: usize,
    /// Task records that would be written.
    pub would_import: usize,
    /// Task records that would be skipped.
    pub would_skip: usize,
    /// Top-level entities that would be inserted per table.
    pub entities_would_insert: BTreeMap<String, usize>,
    /// Top-level entities that would be skipped per table.
    pub entities_would_skip: BTreeMap<String, usize>,
    /// Migrations the document version would trigger.
    pub migrations: Vec<Migration>,
}

impl DryRunResult {
    /// Total number of entities that would be inserted.
    pub fn total_would_insert(&self) -> usize {
        self.entities_would_insert.values().sum()
    }

    /// Total number of entities that would be skipped.
    pub fn total_would_skip(&self) -> usize {
        self.entities_would_skip.values().sum()
    }
}

// =============================================================================
// Merge
// =============================================================================

/// State threaded through one import run.
struct Merge<'a> {
    conn: &'a Connection,
    events: &'a LocalBroadcast,
    plan: MigrationPlan,
    options: &'a ImportOptions,
    progress: Option<&'a dyn ProgressSink>,
    result: ImportResult,
}

impl Merge<'_> {
    fn color(&self, color: i32) -> i32 {
        self.plan.color(color, self.options.palette.as_ref())
    }

    fn upsert<R: Record>(&mut self, record: &R) -> Result<Upsert> {
        let upsert = insert_if_absent(self.conn, record)?;
        if !upsert.inserted() {
            debug!(table = R::TABLE, external_id = ?record.external_id(), "already present");
        }
        self.result.record(R::TABLE, upsert);
        Ok(upsert)
    }

    fn entities(&mut self, doc: &BackupDocument) -> Result<()> {
        for tag in &doc.tags {
            let tag = TagData {
                color: tag.color.map(|c| self.color(c)),
                ..tag.clone()
            };
            self.upsert(&tag)?;
        }
        for account in &doc.google_task_accounts {
            self.upsert(account)?;
        }
        for place in &doc.places {
            self.upsert(place)?;
        }
        for list in &doc.google_task_lists {
            let list = GoogleTaskList {
                color: list.color.map(|c| self.color(c)),
                ..list.clone()
            };
            self.upsert(&list)?;
        }
        for filter in &doc.filters {
            let filter = Filter {
                color: filter.color.map(|c| self.color(c)),
                ..filter.clone()
            };
            self.upsert(&filter)?;
        }
        for account in &doc.caldav_accounts {
            self.upsert(account)?;
        }
        for calendar in &doc.caldav_calendars {
            let calendar = CaldavCalendar {
                color: self.color(calendar.color),
                ..calendar.clone()
            };
            self.upsert(&calendar)?;
        }
        Ok(())
    }

    fn tasks(&mut self, tasks: &[TaskBackup]) -> Result<()> {
        for backup in tasks {
            self.result.task_count += 1;
            let count = self.result.task_count;
            progress::post(self.progress, || read_progress_message(count));

            let uuid = backup.task.uuid.as_str();
            if has_external_id(Some(uuid)) && find_task_id(self.conn, uuid)?.is_some() {
                debug!(%uuid, "task already present");
                self.result.skip_count += 1;
                continue;
            }

            let mut task = Task {
                id: NO_ID,
                parent: 0,
                ..backup.task.clone()
            };
            task.suppress_sync();
            task.suppress_refresh();
            create_new_task(self.conn, self.events, &mut task)?;
            self.children(&task, backup)?;
            self.result.import_count += 1;
        }
        Ok(())
    }

    /// Insert the children of a freshly written task.
    fn children(&mut self, task: &Task, backup: &TaskBackup) -> Result<()> {
        let conn = self.conn;
        let task_id = task.id;
        let task_uuid = Some(task.uuid.clone());

        for alarm in &backup.alarms {
            insert_alarm(
                conn,
                &Alarm {
                    task: task_id,
                    ..alarm.clone()
                },
            )?;
        }
        for comment in &backup.comments {
            let mut comment = comment.clone();
            comment.target_id = task_uuid.clone();
            if self.plan.applies(Migration::CommentPictureUris) {
                comment.convert_picture_uri();
            }
            create_new_comment(conn, &mut comment)?;
        }
        for link in &backup.google {
            insert_google_task(
                conn,
                &GoogleTask {
                    task: task_id,
                    parent: 0,
                    ..link.clone()
                },
            )?;
        }
        for location in &backup.locations {
            let place = Place {
                name: location.name.clone(),
                address: location.address.clone(),
                phone: location.phone.clone(),
                url: location.url.clone(),
                latitude: location.latitude,
                longitude: location.longitude,
                ..Place::new_place()
            };
            let place_id = place.insert(conn)?;
            self.result.record(Place::TABLE, Upsert::Inserted(place_id));
            insert_geofence(
                conn,
                &Geofence {
                    task: task_id,
                    place: place.uid.clone(),
                    radius: location.radius,
                    arrival: location.arrival,
                    departure: location.departure,
                    ..Geofence::default()
                },
            )?;
        }
        for tag in &backup.tags {
            insert_tag(
                conn,
                &Tag {
                    task: task_id,
                    task_uid: task_uuid.clone(),
                    ..tag.clone()
                },
            )?;
        }
        for geofence in &backup.geofences {
            insert_geofence(
                conn,
                &Geofence {
                    task: task_id,
                    ..geofence.clone()
                },
            )?;
        }
        for attachment in &backup.attachments {
            let mut attachment = attachment.clone();
            attachment.task_id = task_uuid.clone();
            if self.plan.applies(Migration::AttachmentPathUris) {
                attachment.convert_path_uri();
            }
            insert_attachment(conn, &attachment)?;
        }
        for link in &backup.caldav_tasks {
            insert_caldav_task(
                conn,
                &CaldavTask {
                    task: task_id,
                    ..link.clone()
                },
            )?;
        }
        Ok(())
    }

    fn preferences(&self, doc: &BackupDocument) -> Result<()> {
        for (key, value) in &doc.int_prefs {
            if key == P_CURRENT_VERSION {
                continue;
            }
            preferences::set_int(self.conn, key, *value)?;
        }
        for (key, value) in &doc.long_prefs {
            preferences::set_long(self.conn, key, *value)?;
        }
        for (key, value) in &doc.string_prefs {
            preferences::set_string(self.conn, key, value)?;
        }
        for (key, value) in &doc.bool_prefs {
            preferences::set_bool(self.conn, key, *value)?;
        }
        Ok(())
    }

    fn after_import(&mut self) -> Result<()> {
        let steps: Vec<Migration> = self.plan.post_import().collect();
        for step in steps {
            match step {
                Migration::ThemeColorPreference => {
                    let index = preferences::get_int(self.conn, P_THEME_COLOR)?
                        .unwrap_or(self.options.theme_color_default);
                    let color = self.options.palette.android_color(index);
                    preferences::set_int(self.conn, P_THEME_COLOR, color)?;
                    debug!(index, color, "translated theme colour");
                }
                Migration::MigrateLocalTasks => {
                    migrate_local_tasks(self.conn)?;
                }
                other => debug!(migration = %other, "no after-import step"),
            }
        }
        Ok(())
    }

    fn run(mut self, doc: &BackupDocument) -> Result<ImportResult> {
        self.entities(doc)?;
        self.tasks(&doc.tasks)?;
        google::update_parents(self.conn)?;
        caldav::update_parents(self.conn)?;
        self.preferences(doc)?;
        self.after_import()?;
        self.result.migrations = self.plan.migrations().to_vec();
        Ok(self.result)
    }
}

// =============================================================================
// Preview
// =============================================================================

/// Count inserts and skips for one entity collection, honouring duplicates
/// within the document itself.
fn preview_records<R: Record>(
    conn: &Connection,
    records: &[R],
    result: &mut DryRunResult,
) -> Result<()> {
    let mut seen: HashSet<String> = HashSet::new();
    let (mut insert, mut skip) = (0, 0);
    for record in records {
        match record.external_id().filter(|id| has_external_id(Some(*id))) {
            Some(id) if seen.contains(id) || R::find_by_external_id(conn, id)?.is_some() => {
                skip += 1
            }
            Some(id) => {
                seen.insert(id.to_string());
                insert += 1;
            }
            None => insert += 1,
        }
    }
    result.entities_would_insert.insert(R::TABLE.to_string(), insert);
    if skip > 0 {
        result.entities_would_skip.insert(R::TABLE.to_string(), skip);
    }
    Ok(())
}

fn preview_document(
    conn: &Connection,
    backup: &BackupFile,
    registry: &MigrationRegistry,
) -> Result<DryRunResult> {
    let doc = &backup.data;
    let mut result = DryRunResult {
        version: backup.version,
        task_count: doc.tasks.len(),
        migrations: registry.plan(backup.version).migrations().to_vec(),
        ..DryRunResult::default()
    };

    preview_records::<TagData>(conn, &doc.tags, &mut result)?;
    preview_records::<GoogleTaskAccount>(conn, &doc.google_task_accounts, &mut result)?;
    preview_records::<Place>(conn, &doc.places, &mut result)?;
    preview_records::<GoogleTaskList>(conn, &doc.google_task_lists, &mut result)?;
    preview_records::<Filter>(conn, &doc.filters, &mut result)?;
    preview_records::<CaldavAccount>(conn, &doc.caldav_accounts, &mut result)?;
    preview_records::<CaldavCalendar>(conn, &doc.caldav_calendars, &mut result)?;

    let mut seen: HashSet<&str> = HashSet::new();
    for backup in &doc.tasks {
        let uuid = backup.task.uuid.as_str();
        let exists = has_external_id(Some(uuid))
            && (!seen.insert(uuid) || find_task_id(conn, uuid)?.is_some());
        if exists {
            result.would_skip += 1;
        } else {
            result.would_import += 1;
        }
    }
    Ok(result)
}

impl Database {
    /// Merge a parsed backup into the datastore.
    ///
    /// `progress` receives a status line per task record examined. A
    /// [`BroadcastEvent::Refresh`](crate::broadcast::BroadcastEvent::Refresh)
    /// is sent when the call finishes, whether or not it succeeded.
    pub fn import_backup(
        &self,
        backup: &BackupFile,
        options: &ImportOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ImportResult, ImportError> {
        let plan = options.registry.plan(backup.version);
        info!(
            version = backup.version,
            tasks = backup.data.tasks.len(),
            migrations = ?plan.migrations(),
            "importing backup"
        );

        let outcome = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let result = Merge {
                conn: &tx,
                events: &self.events,
                plan,
                options,
                progress,
                result: ImportResult::default(),
            }
            .run(&backup.data)?;
            tx.commit()?;
            Ok(result)
        });
        self.events.broadcast_refresh();

        match outcome {
            Ok(result) => {
                info!(
                    task_count = result.task_count,
                    import_count = result.import_count,
                    skip_count = result.skip_count,
                    entities_imported = result.total_entities_imported(),
                    entities_skipped = result.total_entities_skipped(),
                    "import finished"
                );
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "import failed, rolled back");
                Err(ImportError::Storage(e))
            }
        }
    }

    /// Read a backup file and merge it.
    pub fn import_file(
        &self,
        path: &Path,
        options: &ImportOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<ImportResult, ImportError> {
        let backup = BackupFile::from_file(path).inspect_err(|e| {
            error!(path = %path.display(), kind = e.kind(), error = %e, "cannot read backup");
        })?;
        self.import_backup(&backup, options, progress)
    }

    /// Preview what an import would do without making any changes.
    pub fn preview_import(
        &self,
        backup: &BackupFile,
        registry: &MigrationRegistry,
    ) -> Result<DryRunResult> {
        self.with_conn(|conn| preview_document(conn, backup, registry))
    }
}
