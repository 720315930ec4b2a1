//! Core record types shared by the datastore and the backup document.
//!
//! Field names serialize in camelCase, matching the JSON written by the
//! mobile app's exporter. Every field has a default so older backups that
//! predate a column still deserialize.

use serde::{Deserialize, Serialize};

/// Placeholder for "no uuid assigned yet".
pub const NO_UUID: &str = "0";

/// Local id of a record that has not been persisted.
pub const NO_ID: i64 = 0;

/// Default sort position for lists, places and filters.
pub const NO_ORDER: i32 = -1;

/// Task priority used when a backup carries none.
pub const PRIORITY_NONE: i32 = 3;

/// Returns `true` when an external id is present and not the placeholder.
pub fn has_external_id(id: Option<&str>) -> bool {
    matches!(id, Some(s) if !s.is_empty() && s != NO_UUID)
}

/// Generate a fresh external id.
pub fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Tasks
// =============================================================================

/// Transitory flags carried on an in-memory task and never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transitory {
    pub suppress_sync: bool,
    pub suppress_refresh: bool,
}

/// A to-do item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    /// Local ids do not travel between datastores.
    #[serde(skip)]
    pub id: i64,
    /// External id, stable across export/import.
    #[serde(rename = "remoteId")]
    pub uuid: String,
    pub title: Option<String>,
    pub priority: i32,
    pub due_date: i64,
    pub hide_until: i64,
    pub creation_date: i64,
    pub modification_date: i64,
    pub completion_date: i64,
    pub deletion_date: i64,
    pub notes: Option<String>,
    pub estimated_seconds: i32,
    pub elapsed_seconds: i32,
    pub timer_start: i64,
    pub reminder_flags: i32,
    pub reminder_period: i64,
    pub reminder_last: i64,
    pub reminder_snooze: i64,
    pub recurrence: Option<String>,
    pub repeat_until: i64,
    #[serde(rename = "calendarURI")]
    pub calendar_uri: Option<String>,
    #[serde(rename = "isCollapsed")]
    pub collapsed: bool,
    #[serde(skip)]
    pub parent: i64,
    pub parent_uuid: Option<String>,
    #[serde(skip)]
    pub transitory: Transitory,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: NO_ID,
            uuid: NO_UUID.to_string(),
            title: None,
            priority: PRIORITY_NONE,
            due_date: 0,
            hide_until: 0,
            creation_date: 0,
            modification_date: 0,
            completion_date: 0,
            deletion_date: 0,
            notes: None,
            estimated_seconds: 0,
            elapsed_seconds: 0,
            timer_start: 0,
            reminder_flags: 0,
            reminder_period: 0,
            reminder_last: 0,
            reminder_snooze: 0,
            recurrence: None,
            repeat_until: 0,
            calendar_uri: None,
            collapsed: false,
            parent: 0,
            parent_uuid: None,
            transitory: Transitory::default(),
        }
    }
}

impl Task {
    /// Keep this save from queueing a remote sync.
    pub fn suppress_sync(&mut self) {
        self.transitory.suppress_sync = true;
    }

    /// Keep this save from notifying the rest of the app.
    pub fn suppress_refresh(&mut self) {
        self.transitory.suppress_refresh = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.deletion_date > 0
    }
}

/// A reminder at a fixed time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Alarm {
    pub id: i64,
    pub task: i64,
    pub time: i64,
}

/// A comment on a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserActivity {
    pub id: i64,
    pub remote_id: Option<String>,
    pub message: Option<String>,
    pub picture: Option<String>,
    /// Uuid of the task this comment belongs to.
    pub target_id: Option<String>,
    #[serde(alias = "created")]
    pub created_at: i64,
}

/// A file attached to a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskAttachment {
    pub id: i64,
    pub remote_id: Option<String>,
    /// Uuid of the owning task.
    pub task_id: Option<String>,
    pub name: Option<String>,
    pub uri: Option<String>,
    /// Filesystem path written by old versions; replaced by `uri`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub content_type: Option<String>,
}

// =============================================================================
// Tags
// =============================================================================

/// A tag definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagData {
    pub id: i64,
    pub remote_id: Option<String>,
    pub name: Option<String>,
    pub color: Option<i32>,
    pub tag_ordering: Option<String>,
    pub icon: Option<i32>,
    pub order: i32,
}

/// Assignment of a tag to a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    pub id: i64,
    pub task: i64,
    pub name: Option<String>,
    pub tag_uid: Option<String>,
    pub task_uid: Option<String>,
}

// =============================================================================
// Locations
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Place {
    pub id: i64,
    pub uid: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub color: i32,
    pub icon: i32,
    pub order: i32,
}

impl Default for Place {
    fn default() -> Self {
        Self {
            id: NO_ID,
            uid: None,
            name: None,
            address: None,
            phone: None,
            url: None,
            latitude: 0.0,
            longitude: 0.0,
            color: 0,
            icon: -1,
            order: NO_ORDER,
        }
    }
}

impl Place {
    /// A place with a freshly generated uid.
    pub fn new_place() -> Self {
        Self {
            uid: Some(new_uuid()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Geofence {
    pub id: i64,
    pub task: i64,
    /// Uid of the place.
    pub place: Option<String>,
    pub radius: i32,
    #[serde(alias = "isArrival")]
    pub arrival: bool,
    #[serde(alias = "isDeparture")]
    pub departure: bool,
}

/// Location record from backups that predate places and geofences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyLocation {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: i32,
    pub arrival: bool,
    pub departure: bool,
}

// =============================================================================
// Filters
// =============================================================================

/// A saved custom filter. Filters carry no uuid; the title is their key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filter {
    pub id: i64,
    pub title: Option<String>,
    pub sql: Option<String>,
    pub values: Option<String>,
    pub criterion: Option<String>,
    pub color: Option<i32>,
    pub icon: Option<i32>,
    pub order: i32,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            id: NO_ID,
            title: None,
            sql: None,
            values: None,
            criterion: None,
            color: Some(0),
            icon: Some(-1),
            order: NO_ORDER,
        }
    }
}

// =============================================================================
// Google Tasks
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleTaskAccount {
    pub id: i64,
    pub account: Option<String>,
    #[serde(skip_serializing)]
    pub error: Option<String>,
    pub etag: Option<String>,
    #[serde(rename = "isCollapsed")]
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleTaskList {
    pub id: i64,
    pub account: Option<String>,
    pub remote_id: Option<String>,
    pub title: Option<String>,
    pub remote_order: i32,
    pub last_sync: i64,
    pub color: Option<i32>,
    pub icon: Option<i32>,
    pub order: i32,
}

impl Default for GoogleTaskList {
    fn default() -> Self {
        Self {
            id: NO_ID,
            account: None,
            remote_id: None,
            title: None,
            remote_order: 0,
            last_sync: 0,
            color: None,
            icon: None,
            order: NO_ORDER,
        }
    }
}

/// Link between a local task and a Google Tasks item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleTask {
    pub id: i64,
    pub task: i64,
    pub remote_id: Option<String>,
    pub list_id: Option<String>,
    /// Local id of the parent task, resolved after import.
    #[serde(skip)]
    pub parent: i64,
    pub remote_parent: Option<String>,
    #[serde(rename = "isMoved")]
    pub moved: bool,
    pub order: i64,
    pub remote_order: i64,
    pub last_sync: i64,
    pub deleted: i64,
}

// =============================================================================
// CalDAV
// =============================================================================

pub const CALDAV_ACCOUNT_TYPE_CALDAV: i32 = 0;
pub const CALDAV_ACCOUNT_TYPE_ETESYNC: i32 = 1;
pub const CALDAV_ACCOUNT_TYPE_LOCAL: i32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaldavAccount {
    pub id: i64,
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    // Credentials and sync state stay on the device.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub error: Option<String>,
    #[serde(rename = "isSuppressRepeatingTasks")]
    pub suppress_repeating: bool,
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
    pub account_type: i32,
    #[serde(rename = "isCollapsed")]
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaldavCalendar {
    pub id: i64,
    /// Uuid of the owning account.
    pub account: Option<String>,
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub color: i32,
    pub ctag: Option<String>,
    pub url: Option<String>,
    pub icon: Option<i32>,
    pub order: i32,
}

impl Default for CaldavCalendar {
    fn default() -> Self {
        Self {
            id: NO_ID,
            account: None,
            uuid: None,
            name: None,
            color: 0,
            ctag: None,
            url: None,
            icon: Some(-1),
            order: NO_ORDER,
        }
    }
}

/// Link between a local task and a CalDAV object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaldavTask {
    pub id: i64,
    pub task: i64,
    /// Uuid of the calendar.
    pub calendar: Option<String>,
    pub object: Option<String>,
    pub remote_id: Option<String>,
    pub etag: Option<String>,
    pub last_sync: i64,
    pub deleted: i64,
    pub remote_parent: Option<String>,
    pub order: Option<i64>,
}
