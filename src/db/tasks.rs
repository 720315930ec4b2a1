//! Task storage operations.

use super::{Database, now_ms};
use crate::broadcast::{BroadcastEvent, LocalBroadcast};
use crate::types::{Task, Transitory, has_external_id, new_uuid};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::trace;

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        title: row.get("title")?,
        priority: row.get("priority")?,
        due_date: row.get("due_date")?,
        hide_until: row.get("hide_until")?,
        creation_date: row.get("created")?,
        modification_date: row.get("modified")?,
        completion_date: row.get("completed")?,
        deletion_date: row.get("deleted")?,
        notes: row.get("notes")?,
        estimated_seconds: row.get("estimated_seconds")?,
        elapsed_seconds: row.get("elapsed_seconds")?,
        timer_start: row.get("timer_start")?,
        reminder_flags: row.get("reminder_flags")?,
        reminder_period: row.get("reminder_period")?,
        reminder_last: row.get("reminder_last")?,
        reminder_snooze: row.get("reminder_snooze")?,
        recurrence: row.get("recurrence")?,
        repeat_until: row.get("repeat_until")?,
        calendar_uri: row.get("calendar_uri")?,
        collapsed: row.get("collapsed")?,
        parent: row.get("parent")?,
        parent_uuid: row.get("parent_uuid")?,
        transitory: Transitory::default(),
    })
}

/// Local id of the task with this uuid.
pub(crate) fn find_task_id(conn: &Connection, uuid: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM tasks WHERE uuid = ?1",
            params![uuid],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Insert a new task and write its local id back into `task`.
///
/// A task without a uuid gets a fresh one; zero creation and modification
/// dates are stamped with the current time. Unless the task suppresses
/// refresh, a [`BroadcastEvent::TaskSaved`] is sent.
pub(crate) fn create_new_task(
    conn: &Connection,
    events: &LocalBroadcast,
    task: &mut Task,
) -> Result<i64> {
    if !has_external_id(Some(task.uuid.as_str())) {
        task.uuid = new_uuid();
    }
    let now = now_ms();
    if task.creation_date == 0 {
        task.creation_date = now;
    }
    if task.modification_date == 0 {
        task.modification_date = now;
    }

    conn.execute(
        "INSERT INTO tasks (
            uuid, title, priority, due_date, hide_until, created, modified, completed, deleted,
            notes, estimated_seconds, elapsed_seconds, timer_start,
            reminder_flags, reminder_period, reminder_last, reminder_snooze,
            recurrence, repeat_until, calendar_uri, collapsed, parent, parent_uuid
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17,
            ?18, ?19, ?20, ?21, ?22, ?23
        )",
        params![
            task.uuid,
            task.title,
            task.priority,
            task.due_date,
            task.hide_until,
            task.creation_date,
            task.modification_date,
            task.completion_date,
            task.deletion_date,
            task.notes,
            task.estimated_seconds,
            task.elapsed_seconds,
            task.timer_start,
            task.reminder_flags,
            task.reminder_period,
            task.reminder_last,
            task.reminder_snooze,
            task.recurrence,
            task.repeat_until,
            task.calendar_uri,
            task.collapsed,
            task.parent,
            task.parent_uuid,
        ],
    )?;
    task.id = conn.last_insert_rowid();

    if task.transitory.suppress_refresh {
        trace!(task_id = task.id, "task saved quietly");
    } else {
        events.send(BroadcastEvent::TaskSaved {
            task_id: task.id,
            request_sync: !task.transitory.suppress_sync,
        });
    }

    Ok(task.id)
}

pub(crate) fn all_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks ORDER BY id")?;
    let tasks = stmt
        .query_map([], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

impl Database {
    /// Create a task. Its local id (and uuid, if it had none) are written back.
    pub fn create_task(&self, task: &mut Task) -> Result<i64> {
        self.with_conn(|conn| create_new_task(conn, &self.events, task))
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let task = conn
                .query_row("SELECT * FROM tasks WHERE id = ?1", params![id], parse_task_row)
                .optional()?;
            Ok(task)
        })
    }

    pub fn get_task_by_uuid(&self, uuid: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    "SELECT * FROM tasks WHERE uuid = ?1",
                    params![uuid],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(all_tasks)
    }

    /// Direct children of a task.
    pub fn get_subtasks(&self, parent: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE parent = ?1 ORDER BY id")?;
            let tasks = stmt
                .query_map(params![parent], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }
}
