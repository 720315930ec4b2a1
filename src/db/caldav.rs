//! CalDAV accounts, calendars and task links.

use super::Database;
use super::records::{Record, find_id};
use crate::types::{CALDAV_ACCOUNT_TYPE_LOCAL, CaldavAccount, CaldavCalendar, CaldavTask};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_caldav_account_row(row: &Row) -> rusqlite::Result<CaldavAccount> {
    Ok(CaldavAccount {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        url: row.get("url")?,
        username: row.get("username")?,
        password: row.get("password")?,
        error: row.get("error")?,
        suppress_repeating: row.get("suppress_repeating")?,
        encryption_key: row.get("encryption_key")?,
        account_type: row.get("account_type")?,
        collapsed: row.get("collapsed")?,
    })
}

pub fn parse_caldav_calendar_row(row: &Row) -> rusqlite::Result<CaldavCalendar> {
    Ok(CaldavCalendar {
        id: row.get("id")?,
        account: row.get("account")?,
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        color: row.get("color")?,
        ctag: row.get("ctag")?,
        url: row.get("url")?,
        icon: row.get("icon")?,
        order: row.get("sort_order")?,
    })
}

pub fn parse_caldav_task_row(row: &Row) -> rusqlite::Result<CaldavTask> {
    Ok(CaldavTask {
        id: row.get("id")?,
        task: row.get("task")?,
        calendar: row.get("calendar")?,
        object: row.get("object")?,
        remote_id: row.get("remote_id")?,
        etag: row.get("etag")?,
        last_sync: row.get("last_sync")?,
        deleted: row.get("deleted")?,
        remote_parent: row.get("remote_parent")?,
        order: row.get("sort_order")?,
    })
}

impl Record for CaldavAccount {
    const TABLE: &'static str = "caldav_accounts";

    fn external_id(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    fn find_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
        find_id(
            conn,
            "SELECT id FROM caldav_accounts WHERE uuid = ?1 LIMIT 1",
            external_id,
        )
    }

    fn insert(&self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO caldav_accounts
                (uuid, name, url, username, password, error, suppress_repeating,
                 encryption_key, account_type, collapsed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.uuid,
                self.name,
                self.url,
                self.username,
                self.password,
                self.error,
                self.suppress_repeating,
                self.encryption_key,
                self.account_type,
                self.collapsed,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl Record for CaldavCalendar {
    const TABLE: &'static str = "caldav_lists";

    fn external_id(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    fn find_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
        find_id(
            conn,
            "SELECT id FROM caldav_lists WHERE uuid = ?1 LIMIT 1",
            external_id,
        )
    }

    fn insert(&self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO caldav_lists (account, uuid, name, color, ctag, url, icon, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.account,
                self.uuid,
                self.name,
                self.color,
                self.ctag,
                self.url,
                self.icon,
                self.order,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

pub fn insert_caldav_task(conn: &Connection, caldav_task: &CaldavTask) -> Result<i64> {
    conn.execute(
        "INSERT INTO caldav_tasks
            (task, calendar, object, remote_id, etag, last_sync, deleted, remote_parent, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            caldav_task.task,
            caldav_task.calendar,
            caldav_task.object,
            caldav_task.remote_id,
            caldav_task.etag,
            caldav_task.last_sync,
            caldav_task.deleted,
            caldav_task.remote_parent,
            caldav_task.order,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Resolve `tasks.parent` for every task with a live CalDAV link.
///
/// The parent is the task whose link in the same calendar has a remote id
/// equal to the child's `remote_parent`; 0 when there is none. Idempotent.
pub fn update_parents(conn: &Connection) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE tasks SET parent = IFNULL((
             SELECT p.task FROM caldav_tasks AS p
             INNER JOIN caldav_tasks AS c ON c.task = tasks.id
             WHERE p.remote_id = c.remote_parent
               AND p.calendar = c.calendar
               AND p.deleted = 0
               AND c.deleted = 0
             LIMIT 1
         ), 0)
         WHERE id IN (SELECT task FROM caldav_tasks WHERE deleted = 0)",
        [],
    )?;
    Ok(updated)
}

/// The first local (device-only) CalDAV account, if any.
pub(crate) fn find_local_account(conn: &Connection) -> Result<Option<CaldavAccount>> {
    let account = conn
        .query_row(
            "SELECT * FROM caldav_accounts WHERE account_type = ?1 ORDER BY id LIMIT 1",
            params![CALDAV_ACCOUNT_TYPE_LOCAL],
            parse_caldav_account_row,
        )
        .optional()?;
    Ok(account)
}

pub(crate) fn calendars_for_account(
    conn: &Connection,
    account_uuid: &str,
) -> Result<Vec<CaldavCalendar>> {
    let mut stmt =
        conn.prepare_cached("SELECT * FROM caldav_lists WHERE account = ?1 ORDER BY id")?;
    let calendars = stmt
        .query_map(params![account_uuid], parse_caldav_calendar_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(calendars)
}

pub(crate) fn caldav_tasks_for_task(conn: &Connection, task_id: i64) -> Result<Vec<CaldavTask>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM caldav_tasks WHERE task = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map(params![task_id], parse_caldav_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl Database {
    pub fn get_caldav_account_by_uuid(&self, uuid: &str) -> Result<Option<CaldavAccount>> {
        self.with_conn(|conn| {
            let account = conn
                .query_row(
                    "SELECT * FROM caldav_accounts WHERE uuid = ?1",
                    params![uuid],
                    parse_caldav_account_row,
                )
                .optional()?;
            Ok(account)
        })
    }

    pub fn get_all_caldav_accounts(&self) -> Result<Vec<CaldavAccount>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM caldav_accounts ORDER BY id")?;
            let accounts = stmt
                .query_map([], parse_caldav_account_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(accounts)
        })
    }

    pub fn get_caldav_calendar_by_uuid(&self, uuid: &str) -> Result<Option<CaldavCalendar>> {
        self.with_conn(|conn| {
            let calendar = conn
                .query_row(
                    "SELECT * FROM caldav_lists WHERE uuid = ?1",
                    params![uuid],
                    parse_caldav_calendar_row,
                )
                .optional()?;
            Ok(calendar)
        })
    }

    pub fn get_all_caldav_calendars(&self) -> Result<Vec<CaldavCalendar>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM caldav_lists ORDER BY id")?;
            let calendars = stmt
                .query_map([], parse_caldav_calendar_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(calendars)
        })
    }

    /// CalDAV links for a local task.
    pub fn get_caldav_tasks(&self, task_id: i64) -> Result<Vec<CaldavTask>> {
        self.with_conn(|conn| caldav_tasks_for_task(conn, task_id))
    }
}
