//! Google Tasks accounts, lists and task links.

use super::Database;
use super::records::{Record, find_id};
use crate::types::{GoogleTask, GoogleTaskAccount, GoogleTaskList};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_google_account_row(row: &Row) -> rusqlite::Result<GoogleTaskAccount> {
    Ok(GoogleTaskAccount {
        id: row.get("id")?,
        account: row.get("account")?,
        error: row.get("error")?,
        etag: row.get("etag")?,
        collapsed: row.get("collapsed")?,
    })
}

pub fn parse_google_list_row(row: &Row) -> rusqlite::Result<GoogleTaskList> {
    Ok(GoogleTaskList {
        id: row.get("id")?,
        account: row.get("account")?,
        remote_id: row.get("remote_id")?,
        title: row.get("title")?,
        remote_order: row.get("remote_order")?,
        last_sync: row.get("last_sync")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        order: row.get("sort_order")?,
    })
}

pub fn parse_google_task_row(row: &Row) -> rusqlite::Result<GoogleTask> {
    Ok(GoogleTask {
        id: row.get("id")?,
        task: row.get("task")?,
        remote_id: row.get("remote_id")?,
        list_id: row.get("list_id")?,
        parent: row.get("parent")?,
        remote_parent: row.get("remote_parent")?,
        moved: row.get("moved")?,
        order: row.get("sort_order")?,
        remote_order: row.get("remote_order")?,
        last_sync: row.get("last_sync")?,
        deleted: row.get("deleted")?,
    })
}

/// Accounts are keyed by account name.
impl Record for GoogleTaskAccount {
    const TABLE: &'static str = "google_task_accounts";

    fn external_id(&self) -> Option<&str> {
        self.account.as_deref()
    }

    fn find_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
        find_id(
            conn,
            "SELECT id FROM google_task_accounts WHERE account = ?1 LIMIT 1",
            external_id,
        )
    }

    fn insert(&self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO google_task_accounts (account, error, etag, collapsed)
             VALUES (?1, ?2, ?3, ?4)",
            params![self.account, self.error, self.etag, self.collapsed],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl Record for GoogleTaskList {
    const TABLE: &'static str = "google_task_lists";

    fn external_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    fn find_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
        find_id(
            conn,
            "SELECT id FROM google_task_lists WHERE remote_id = ?1 LIMIT 1",
            external_id,
        )
    }

    fn insert(&self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO google_task_lists
                (account, remote_id, title, remote_order, last_sync, color, icon, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.account,
                self.remote_id,
                self.title,
                self.remote_order,
                self.last_sync,
                self.color,
                self.icon,
                self.order,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

pub fn insert_google_task(conn: &Connection, google_task: &GoogleTask) -> Result<i64> {
    conn.execute(
        "INSERT INTO google_tasks
            (task, remote_id, list_id, parent, remote_parent, moved, sort_order, remote_order, last_sync, deleted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            google_task.task,
            google_task.remote_id,
            google_task.list_id,
            google_task.parent,
            google_task.remote_parent,
            google_task.moved,
            google_task.order,
            google_task.remote_order,
            google_task.last_sync,
            google_task.deleted,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Resolve `parent` on every Google task link from its `remote_parent`.
///
/// The parent is the task linked to the row in the same list whose remote id
/// equals `remote_parent`. Rows whose parent is absent get 0. Safe to run any
/// number of times. Returns the number of rows touched.
pub fn update_parents(conn: &Connection) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE google_tasks SET parent = IFNULL((
             SELECT p.task FROM google_tasks AS p
             WHERE p.remote_id = google_tasks.remote_parent
               AND p.list_id = google_tasks.list_id
               AND p.deleted = 0
             LIMIT 1
         ), 0)
         WHERE moved = 0",
        [],
    )?;
    Ok(updated)
}

pub(crate) fn google_tasks_for_task(conn: &Connection, task_id: i64) -> Result<Vec<GoogleTask>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM google_tasks WHERE task = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map(params![task_id], parse_google_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl Database {
    pub fn get_all_google_accounts(&self) -> Result<Vec<GoogleTaskAccount>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM google_task_accounts ORDER BY id")?;
            let accounts = stmt
                .query_map([], parse_google_account_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(accounts)
        })
    }

    pub fn get_google_list_by_remote_id(&self, remote_id: &str) -> Result<Option<GoogleTaskList>> {
        self.with_conn(|conn| {
            let list = conn
                .query_row(
                    "SELECT * FROM google_task_lists WHERE remote_id = ?1",
                    params![remote_id],
                    parse_google_list_row,
                )
                .optional()?;
            Ok(list)
        })
    }

    pub fn get_all_google_lists(&self) -> Result<Vec<GoogleTaskList>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM google_task_lists ORDER BY id")?;
            let lists = stmt
                .query_map([], parse_google_list_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(lists)
        })
    }

    /// Google Tasks links for a local task.
    pub fn get_google_tasks(&self, task_id: i64) -> Result<Vec<GoogleTask>> {
        self.with_conn(|conn| google_tasks_for_task(conn, task_id))
    }
}
