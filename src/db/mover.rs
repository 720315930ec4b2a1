//! Move local-only tasks into the device's local CalDAV list.
//!
//! Older releases kept tasks that belonged to no remote list as bare rows.
//! Newer releases expect every live task to sit in some list, so those tasks
//! are attached to the local CalDAV account's first calendar.

use super::Database;
use super::caldav::{calendars_for_account, find_local_account, insert_caldav_task};
use super::records::Record;
use crate::types::{
    CALDAV_ACCOUNT_TYPE_LOCAL, CaldavAccount, CaldavCalendar, CaldavTask, new_uuid,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use tracing::{debug, info};

pub const LOCAL_ACCOUNT_NAME: &str = "Local";
pub const DEFAULT_LIST_NAME: &str = "Default list";

/// Find the local account, creating it when absent. Returns its uuid.
fn ensure_local_account(conn: &Connection) -> Result<String> {
    if let Some(account) = find_local_account(conn)? {
        if let Some(uuid) = account.uuid {
            return Ok(uuid);
        }
    }
    let account = CaldavAccount {
        uuid: Some(new_uuid()),
        name: Some(LOCAL_ACCOUNT_NAME.to_string()),
        account_type: CALDAV_ACCOUNT_TYPE_LOCAL,
        ..CaldavAccount::default()
    };
    account.insert(conn)?;
    debug!(uuid = ?account.uuid, "created local account");
    account.uuid.ok_or_else(|| anyhow!("local account has no uuid"))
}

/// First calendar of `account_uuid`, creating the default list when it has none.
fn ensure_default_list(conn: &Connection, account_uuid: &str) -> Result<String> {
    if let Some(uuid) = calendars_for_account(conn, account_uuid)?
        .into_iter()
        .find_map(|calendar| calendar.uuid)
    {
        return Ok(uuid);
    }
    let uuid = new_uuid();
    CaldavCalendar {
        account: Some(account_uuid.to_string()),
        uuid: Some(uuid.clone()),
        name: Some(DEFAULT_LIST_NAME.to_string()),
        ..CaldavCalendar::default()
    }
    .insert(conn)?;
    debug!(%uuid, "created default list");
    Ok(uuid)
}

/// Ids of live tasks with no live Google Tasks or CalDAV link.
fn orphaned_task_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM tasks
         WHERE deleted = 0
           AND id NOT IN (SELECT task FROM google_tasks WHERE deleted = 0)
           AND id NOT IN (SELECT task FROM caldav_tasks WHERE deleted = 0)
         ORDER BY id",
    )?;
    let ids = stmt
        .query_map(params![], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

/// Attach every local-only task to the local list. Returns how many moved.
pub fn migrate_local_tasks(conn: &Connection) -> Result<usize> {
    let orphans = orphaned_task_ids(conn)?;
    if orphans.is_empty() {
        debug!("no local tasks to migrate");
        return Ok(0);
    }

    let account = ensure_local_account(conn)?;
    let calendar = ensure_default_list(conn, &account)?;

    for task_id in &orphans {
        let remote_id = new_uuid();
        insert_caldav_task(
            conn,
            &CaldavTask {
                task: *task_id,
                calendar: Some(calendar.clone()),
                object: Some(format!("{}.ics", remote_id)),
                remote_id: Some(remote_id),
                ..CaldavTask::default()
            },
        )?;
    }

    info!(moved = orphans.len(), %calendar, "migrated local tasks");
    Ok(orphans.len())
}

impl Database {
    pub fn migrate_local_tasks(&self) -> Result<usize> {
        self.with_conn(migrate_local_tasks)
    }
}
