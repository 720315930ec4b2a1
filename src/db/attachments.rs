//! Attachment storage operations.

use super::Database;
use crate::types::TaskAttachment;
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub fn parse_attachment_row(row: &Row) -> rusqlite::Result<TaskAttachment> {
    Ok(TaskAttachment {
        id: row.get("id")?,
        remote_id: row.get("remote_id")?,
        task_id: row.get("task_id")?,
        name: row.get("name")?,
        uri: row.get("uri")?,
        path: None,
        content_type: row.get("content_type")?,
    })
}

/// Insert an attachment. Only `uri` is stored; convert legacy paths first.
pub fn insert_attachment(conn: &Connection, attachment: &TaskAttachment) -> Result<i64> {
    conn.execute(
        "INSERT INTO task_attachments (remote_id, task_id, name, uri, content_type)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            attachment.remote_id,
            attachment.task_id,
            attachment.name,
            attachment.uri,
            attachment.content_type,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn attachments_for_task(
    conn: &Connection,
    task_uuid: &str,
) -> Result<Vec<TaskAttachment>> {
    let mut stmt =
        conn.prepare_cached("SELECT * FROM task_attachments WHERE task_id = ?1 ORDER BY id")?;
    let attachments = stmt
        .query_map(params![task_uuid], parse_attachment_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(attachments)
}

impl Database {
    /// Attachments of the task with this uuid.
    pub fn get_attachments(&self, task_uuid: &str) -> Result<Vec<TaskAttachment>> {
        self.with_conn(|conn| attachments_for_task(conn, task_uuid))
    }
}
