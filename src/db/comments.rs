//! Task comments (user activity).

use super::Database;
use crate::types::UserActivity;
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub fn parse_user_activity_row(row: &Row) -> rusqlite::Result<UserActivity> {
    Ok(UserActivity {
        id: row.get("id")?,
        remote_id: row.get("remote_id")?,
        message: row.get("message")?,
        picture: row.get("picture")?,
        target_id: row.get("target_id")?,
        created_at: row.get("created_at")?,
    })
}

/// Insert a comment. A comment without a remote id gets a fresh one.
pub fn create_new_comment(conn: &Connection, comment: &mut UserActivity) -> Result<i64> {
    if comment.remote_id.as_deref().is_none_or(str::is_empty) {
        comment.remote_id = Some(crate::types::new_uuid());
    }
    conn.execute(
        "INSERT INTO user_activity (remote_id, message, picture, target_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            comment.remote_id,
            comment.message,
            comment.picture,
            comment.target_id,
            comment.created_at,
        ],
    )?;
    comment.id = conn.last_insert_rowid();
    Ok(comment.id)
}

pub(crate) fn comments_for_task(conn: &Connection, task_uuid: &str) -> Result<Vec<UserActivity>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM user_activity WHERE target_id = ?1 ORDER BY created_at, id",
    )?;
    let comments = stmt
        .query_map(params![task_uuid], parse_user_activity_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(comments)
}

impl Database {
    /// Comments on the task with this uuid, oldest first.
    pub fn get_comments(&self, task_uuid: &str) -> Result<Vec<UserActivity>> {
        self.with_conn(|conn| comments_for_task(conn, task_uuid))
    }
}
