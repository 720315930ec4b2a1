//! Tag definitions and per-task tag assignments.

use super::Database;
use super::records::{Record, find_id};
use crate::types::{Tag, TagData};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_tag_data_row(row: &Row) -> rusqlite::Result<TagData> {
    Ok(TagData {
        id: row.get("id")?,
        remote_id: row.get("remote_id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        tag_ordering: row.get("tag_ordering")?,
        icon: row.get("icon")?,
        order: row.get("sort_order")?,
    })
}

pub fn parse_tag_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        task: row.get("task")?,
        name: row.get("name")?,
        tag_uid: row.get("tag_uid")?,
        task_uid: row.get("task_uid")?,
    })
}

impl Record for TagData {
    const TABLE: &'static str = "tag_data";

    fn external_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    fn find_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
        find_id(
            conn,
            "SELECT id FROM tag_data WHERE remote_id = ?1 LIMIT 1",
            external_id,
        )
    }

    fn insert(&self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO tag_data (remote_id, name, color, tag_ordering, icon, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.remote_id,
                self.name,
                self.color,
                self.tag_ordering,
                self.icon,
                self.order,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// Assign a tag to a task.
pub fn insert_tag(conn: &Connection, tag: &Tag) -> Result<i64> {
    conn.execute(
        "INSERT INTO tags (task, name, tag_uid, task_uid) VALUES (?1, ?2, ?3, ?4)",
        params![tag.task, tag.name, tag.tag_uid, tag.task_uid],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn tags_for_task(conn: &Connection, task_id: i64) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM tags WHERE task = ?1 ORDER BY id")?;
    let tags = stmt
        .query_map(params![task_id], parse_tag_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

impl Database {
    pub fn get_tag_data_by_remote_id(&self, remote_id: &str) -> Result<Option<TagData>> {
        self.with_conn(|conn| {
            let tag = conn
                .query_row(
                    "SELECT * FROM tag_data WHERE remote_id = ?1",
                    params![remote_id],
                    parse_tag_data_row,
                )
                .optional()?;
            Ok(tag)
        })
    }

    pub fn get_all_tag_data(&self) -> Result<Vec<TagData>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tag_data ORDER BY id")?;
            let tags = stmt
                .query_map([], parse_tag_data_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tags)
        })
    }

    /// Tag assignments for a task.
    pub fn get_tags_for_task(&self, task_id: i64) -> Result<Vec<Tag>> {
        self.with_conn(|conn| tags_for_task(conn, task_id))
    }
}
