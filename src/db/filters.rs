//! Saved custom filters.

use super::Database;
use super::records::{Record, find_id};
use crate::types::Filter;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_filter_row(row: &Row) -> rusqlite::Result<Filter> {
    Ok(Filter {
        id: row.get("id")?,
        title: row.get("title")?,
        sql: row.get("sql")?,
        values: row.get("criterion_values")?,
        criterion: row.get("criterion")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        order: row.get("sort_order")?,
    })
}

/// Filters are matched by title.
impl Record for Filter {
    const TABLE: &'static str = "filters";

    fn external_id(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn find_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
        find_id(
            conn,
            "SELECT id FROM filters WHERE title = ?1 LIMIT 1",
            external_id,
        )
    }

    fn insert(&self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO filters (title, sql, criterion_values, criterion, color, icon, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.title,
                self.sql,
                self.values,
                self.criterion,
                self.color,
                self.icon,
                self.order,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl Database {
    pub fn get_filter_by_title(&self, title: &str) -> Result<Option<Filter>> {
        self.with_conn(|conn| {
            let filter = conn
                .query_row(
                    "SELECT * FROM filters WHERE title = ?1",
                    params![title],
                    parse_filter_row,
                )
                .optional()?;
            Ok(filter)
        })
    }

    pub fn get_all_filters(&self) -> Result<Vec<Filter>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM filters ORDER BY id")?;
            let filters = stmt
                .query_map([], parse_filter_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(filters)
        })
    }
}
