//! Fixed-time reminders.

use super::Database;
use crate::types::Alarm;
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub fn parse_alarm_row(row: &Row) -> rusqlite::Result<Alarm> {
    Ok(Alarm {
        id: row.get("id")?,
        task: row.get("task")?,
        time: row.get("time")?,
    })
}

pub fn insert_alarm(conn: &Connection, alarm: &Alarm) -> Result<i64> {
    conn.execute(
        "INSERT INTO alarms (task, time) VALUES (?1, ?2)",
        params![alarm.task, alarm.time],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn alarms_for_task(conn: &Connection, task_id: i64) -> Result<Vec<Alarm>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM alarms WHERE task = ?1 ORDER BY time, id")?;
    let alarms = stmt
        .query_map(params![task_id], parse_alarm_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(alarms)
}

impl Database {
    pub fn get_alarms(&self, task_id: i64) -> Result<Vec<Alarm>> {
        self.with_conn(|conn| alarms_for_task(conn, task_id))
    }
}
