//! Database layer for the task datastore.

pub mod alarms;
pub mod attachments;
pub mod caldav;
pub mod comments;
pub mod export;
pub mod filters;
pub mod google;
pub mod import;
pub mod locations;
pub mod mover;
pub mod preferences;
pub mod records;
pub mod tags;
pub mod tasks;

use crate::broadcast::LocalBroadcast;
use anyhow::{Result, bail};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    events: LocalBroadcast,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            events: LocalBroadcast::new(),
        };

        db.run_migrations()?;
        db.with_conn(preferences::init_current_version)?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Broadcast channel for change notifications.
    pub fn events(&self) -> &LocalBroadcast {
        &self.events
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap();
        f(&mut conn)
    }

    /// Row count of one of the datastore's tables.
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        if !TABLES.contains(&table) {
            bail!("Unknown table: {}", table);
        }
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(count as usize)
        })
    }
}

/// Every table created by the schema migrations.
pub const TABLES: &[&str] = &[
    "tasks",
    "alarms",
    "user_activity",
    "task_attachments",
    "tag_data",
    "tags",
    "places",
    "geofences",
    "filters",
    "google_task_accounts",
    "google_task_lists",
    "google_tasks",
    "caldav_accounts",
    "caldav_lists",
    "caldav_tasks",
    "preferences",
];

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_runs_migrations() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.count_rows("tasks").unwrap(), 0);
        assert_eq!(db.count_rows("caldav_tasks").unwrap(), 0);
    }

    #[test]
    fn test_count_rows_rejects_unknown_table() {
        let db = Database::open_in_memory().unwrap();
        for table in TABLES.iter().filter(|t| **t != "preferences") {
            assert_eq!(db.count_rows(table).unwrap(), 0);
        }
        let err = db.count_rows("tasks; DROP TABLE tasks").unwrap_err();
        assert!(err.to_string().contains("Unknown table"));
        assert_eq!(db.count_rows("tasks").unwrap(), 0);
    }

    #[test]
    fn test_open_file_database_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");
        {
            let db = Database::open(&path).unwrap();
            db.with_conn(|conn| {
                conn.execute("INSERT INTO tasks (uuid, title) VALUES ('u1', 'first')", [])?;
                Ok(())
            })
            .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count_rows("tasks").unwrap(), 1);
    }
}
