//! Typed key/value preference store.
//!
//! Each key holds exactly one value of one kind. Writing a key with a
//! different kind replaces it.

use super::Database;
use crate::backup::CURRENT_VERSION;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Schema version of the running datastore. Never restored from a backup.
pub const P_CURRENT_VERSION: &str = "cv";

/// Theme colour, stored as a palette index by older releases.
pub const P_THEME_COLOR: &str = "theme_color";

const KIND_INT: &str = "int";
const KIND_LONG: &str = "long";
const KIND_STRING: &str = "string";
const KIND_BOOL: &str = "bool";

/// Every stored preference grouped by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceMaps {
    pub ints: BTreeMap<String, i32>,
    pub longs: BTreeMap<String, i64>,
    pub strings: BTreeMap<String, String>,
    pub bools: BTreeMap<String, bool>,
}

fn put(conn: &Connection, key: &str, kind: &str, value: String) -> Result<()> {
    conn.execute(
        "INSERT INTO preferences (key, kind, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET kind = excluded.kind, value = excluded.value",
        params![key, kind, value],
    )?;
    Ok(())
}

fn get<T>(conn: &Connection, key: &str, kind: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM preferences WHERE key = ?1 AND kind = ?2",
            params![key, kind],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|value| {
        value
            .parse::<T>()
            .with_context(|| format!("preference '{}' is not a valid {}", key, kind))
    })
    .transpose()
}

pub fn set_int(conn: &Connection, key: &str, value: i32) -> Result<()> {
    put(conn, key, KIND_INT, value.to_string())
}

pub fn set_long(conn: &Connection, key: &str, value: i64) -> Result<()> {
    put(conn, key, KIND_LONG, value.to_string())
}

pub fn set_string(conn: &Connection, key: &str, value: &str) -> Result<()> {
    put(conn, key, KIND_STRING, value.to_string())
}

pub fn set_bool(conn: &Connection, key: &str, value: bool) -> Result<()> {
    put(conn, key, KIND_BOOL, value.to_string())
}

pub fn get_int(conn: &Connection, key: &str) -> Result<Option<i32>> {
    get(conn, key, KIND_INT)
}

pub fn get_long(conn: &Connection, key: &str) -> Result<Option<i64>> {
    get(conn, key, KIND_LONG)
}

pub fn get_string(conn: &Connection, key: &str) -> Result<Option<String>> {
    get(conn, key, KIND_STRING)
}

pub fn get_bool(conn: &Connection, key: &str) -> Result<Option<bool>> {
    get(conn, key, KIND_BOOL)
}

/// Record the running schema version on a fresh datastore.
pub fn init_current_version(conn: &Connection) -> Result<()> {
    if get_int(conn, P_CURRENT_VERSION)?.is_none() {
        set_int(conn, P_CURRENT_VERSION, CURRENT_VERSION)?;
    }
    Ok(())
}

pub fn all_preferences(conn: &Connection) -> Result<PreferenceMaps> {
    let mut maps = PreferenceMaps::default();
    let mut stmt = conn.prepare("SELECT key, kind, value FROM preferences ORDER BY key")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (key, kind, value) in rows {
        let context = || format!("preference '{}' is not a valid {}", key, kind);
        match kind.as_str() {
            KIND_INT => {
                let v = value.parse::<i32>().with_context(context)?;
                maps.ints.insert(key, v);
            }
            KIND_LONG => {
                let v = value.parse::<i64>().with_context(context)?;
                maps.longs.insert(key, v);
            }
            KIND_BOOL => {
                let v = value.parse::<bool>().with_context(context)?;
                maps.bools.insert(key, v);
            }
            _ => {
                maps.strings.insert(key, value);
            }
        }
    }
    Ok(maps)
}

impl Database {
    pub fn set_int(&self, key: &str, value: i32) -> Result<()> {
        self.with_conn(|conn| set_int(conn, key, value))
    }

    pub fn set_long(&self, key: &str, value: i64) -> Result<()> {
        self.with_conn(|conn| set_long(conn, key, value))
    }

    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| set_string(conn, key, value))
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.with_conn(|conn| set_bool(conn, key, value))
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i32>> {
        self.with_conn(|conn| get_int(conn, key))
    }

    pub fn get_long(&self, key: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| get_long(conn, key))
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| get_string(conn, key))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.with_conn(|conn| get_bool(conn, key))
    }

    pub fn get_all_preferences(&self) -> Result<PreferenceMaps> {
        self.with_conn(all_preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version_initialized() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(
            db.get_int(P_CURRENT_VERSION).unwrap(),
            Some(CURRENT_VERSION)
        );
    }

    #[test]
    fn test_typed_round_trip() {
        let db = Database::open_in_memory().unwrap();
        db.set_int("i", -4).unwrap();
        db.set_long("l", 1_700_000_000_000).unwrap();
        db.set_string("s", "hello").unwrap();
        db.set_bool("b", true).unwrap();

        assert_eq!(db.get_int("i").unwrap(), Some(-4));
        assert_eq!(db.get_long("l").unwrap(), Some(1_700_000_000_000));
        assert_eq!(db.get_string("s").unwrap().as_deref(), Some("hello"));
        assert_eq!(db.get_bool("b").unwrap(), Some(true));
        assert_eq!(db.get_int("missing").unwrap(), None);
    }

    #[test]
    fn test_overwrite_changes_kind() {
        let db = Database::open_in_memory().unwrap();
        db.set_int("k", 1).unwrap();
        db.set_string("k", "one").unwrap();
        assert_eq!(db.get_int("k").unwrap(), None);
        assert_eq!(db.get_string("k").unwrap().as_deref(), Some("one"));
    }

    #[test]
    fn test_all_preferences_grouped() {
        let db = Database::open_in_memory().unwrap();
        db.set_bool("dark", false).unwrap();
        db.set_long("last_backup", 99).unwrap();

        let maps = db.get_all_preferences().unwrap();
        assert_eq!(maps.ints.get(P_CURRENT_VERSION), Some(&CURRENT_VERSION));
        assert_eq!(maps.bools.get("dark"), Some(&false));
        assert_eq!(maps.longs.get("last_backup"), Some(&99));
        assert!(maps.strings.is_empty());
    }
}
