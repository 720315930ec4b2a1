//! Insert-if-absent for records keyed by an external id.

use crate::types::has_external_id;
use anyhow::Result;
use rusqlite::Connection;

/// A top-level record that can be matched across datastores by external id.
pub trait Record {
    /// Table the record lives in, used for counters and logs.
    const TABLE: &'static str;

    /// The external id, if the record carries one.
    fn external_id(&self) -> Option<&str>;

    /// Local id of an existing record with this external id.
    fn find_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<i64>>;

    /// Insert as a new row, ignoring any local id carried by `self`.
    fn insert(&self, conn: &Connection) -> Result<i64>;
}

/// What [`insert_if_absent`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new row was written with this local id.
    Inserted(i64),
    /// A row with the same external id already exists; it was left untouched.
    Skipped(i64),
}

impl Upsert {
    pub fn local_id(&self) -> i64 {
        match *self {
            Upsert::Inserted(id) | Upsert::Skipped(id) => id,
        }
    }

    pub fn inserted(&self) -> bool {
        matches!(self, Upsert::Inserted(_))
    }
}

/// Insert `record` unless one with the same external id exists.
///
/// Records without an external id can never match and are always inserted.
pub fn insert_if_absent<R: Record>(conn: &Connection, record: &R) -> Result<Upsert> {
    if let Some(external_id) = record.external_id().filter(|id| has_external_id(Some(*id))) {
        if let Some(existing) = R::find_by_external_id(conn, external_id)? {
            return Ok(Upsert::Skipped(existing));
        }
    }
    Ok(Upsert::Inserted(record.insert(conn)?))
}

/// Run a single-column id lookup.
pub(crate) fn find_id(conn: &Connection, sql: &str, key: &str) -> Result<Option<i64>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query([key])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}
