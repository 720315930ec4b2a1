//! Places and the geofences that tie tasks to them.

use super::Database;
use super::records::{Record, find_id};
use crate::types::{Geofence, Place};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_place_row(row: &Row) -> rusqlite::Result<Place> {
    Ok(Place {
        id: row.get("id")?,
        uid: row.get("uid")?,
        name: row.get("name")?,
        address: row.get("address")?,
        phone: row.get("phone")?,
        url: row.get("url")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        order: row.get("sort_order")?,
    })
}

pub fn parse_geofence_row(row: &Row) -> rusqlite::Result<Geofence> {
    Ok(Geofence {
        id: row.get("id")?,
        task: row.get("task")?,
        place: row.get("place")?,
        radius: row.get("radius")?,
        arrival: row.get("arrival")?,
        departure: row.get("departure")?,
    })
}

impl Record for Place {
    const TABLE: &'static str = "places";

    fn external_id(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    fn find_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
        find_id(conn, "SELECT id FROM places WHERE uid = ?1 LIMIT 1", external_id)
    }

    fn insert(&self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO places (uid, name, address, phone, url, latitude, longitude, color, icon, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.uid,
                self.name,
                self.address,
                self.phone,
                self.url,
                self.latitude,
                self.longitude,
                self.color,
                self.icon,
                self.order,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

pub fn insert_geofence(conn: &Connection, geofence: &Geofence) -> Result<i64> {
    conn.execute(
        "INSERT INTO geofences (task, place, radius, arrival, departure)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            geofence.task,
            geofence.place,
            geofence.radius,
            geofence.arrival,
            geofence.departure,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn geofences_for_task(conn: &Connection, task_id: i64) -> Result<Vec<Geofence>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM geofences WHERE task = ?1 ORDER BY id")?;
    let geofences = stmt
        .query_map(params![task_id], parse_geofence_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(geofences)
}

impl Database {
    pub fn get_place_by_uid(&self, uid: &str) -> Result<Option<Place>> {
        self.with_conn(|conn| {
            let place = conn
                .query_row(
                    "SELECT * FROM places WHERE uid = ?1",
                    params![uid],
                    parse_place_row,
                )
                .optional()?;
            Ok(place)
        })
    }

    pub fn get_all_places(&self) -> Result<Vec<Place>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM places ORDER BY id")?;
            let places = stmt
                .query_map([], parse_place_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(places)
        })
    }

    pub fn get_geofences(&self, task_id: i64) -> Result<Vec<Geofence>> {
        self.with_conn(|conn| geofences_for_task(conn, task_id))
    }
}
