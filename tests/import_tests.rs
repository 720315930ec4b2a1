//! Integration tests for backup import and export.
//!
//! Backups are written as JSON the way the mobile app exports them and
//! imported into an in-memory SQLite database.

use serde_json::{Value, json};
use std::io::Write;
use std::sync::mpsc;
use tasks_backup::backup::migrations::{MigrationRegistry, V6_4, V8_2, V9_6};
use tasks_backup::backup::palette::{ColorPalette, MaterialPalette};
use tasks_backup::backup::{BackupDocument, BackupFile, CURRENT_VERSION, TaskBackup};
use tasks_backup::broadcast::BroadcastEvent;
use tasks_backup::db::Database;
use tasks_backup::db::import::{ImportOptions, ImportResult};
use tasks_backup::db::preferences::{P_CURRENT_VERSION, P_THEME_COLOR};
use tasks_backup::error::ImportError;
use tasks_backup::types::{GoogleTask, Task};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn backup(version: i32, data: Value) -> BackupFile {
    BackupFile::from_json(&json!({ "version": version, "data": data }).to_string())
        .expect("fixture should parse")
}

fn import(db: &Database, backup: &BackupFile) -> ImportResult {
    db.import_backup(backup, &ImportOptions::default(), None)
        .expect("import should succeed")
}

fn task(uuid: &str) -> Value {
    json!({ "task": { "remoteId": uuid, "title": format!("Task {}", uuid) } })
}

mod merge_tests {
    use super::*;

    #[test]
    fn second_import_skips_everything() {
        let db = setup_db();
        let doc = backup(
            CURRENT_VERSION,
            json!({
                "tasks": [task("a"), task("b"), task("c")],
                "tags": [{ "remoteId": "tag-1", "name": "Home" }],
                "places": [{ "uid": "place-1", "name": "Office" }],
            }),
        );

        let first = import(&db, &doc);
        assert_eq!(first.task_count, 3);
        assert_eq!(first.import_count, 3);
        assert_eq!(first.skip_count, 0);
        assert_eq!(first.entities_imported.get("tag_data"), Some(&1));

        let second = import(&db, &doc);
        assert_eq!(second.task_count, 3);
        assert_eq!(second.import_count, 0);
        assert_eq!(second.skip_count, 3);
        assert_eq!(second.total_entities_imported(), 0);
        assert_eq!(second.entities_skipped.get("places"), Some(&1));

        assert_eq!(db.count_rows("tasks").unwrap(), 3);
        assert_eq!(db.count_rows("tag_data").unwrap(), 1);
        assert_eq!(db.count_rows("places").unwrap(), 1);
    }

    #[test]
    fn counters_add_up_with_existing_tasks() {
        let db = setup_db();
        import(&db, &backup(CURRENT_VERSION, json!({ "tasks": [task("a")] })));

        let result = import(
            &db,
            &backup(
                CURRENT_VERSION,
                json!({ "tasks": [task("a"), task("b"), task("a")] }),
            ),
        );
        assert_eq!(result.task_count, result.import_count + result.skip_count);
        assert_eq!(result.import_count, 1);
        assert_eq!(result.skip_count, 2);
    }

    #[test]
    fn existing_entity_is_not_overwritten() {
        let db = setup_db();
        import(
            &db,
            &backup(
                CURRENT_VERSION,
                json!({ "tags": [{ "remoteId": "t", "name": "Original" }] }),
            ),
        );
        import(
            &db,
            &backup(
                CURRENT_VERSION,
                json!({ "tags": [{ "remoteId": "t", "name": "Changed" }] }),
            ),
        );
        let tag = db.get_tag_data_by_remote_id("t").unwrap().unwrap();
        assert_eq!(tag.name.as_deref(), Some("Original"));
    }

    #[test]
    fn filters_match_by_title() {
        let db = setup_db();
        let doc = backup(
            CURRENT_VERSION,
            json!({ "filters": [{ "title": "Today", "sql": "due < now" }] }),
        );
        import(&db, &doc);
        let result = import(&db, &doc);
        assert_eq!(result.entities_skipped.get("filters"), Some(&1));
        assert!(db.get_filter_by_title("Today").unwrap().is_some());
        assert_eq!(db.get_all_filters().unwrap().len(), 1);
    }

    #[test]
    fn import_emits_only_a_final_refresh() {
        let db = setup_db();
        let mut rx = db.events().subscribe();
        import(
            &db,
            &backup(CURRENT_VERSION, json!({ "tasks": [task("a"), task("b")] })),
        );
        assert_eq!(rx.try_recv().unwrap(), BroadcastEvent::Refresh);
        assert!(rx.try_recv().is_err());
    }
}

mod fixup_tests {
    use super::*;

    #[test]
    fn children_point_at_new_task() {
        let db = setup_db();
        let doc = backup(
            CURRENT_VERSION,
            json!({
                "tasks": [{
                    "task": { "id": 900, "remoteId": "uuid-1", "title": "Call mom" },
                    "alarms": [{ "task": 900, "time": 1234 }],
                    "comments": [{ "remoteId": "c1", "message": "note", "targetId": "stale" }],
                    "tags": [{ "task": 900, "name": "Home", "tagUid": "tag-1", "taskUid": "stale" }],
                    "geofences": [{ "task": 900, "place": "place-1", "radius": 50, "arrival": true }],
                    "attachments": [{ "remoteId": "a1", "taskId": "stale", "name": "pic", "uri": "content://pic" }],
                    "caldavTasks": [{ "task": 900, "calendar": "cal", "remoteId": "r1" }],
                    "google": [{ "task": 900, "remoteId": "g1", "listId": "list" }]
                }]
            }),
        );
        import(&db, &doc);

        let stored = db.get_task_by_uuid("uuid-1").unwrap().unwrap();
        assert_ne!(stored.id, 900);

        let alarms = db.get_alarms(stored.id).unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].time, 1234);

        let comments = db.get_comments("uuid-1").unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].target_id.as_deref(), Some("uuid-1"));

        let tags = db.get_tags_for_task(stored.id).unwrap();
        assert_eq!(tags[0].task_uid.as_deref(), Some("uuid-1"));
        assert_eq!(tags[0].tag_uid.as_deref(), Some("tag-1"));

        let geofences = db.get_geofences(stored.id).unwrap();
        assert_eq!(geofences[0].place.as_deref(), Some("place-1"));
        assert!(geofences[0].arrival);

        let attachments = db.get_attachments("uuid-1").unwrap();
        assert_eq!(attachments[0].uri.as_deref(), Some("content://pic"));

        assert_eq!(db.get_caldav_tasks(stored.id).unwrap().len(), 1);
        assert_eq!(db.get_google_tasks(stored.id).unwrap().len(), 1);
    }

    #[test]
    fn legacy_location_becomes_place_and_geofence() {
        let db = setup_db();
        let doc = backup(
            CURRENT_VERSION,
            json!({
                "tasks": [{
                    "task": { "remoteId": "t" },
                    "locations": [{
                        "name": "Gym",
                        "address": "1 Main St",
                        "latitude": 40.5,
                        "longitude": -73.25,
                        "radius": 250,
                        "arrival": true,
                        "departure": false
                    }]
                }]
            }),
        );
        import(&db, &doc);

        let task = db.get_task_by_uuid("t").unwrap().unwrap();
        let places = db.get_all_places().unwrap();
        assert_eq!(places.len(), 1);
        let place = &places[0];
        assert_eq!(place.name.as_deref(), Some("Gym"));
        assert_eq!(place.address.as_deref(), Some("1 Main St"));
        assert_eq!(place.latitude, 40.5);
        assert_eq!(place.longitude, -73.25);

        let geofences = db.get_geofences(task.id).unwrap();
        assert_eq!(geofences.len(), 1);
        assert_eq!(geofences[0].task, task.id);
        assert_eq!(geofences[0].place, place.uid);
        assert_eq!(geofences[0].radius, 250);
        assert!(geofences[0].arrival);
        assert!(!geofences[0].departure);
    }

    #[test]
    fn google_child_before_parent() {
        let db = setup_db();
        let doc = backup(
            CURRENT_VERSION,
            json!({
                "tasks": [
                    {
                        "task": { "remoteId": "child" },
                        "google": [{ "remoteId": "g-child", "listId": "L", "remoteParent": "g-parent" }]
                    },
                    {
                        "task": { "remoteId": "parent" },
                        "google": [{ "remoteId": "g-parent", "listId": "L" }]
                    }
                ]
            }),
        );
        import(&db, &doc);

        let parent = db.get_task_by_uuid("parent").unwrap().unwrap();
        let child = db.get_task_by_uuid("child").unwrap().unwrap();
        assert_eq!(db.get_google_tasks(child.id).unwrap()[0].parent, parent.id);
        assert_eq!(db.get_google_tasks(parent.id).unwrap()[0].parent, 0);
    }

    #[test]
    fn caldav_child_before_parent() {
        let db = setup_db();
        let doc = backup(
            CURRENT_VERSION,
            json!({
                "tasks": [
                    {
                        "task": { "remoteId": "child" },
                        "caldavTasks": [{ "calendar": "cal", "remoteId": "c-child", "remoteParent": "c-parent" }]
                    },
                    {
                        "task": { "remoteId": "parent" },
                        "caldavTasks": [{ "calendar": "cal", "remoteId": "c-parent" }]
                    }
                ]
            }),
        );
        import(&db, &doc);

        let parent = db.get_task_by_uuid("parent").unwrap().unwrap();
        let child = db.get_task_by_uuid("child").unwrap().unwrap();
        assert_eq!(child.parent, parent.id);
        assert_eq!(parent.parent, 0);
        let subtasks = db.get_subtasks(parent.id).unwrap();
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].uuid, "child");
    }

    #[test]
    fn local_parent_ids_from_backup_are_ignored() {
        let db = setup_db();
        let mut unrelated = Task {
            uuid: "unrelated".to_string(),
            ..Task::default()
        };
        db.create_task(&mut unrelated).unwrap();

        let doc = backup(
            CURRENT_VERSION,
            json!({
                "tasks": [{
                    "task": { "id": unrelated.id, "remoteId": "child", "parent": unrelated.id },
                    "google": [{ "remoteId": "g-child", "listId": "L", "parent": unrelated.id, "isMoved": true }]
                }]
            }),
        );
        import(&db, &doc);

        let child = db.get_task_by_uuid("child").unwrap().unwrap();
        assert_ne!(child.id, unrelated.id);
        assert_eq!(child.parent, 0);
        assert!(db.get_subtasks(unrelated.id).unwrap().is_empty());
        assert_eq!(db.get_google_tasks(child.id).unwrap()[0].parent, 0);
    }

    #[test]
    fn local_parent_ids_on_built_documents_are_ignored() {
        let db = setup_db();
        let mut unrelated = Task {
            uuid: "unrelated".to_string(),
            ..Task::default()
        };
        db.create_task(&mut unrelated).unwrap();

        let mut child = TaskBackup::new(Task {
            uuid: "child".to_string(),
            parent: unrelated.id,
            ..Task::default()
        });
        child.google.push(GoogleTask {
            remote_id: Some("g-child".to_string()),
            list_id: Some("L".to_string()),
            parent: unrelated.id,
            moved: true,
            ..GoogleTask::default()
        });
        let doc = BackupFile::new(BackupDocument {
            tasks: vec![child],
            ..BackupDocument::default()
        });
        import(&db, &doc);

        let stored = db.get_task_by_uuid("child").unwrap().unwrap();
        assert_eq!(stored.parent, 0);
        assert!(db.get_subtasks(unrelated.id).unwrap().is_empty());
        assert_eq!(db.get_google_tasks(stored.id).unwrap()[0].parent, 0);
    }

    #[test]
    fn skipped_task_children_are_discarded() {
        let db = setup_db();
        import(&db, &backup(CURRENT_VERSION, json!({ "tasks": [task("a")] })));
        import(
            &db,
            &backup(
                CURRENT_VERSION,
                json!({ "tasks": [{ "task": { "remoteId": "a" }, "alarms": [{ "time": 1 }] }] }),
            ),
        );
        assert_eq!(db.count_rows("alarms").unwrap(), 0);
    }
}

mod preference_tests {
    use super::*;

    #[test]
    fn current_version_is_never_restored() {
        let db = setup_db();
        let doc = backup(
            CURRENT_VERSION,
            json!({
                "intPrefs": { "cv": 1, "font_size": 16 },
                "longPrefs": { "last_sync": 1_700_000_000_000_i64 },
                "stringPrefs": { "language": "de" },
                "boolPrefs": { "dark_mode": true }
            }),
        );
        import(&db, &doc);

        assert_eq!(db.get_int(P_CURRENT_VERSION).unwrap(), Some(CURRENT_VERSION));
        assert_eq!(db.get_int("font_size").unwrap(), Some(16));
        assert_eq!(db.get_long("last_sync").unwrap(), Some(1_700_000_000_000));
        assert_eq!(db.get_string("language").unwrap().as_deref(), Some("de"));
        assert_eq!(db.get_bool("dark_mode").unwrap(), Some(true));
    }

    #[test]
    fn replay_overwrites_existing_values() {
        let db = setup_db();
        db.set_string("language", "en").unwrap();
        import(
            &db,
            &backup(CURRENT_VERSION, json!({ "stringPrefs": { "language": "fr" } })),
        );
        assert_eq!(db.get_string("language").unwrap().as_deref(), Some("fr"));
    }
}

mod migration_tests {
    use super::*;

    fn colored(version: i32) -> BackupFile {
        backup(
            version,
            json!({
                "tags": [{ "remoteId": "tag", "color": 2 }],
                "googleTaskLists": [{ "remoteId": "list", "color": 11 }],
                "filters": [{ "title": "Work", "color": 4 }],
                "caldavCalendars": [{ "uuid": "cal", "color": 7 }]
            }),
        )
    }

    #[test]
    fn colours_translated_just_below_threshold() {
        let db = setup_db();
        import(&db, &colored(V8_2 - 1));

        let palette = MaterialPalette;
        let tag = db.get_tag_data_by_remote_id("tag").unwrap().unwrap();
        assert_eq!(tag.color, Some(palette.android_color(2)));
        let list = db.get_google_list_by_remote_id("list").unwrap().unwrap();
        assert_eq!(list.color, Some(palette.android_color(11)));
        let filter = db.get_filter_by_title("Work").unwrap().unwrap();
        assert_eq!(filter.color, Some(palette.android_color(4)));
        let calendar = db.get_caldav_calendar_by_uuid("cal").unwrap().unwrap();
        assert_eq!(calendar.color, palette.android_color(7));
    }

    #[test]
    fn colours_kept_at_threshold() {
        let db = setup_db();
        import(&db, &colored(V8_2));

        let tag = db.get_tag_data_by_remote_id("tag").unwrap().unwrap();
        assert_eq!(tag.color, Some(2));
        let calendar = db.get_caldav_calendar_by_uuid("cal").unwrap().unwrap();
        assert_eq!(calendar.color, 7);
    }

    #[test]
    fn theme_colour_translated_from_backup_or_default() {
        let db = setup_db();
        import(
            &db,
            &backup(V8_2 - 1, json!({ "intPrefs": { "theme_color": 4 } })),
        );
        assert_eq!(
            db.get_int(P_THEME_COLOR).unwrap(),
            Some(MaterialPalette.android_color(4))
        );

        let fresh = setup_db();
        import(&fresh, &backup(V8_2 - 1, json!({})));
        assert_eq!(
            fresh.get_int(P_THEME_COLOR).unwrap(),
            Some(MaterialPalette.android_color(7))
        );

        let current = setup_db();
        import(&current, &backup(V8_2, json!({})));
        assert_eq!(current.get_int(P_THEME_COLOR).unwrap(), None);
    }

    #[test]
    fn legacy_uris_converted_below_threshold() {
        let db = setup_db();
        let data = json!({
            "tasks": [{
                "task": { "remoteId": "t" },
                "comments": [{ "remoteId": "c", "picture": "{\"path\":\"/sdcard/a b.jpg\"}" }],
                "attachments": [{ "remoteId": "a", "path": "/sdcard/doc.pdf" }]
            }]
        });
        import(&db, &backup(V6_4 - 1, data.clone()));

        let comments = db.get_comments("t").unwrap();
        assert_eq!(
            comments[0].picture.as_deref(),
            Some("file:///sdcard/a%20b.jpg")
        );
        let attachments = db.get_attachments("t").unwrap();
        assert_eq!(attachments[0].uri.as_deref(), Some("file:///sdcard/doc.pdf"));

        let current = setup_db();
        import(&current, &backup(V6_4, data));
        let comments = current.get_comments("t").unwrap();
        assert_eq!(
            comments[0].picture.as_deref(),
            Some("{\"path\":\"/sdcard/a b.jpg\"}")
        );
    }

    #[test]
    fn local_tasks_moved_below_v9_6() {
        let db = setup_db();
        import(
            &db,
            &backup(
                V9_6 - 1,
                json!({
                    "tasks": [
                        task("local"),
                        {
                            "task": { "remoteId": "synced" },
                            "google": [{ "remoteId": "g", "listId": "L" }]
                        }
                    ]
                }),
            ),
        );

        let local = db.get_task_by_uuid("local").unwrap().unwrap();
        let synced = db.get_task_by_uuid("synced").unwrap().unwrap();
        assert_eq!(db.get_caldav_tasks(local.id).unwrap().len(), 1);
        assert!(db.get_caldav_tasks(synced.id).unwrap().is_empty());
        assert_eq!(db.get_all_caldav_accounts().unwrap().len(), 1);
    }

    #[test]
    fn local_tasks_left_alone_at_v9_6() {
        let db = setup_db();
        import(&db, &backup(V9_6, json!({ "tasks": [task("local")] })));
        assert_eq!(db.count_rows("caldav_tasks").unwrap(), 0);
        assert_eq!(db.count_rows("caldav_accounts").unwrap(), 0);
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn failed_import_rolls_back() {
        let db = setup_db();
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_alarms BEFORE INSERT ON alarms
                 BEGIN SELECT RAISE(ABORT, 'alarm rejected'); END;",
            )?;
            Ok(())
        })
        .unwrap();
        let mut rx = db.events().subscribe();

        let doc = backup(
            CURRENT_VERSION,
            json!({
                "tags": [{ "remoteId": "tag" }],
                "tasks": [task("a"), { "task": { "remoteId": "b" }, "alarms": [{ "time": 5 }] }],
                "stringPrefs": { "language": "de" }
            }),
        );
        let err = db
            .import_backup(&doc, &ImportOptions::default(), None)
            .unwrap_err();
        assert!(matches!(err, ImportError::Storage(_)));

        assert_eq!(db.count_rows("tasks").unwrap(), 0);
        assert_eq!(db.count_rows("tag_data").unwrap(), 0);
        assert_eq!(db.get_string("language").unwrap(), None);
        assert_eq!(rx.try_recv().unwrap(), BroadcastEvent::Refresh);
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let db = setup_db();
        let dir = tempfile::tempdir().unwrap();
        let err = db
            .import_file(&dir.path().join("missing.json"), &ImportOptions::default(), None)
            .unwrap_err();
        assert!(matches!(err, ImportError::InputNotFound { .. }));
        assert_eq!(err.kind(), "input_not_found");
    }

    #[test]
    fn malformed_file_is_typed_error() {
        let db = setup_db();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ \"version\": 1, \"data\": [").unwrap();

        let err = db
            .import_file(file.path(), &ImportOptions::default(), None)
            .unwrap_err();
        assert!(matches!(err, ImportError::MalformedDocument(_)));
        assert_eq!(db.count_rows("tasks").unwrap(), 0);
    }
}

mod progress_tests {
    use super::*;
    use tasks_backup::progress::ProgressSink;

    #[test]
    fn progress_counts_records_seen() {
        let db = setup_db();
        import(&db, &backup(CURRENT_VERSION, json!({ "tasks": [task("a")] })));

        let (tx, rx) = mpsc::channel::<String>();
        let sink: &dyn ProgressSink = &tx;
        db.import_backup(
            &backup(CURRENT_VERSION, json!({ "tasks": [task("a"), task("b")] })),
            &ImportOptions::default(),
            Some(sink),
        )
        .unwrap();
        drop(tx);

        let messages: Vec<String> = rx.iter().collect();
        assert_eq!(messages, vec!["Reading task 1...", "Reading task 2..."]);
    }
}

mod round_trip_tests {
    use super::*;

    #[test]
    fn export_then_import_into_empty_database() {
        let source = setup_db();
        import(
            &source,
            &backup(
                CURRENT_VERSION,
                json!({
                    "tasks": [
                        task("a"),
                        {
                            "task": { "remoteId": "b" },
                            "alarms": [{ "time": 99 }],
                            "tags": [{ "name": "Home", "tagUid": "tag" }]
                        }
                    ],
                    "tags": [{ "remoteId": "tag", "name": "Home" }],
                    "boolPrefs": { "dark_mode": true }
                }),
            ),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json.gz");
        source.export_backup().unwrap().write_to(&path).unwrap();

        let target = setup_db();
        let result = target
            .import_file(&path, &ImportOptions::default(), None)
            .unwrap();
        assert_eq!(result.import_count, 2);
        assert_eq!(target.count_rows("tasks").unwrap(), 2);
        assert_eq!(target.count_rows("alarms").unwrap(), 1);
        assert_eq!(target.count_rows("tags").unwrap(), 1);
        assert_eq!(target.get_bool("dark_mode").unwrap(), Some(true));

        let again = target
            .import_file(&path, &ImportOptions::default(), None)
            .unwrap();
        assert_eq!(again.skip_count, 2);
    }

    #[test]
    fn preview_does_not_mutate() {
        let db = setup_db();
        import(&db, &backup(CURRENT_VERSION, json!({ "tasks": [task("a")] })));

        let doc = backup(
            V8_2 - 1,
            json!({
                "tasks": [task("a"), task("b")],
                "tags": [{ "remoteId": "tag" }]
            }),
        );
        let preview = db
            .preview_import(&doc, &MigrationRegistry::standard())
            .unwrap();
        assert_eq!(preview.task_count, 2);
        assert_eq!(preview.would_import, 1);
        assert_eq!(preview.would_skip, 1);
        assert_eq!(preview.total_would_insert(), 1);
        assert!(!preview.migrations.is_empty());

        assert_eq!(db.count_rows("tasks").unwrap(), 1);
        assert_eq!(db.count_rows("tag_data").unwrap(), 0);

        let result = import(&db, &doc);
        assert_eq!(result.import_count, preview.would_import);
        assert_eq!(result.skip_count, preview.would_skip);
    }
}
