use chime_core::db::open_db_in_memory;
use chime_core::{Reminder, ReminderStore, ReminderValidationError, SqliteReminderStore, StoreError};

#[test]
fn insert_assigns_id_and_round_trips_offsets_exactly() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);
    let times = vec![22.5, 7.1 + 0.2, 0.0, 7.3, 23.999];

    let id = store
        .insert(&Reminder::new("Meds", "Take with water", times.clone()))
        .unwrap();

    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.id, Some(id));
    assert_eq!(loaded.title, "Meds");
    assert_eq!(loaded.body, "Take with water");
    assert_eq!(loaded.times, times);
    assert_eq!(
        loaded.times.iter().map(|t| t.to_bits()).collect::<Vec<_>>(),
        times.iter().map(|t| t.to_bits()).collect::<Vec<_>>()
    );
}

#[test]
fn insert_rejects_already_persisted_reminder() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);

    let err = store
        .insert(&Reminder::new("Meds", "", vec![9.0]).with_id(4))
        .unwrap_err();

    assert!(matches!(err, StoreError::IdentityAlreadyAssigned(4)));
}

#[test]
fn insert_validates_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);

    let err = store
        .insert(&Reminder::new(" ", "", vec![9.0]))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ReminderValidationError::EmptyTitle)
    ));

    let err = store
        .insert(&Reminder::new("Late", "", vec![24.5]))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ReminderValidationError::InvalidOffset { slot: 0, .. })
    ));

    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn update_replaces_fields_and_keeps_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);
    let id = store
        .insert(&Reminder::new("Walk", "", vec![8.0, 18.0]))
        .unwrap();

    let updated = Reminder::new("Evening walk", "Leash!", vec![19.5]).with_id(id);
    store.update(&updated).unwrap();

    assert_eq!(store.get(id).unwrap().unwrap(), updated);
}

#[test]
fn update_unknown_or_unsaved_reminder_fails() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);

    let err = store
        .update(&Reminder::new("Ghost", "", vec![]).with_id(99))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(99)));

    let err = store
        .update(&Reminder::new("Unsaved", "", vec![]))
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingIdentity));
}

#[test]
fn remove_deletes_row_and_reports_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);
    let id = store.insert(&Reminder::new("Read", "", vec![21.0])).unwrap();

    store.remove(id).unwrap();

    assert!(store.get(id).unwrap().is_none());
    assert!(matches!(store.remove(id).unwrap_err(), StoreError::NotFound(missing) if missing == id));
}

#[test]
fn removed_ids_are_never_reassigned() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);
    let first = store.insert(&Reminder::new("One", "", vec![])).unwrap();
    let second = store.insert(&Reminder::new("Two", "", vec![])).unwrap();
    store.remove(second).unwrap();

    let third = store.insert(&Reminder::new("Three", "", vec![])).unwrap();

    assert!(third > second);
    assert!(second > first);
}

#[test]
fn list_all_is_ordered_by_id_and_preserves_offset_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);
    let a = store
        .insert(&Reminder::new("A", "", vec![20.0, 8.0, 8.0]))
        .unwrap();
    let b = store.insert(&Reminder::new("B", "", vec![])).unwrap();

    let all = store.list_all().unwrap();

    assert_eq!(
        all.iter().map(|r| r.id.unwrap()).collect::<Vec<_>>(),
        vec![a, b]
    );
    assert_eq!(all[0].times, vec![20.0, 8.0, 8.0]);
    assert!(all[1].times.is_empty());
}

#[test]
fn corrupted_rows_are_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteReminderStore::new(&conn);
    conn.execute(
        "INSERT INTO reminders (id, title, body, times_json) VALUES (5, 'Bad', '', '[8.0, 30.0]');",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO reminders (id, title, body, times_json) VALUES (6, 'Worse', '', 'not json');",
        [],
    )
    .unwrap();

    assert!(matches!(
        store.get(5).unwrap_err(),
        StoreError::InvalidData(_)
    ));
    assert!(matches!(
        store.get(6).unwrap_err(),
        StoreError::InvalidData(_)
    ));
    assert!(matches!(
        store.list_all().unwrap_err(),
        StoreError::InvalidData(_)
    ));
}
