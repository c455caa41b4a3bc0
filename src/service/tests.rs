use super::*;

fn service() -> NoteService {
    let db = Database::in_memory().expect("failed to create in-memory database");
    NoteService::new(db)
}

#[test]
fn note_service_construction_with_in_memory_database() {
    let service = service();

    // Quick smoke test - verify schema is initialized
    let count: i64 = service
        .database()
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='notes'",
            [],
            |row| row.get(0),
        )
        .expect("failed to query schema");

    assert_eq!(count, 1, "expected the notes table to exist");
}

// --- create ---

#[test]
fn create_note_returns_note_with_store_assigned_id() {
    let service = service();

    let note = service
        .create_note("Groceries", "milk, eggs")
        .expect("failed to create note");

    assert!(note.id().get() > 0, "note ID should be positive");
    assert_eq!(note.title(), "Groceries");
    assert_eq!(note.content(), "milk, eggs");
}

#[test]
fn create_then_list_contains_exactly_one_matching_note() {
    let service = service();

    service
        .create_note("Budget", "rent, food")
        .expect("failed to create note");

    let notes = service.list_notes().expect("failed to list notes");
    let matching: Vec<_> = notes
        .iter()
        .filter(|n| n.title() == "Budget" && n.content() == "rent, food")
        .collect();

    assert_eq!(matching.len(), 1);
    assert!(matching[0].id().get() >= 0, "id should be store-assigned");
}

#[test]
fn create_note_with_empty_title_fails_validation() {
    let service = service();

    let result = service.create_note("", "content");
    assert!(matches!(
        result,
        Err(ServiceError::Validation { field: "title" })
    ));
}

#[test]
fn create_note_with_whitespace_content_fails_validation() {
    let service = service();

    let result = service.create_note("title", "   \n\t  ");
    assert!(matches!(
        result,
        Err(ServiceError::Validation { field: "content" })
    ));
}

#[test]
fn created_ids_are_unique_and_increasing() {
    let service = service();

    let first = service.create_note("First", "a").unwrap();
    let second = service.create_note("Second", "b").unwrap();
    let third = service.create_note("Third", "c").unwrap();

    assert_eq!(first.id().get(), 1);
    assert_eq!(second.id().get(), 2);
    assert_eq!(third.id().get(), 3);
}

// --- get ---

#[test]
fn get_note_returns_none_for_non_existent_id() {
    let service = service();

    let result = service
        .get_note(NoteId::new(999))
        .expect("get_note should not error for non-existent ID");

    assert_eq!(result, None);
}

#[test]
fn get_note_returns_persisted_note() {
    let service = service();

    let created = service
        .create_note("Original", "Original content")
        .expect("failed to create note");

    let retrieved = service
        .get_note(created.id())
        .expect("failed to get note")
        .expect("note should exist");

    assert_eq!(retrieved.id(), created.id());
    assert_eq!(retrieved.title(), "Original");
    assert_eq!(retrieved.content(), "Original content");
    assert_eq!(retrieved.created_at(), created.created_at());
}

// --- edit ---

#[test]
fn edit_note_updates_title_and_content_with_unchanged_id() {
    let service = service();

    let created = service.create_note("Old title", "Old content").unwrap();
    let edited = service
        .edit_note(created.id(), "New title", "New content")
        .expect("failed to edit note");

    assert_eq!(edited.id(), created.id());
    assert_eq!(edited.title(), "New title");
    assert_eq!(edited.content(), "New content");
    assert_eq!(edited.created_at(), created.created_at());

    // The edit is visible through list
    let notes = service.list_notes().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title(), "New title");
    assert_eq!(notes[0].content(), "New content");
}

#[test]
fn edit_note_on_nonexistent_id_yields_not_found() {
    let service = service();

    let result = service.edit_note(NoteId::new(42), "t", "c");
    assert!(matches!(result, Err(ServiceError::NotFound(id)) if id == NoteId::new(42)));
}

#[test]
fn edit_note_with_empty_field_yields_validation_error() {
    let service = service();
    let created = service.create_note("t", "c").unwrap();

    let result = service.edit_note(created.id(), "", "c");
    assert!(matches!(result, Err(ServiceError::Validation { .. })));

    // Note unchanged after the failed edit
    let unchanged = service.get_note(created.id()).unwrap().unwrap();
    assert_eq!(unchanged.title(), "t");
}

#[test]
fn edit_note_bumps_updated_at_not_created_at() {
    let service = service();

    let created = service.create_note("t", "c").unwrap();
    let edited = service.edit_note(created.id(), "t2", "c2").unwrap();

    assert_eq!(edited.created_at(), created.created_at());
    assert!(edited.updated_at() >= created.updated_at());
}

// --- delete ---

#[test]
fn delete_note_removes_it_from_list() {
    let service = service();

    let keep = service.create_note("Keep", "keep").unwrap();
    let drop = service.create_note("Drop", "drop").unwrap();

    service.delete_note(drop.id()).expect("failed to delete");

    let notes = service.list_notes().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id(), keep.id());
    assert!(notes.iter().all(|n| n.id() != drop.id()));
}

#[test]
fn delete_note_on_nonexistent_id_yields_not_found() {
    let service = service();

    let result = service.delete_note(NoteId::new(7));
    assert!(matches!(result, Err(ServiceError::NotFound(id)) if id == NoteId::new(7)));
}

#[test]
fn delete_twice_yields_not_found_on_second_call() {
    let service = service();

    let note = service.create_note("Once", "once").unwrap();
    service.delete_note(note.id()).unwrap();

    let result = service.delete_note(note.id());
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

// --- list ---

#[test]
fn list_notes_on_empty_database_returns_empty_vec() {
    let service = service();

    let notes = service.list_notes().expect("failed to list notes");
    assert!(notes.is_empty());
}

#[test]
fn list_notes_returns_full_table_ordered_by_id() {
    let service = service();

    service.create_note("A", "a").unwrap();
    service.create_note("B", "b").unwrap();
    service.create_note("C", "c").unwrap();

    let notes = service.list_notes().unwrap();
    assert_eq!(notes.len(), 3);
    let ids: Vec<i64> = notes.iter().map(|n| n.id().get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

// --- errors ---

#[test]
fn validation_and_not_found_are_user_errors() {
    assert!(ServiceError::Validation { field: "title" }.is_user_error());
    assert!(ServiceError::NotFound(NoteId::new(1)).is_user_error());
    assert!(!ServiceError::Storage(rusqlite::Error::QueryReturnedNoRows).is_user_error());
}

#[test]
fn error_messages_name_the_offending_input() {
    let validation = ServiceError::Validation { field: "content" };
    assert_eq!(validation.to_string(), "content cannot be empty");

    let not_found = ServiceError::NotFound(NoteId::new(12));
    assert_eq!(not_found.to_string(), "note 12 not found");
}
