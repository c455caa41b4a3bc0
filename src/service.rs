use thiserror::Error;
use time::OffsetDateTime;

use crate::{Database, Note, NoteBuilder, NoteId};

/// Errors produced by note service operations.
///
/// Storage errors propagate untranslated; validation and lookup failures
/// are typed so callers (and exit-code mapping) can distinguish user
/// errors from internal ones.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required text field was empty or whitespace-only.
    #[error("{field} cannot be empty")]
    Validation {
        /// The offending field name ("title" or "content").
        field: &'static str,
    },

    /// The operation referenced a note id that does not exist.
    #[error("note {0} not found")]
    NotFound(NoteId),

    /// The underlying store call failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored timestamp was outside the representable range.
    #[error("invalid stored timestamp: {0}")]
    Timestamp(#[from] time::error::ComponentRange),
}

impl ServiceError {
    /// Returns true for errors caused by caller input rather than the
    /// store itself. Used by the CLI to pick exit codes.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation { .. } | ServiceError::NotFound(_)
        )
    }
}

/// Service layer providing note management operations.
///
/// NoteService owns a Database instance and provides the create, edit,
/// delete, and list operations over the notes table. It is UI-independent
/// and shared by the CLI, the TUI worker thread, and tests.
///
/// # Examples
///
/// ```
/// use notetaker::{Database, NoteService};
///
/// # fn main() -> anyhow::Result<()> {
/// let db = Database::in_memory()?;
/// let service = NoteService::new(db);
///
/// let note = service.create_note("Groceries", "milk, eggs")?;
/// assert!(note.id().get() > 0);
/// # Ok(())
/// # }
/// ```
pub struct NoteService {
    db: Database,
}

impl NoteService {
    /// Creates a new NoteService with the given database.
    ///
    /// Takes ownership of the database instance. The service becomes the
    /// sole owner and manages all store operations through its methods.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    ///
    /// Useful for testing or advanced operations that need direct access.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates a new note with the given title and content.
    ///
    /// Inserts the note with current Unix timestamps for both
    /// `created_at` and `updated_at` and returns the fully populated
    /// `Note` with its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if title or content is empty
    /// or whitespace-only.
    pub fn create_note(&self, title: &str, content: &str) -> Result<Note, ServiceError> {
        validate_fields(title, content)?;

        let conn = self.db.connection();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        conn.execute(
            "INSERT INTO notes (title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            (title, content, now, now),
        )?;

        let note_id = conn.last_insert_rowid();

        Ok(NoteBuilder::new()
            .id(NoteId::new(note_id))
            .title(title)
            .content(content)
            .created_at(OffsetDateTime::from_unix_timestamp(now)?)
            .updated_at(OffsetDateTime::from_unix_timestamp(now)?)
            .build())
    }

    /// Retrieves a note by its ID.
    ///
    /// Returns `None` if no note exists with the given ID. This is not
    /// considered an error condition.
    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>, ServiceError> {
        let conn = self.db.connection();

        let mut stmt = conn.prepare(
            "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?1",
        )?;

        let result = stmt.query_row([id.get()], note_from_row);

        match result {
            Ok(row) => Ok(Some(row_to_note(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Updates an existing note's title and content.
    ///
    /// Bumps `updated_at` to the current time; `id` and `created_at` are
    /// immutable. Returns the updated note.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` on empty fields and
    /// `ServiceError::NotFound` if no note with `id` exists.
    pub fn edit_note(&self, id: NoteId, title: &str, content: &str) -> Result<Note, ServiceError> {
        validate_fields(title, content)?;

        let existing = self.get_note(id)?.ok_or(ServiceError::NotFound(id))?;

        let conn = self.db.connection();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        conn.execute(
            "UPDATE notes SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
            (title, content, now, id.get()),
        )?;

        Ok(NoteBuilder::new()
            .id(id)
            .title(title)
            .content(content)
            .created_at(existing.created_at())
            .updated_at(OffsetDateTime::from_unix_timestamp(now)?)
            .build())
    }

    /// Deletes a note by its ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no note with `id` exists.
    pub fn delete_note(&self, id: NoteId) -> Result<(), ServiceError> {
        let conn = self.db.connection();

        let deleted = conn.execute("DELETE FROM notes WHERE id = ?1", [id.get()])?;
        if deleted == 0 {
            return Err(ServiceError::NotFound(id));
        }

        Ok(())
    }

    /// Lists all notes.
    ///
    /// Returns the full table with no filtering or pagination, ordered by
    /// id for determinism. Callers sort for display client-side.
    pub fn list_notes(&self) -> Result<Vec<Note>, ServiceError> {
        let conn = self.db.connection();

        let mut stmt = conn.prepare(
            "SELECT id, title, content, created_at, updated_at FROM notes ORDER BY id",
        )?;

        let rows = stmt.query_map([], note_from_row)?;

        let mut notes = Vec::new();
        for row_result in rows {
            notes.push(row_to_note(row_result?)?);
        }

        Ok(notes)
    }
}

/// Raw column tuple for a notes row.
type NoteRow = (i64, String, String, i64, i64);

fn note_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn row_to_note(row: NoteRow) -> Result<Note, ServiceError> {
    let (id, title, content, created_at, updated_at) = row;
    Ok(NoteBuilder::new()
        .id(NoteId::new(id))
        .title(title)
        .content(content)
        .created_at(OffsetDateTime::from_unix_timestamp(created_at)?)
        .updated_at(OffsetDateTime::from_unix_timestamp(updated_at)?)
        .build())
}

fn validate_fields(title: &str, content: &str) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation { field: "title" });
    }
    if content.trim().is_empty() {
        return Err(ServiceError::Validation { field: "content" });
    }
    Ok(())
}

#[cfg(test)]
#[path = "service/tests.rs"]
mod tests;
