//! Client-side note cache with optimistic list synchronization.
//!
//! `NoteCache` keeps the locally held list of notes visually consistent
//! with user intent while store writes are in flight. Mutations are
//! two-phase: `begin_*` applies the optimistic patch immediately and
//! returns a ticket; `settle_*` reconciles the store's eventual outcome,
//! rolling back to a pre-mutation snapshot on failure. The cache is
//! transport-agnostic: the TUI worker thread, the CLI, and tests all
//! drive it the same way.

use std::collections::HashMap;

use thiserror::Error;
use time::OffsetDateTime;

use crate::models::{Note, NoteBuilder, NoteId};

/// Client-side sort key for the displayed note list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Alphabetical by title (case-insensitive, ascending).
    #[default]
    Title,
    /// Newest first (created_at, strictly descending).
    Date,
}

/// Why a `begin_*` call refused to start a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MutationRejected {
    /// Another mutation for this note id has not settled yet. At most
    /// one in-flight mutation per id is permitted.
    #[error("a mutation for note {0} is already in flight")]
    InFlight(NoteId),

    /// The id does not refer to a cached note.
    #[error("note {0} is not in the cached list")]
    UnknownNote(NoteId),
}

/// Handle to an in-flight mutation, capturing the affected note id at
/// mutation start. Settling a create looks the placeholder up by this
/// id, never by list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationTicket {
    id: NoteId,
}

impl MutationTicket {
    /// Returns the note id this mutation affects (the placeholder id for
    /// creates).
    pub fn id(self) -> NoteId {
        self.id
    }
}

/// Kind of pending mutation affecting a note, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    /// Placeholder awaiting store confirmation.
    Create,
    /// Optimistically patched, write in flight.
    Edit,
    /// Marked for deletion, outcome unknown.
    Delete,
}

#[derive(Debug, Clone)]
enum PendingOp {
    Create { snapshot: Vec<Note> },
    Edit { snapshot: Vec<Note> },
    Delete,
}

impl PendingOp {
    fn kind(&self) -> PendingKind {
        match self {
            PendingOp::Create { .. } => PendingKind::Create,
            PendingOp::Edit { .. } => PendingKind::Edit,
            PendingOp::Delete => PendingKind::Delete,
        }
    }
}

/// Optimistically synchronized list of notes.
pub struct NoteCache {
    notes: Vec<Note>,
    /// Next placeholder id. Owned by this instance, starts at -1 and
    /// decreases monotonically, so placeholders never collide with
    /// store-assigned positive ids or with each other.
    next_placeholder: i64,
    pending: HashMap<NoteId, PendingOp>,
    refresh_wanted: bool,
}

impl NoteCache {
    /// Creates an empty cache. The placeholder sequence resets with each
    /// instance, i.e. at session start.
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            next_placeholder: -1,
            pending: HashMap::new(),
            refresh_wanted: false,
        }
    }

    /// Returns the cached notes in cache order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Returns the pending-mutation kind for a note, if any. The UI uses
    /// this to mark placeholders as saving and deletions as dimmed.
    pub fn pending_kind(&self, id: NoteId) -> Option<PendingKind> {
        self.pending.get(&id).map(PendingOp::kind)
    }

    /// Returns true while any edit mutation is unsettled. List refreshes
    /// are suppressed during this window so a stale refresh cannot
    /// overwrite the optimistic patch.
    pub fn edit_in_flight(&self) -> bool {
        self.pending
            .values()
            .any(|op| matches!(op, PendingOp::Edit { .. }))
    }

    /// Replaces the cached list with an authoritative one from the store.
    ///
    /// Returns false without applying if an edit is in flight. Create and
    /// delete mutations do not suppress refreshes.
    pub fn refresh(&mut self, notes: Vec<Note>) -> bool {
        if self.edit_in_flight() {
            return false;
        }
        self.notes = notes;
        true
    }

    /// Takes the pending refresh request raised by a settled delete.
    /// Returns true at most once per request.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_wanted)
    }

    /// Starts an optimistic create.
    ///
    /// Captures a full-list snapshot, then appends a placeholder note
    /// with a fresh negative id and client-assigned current timestamps.
    /// Always succeeds: every create gets its own placeholder.
    pub fn begin_create(&mut self, title: &str, content: &str) -> MutationTicket {
        let snapshot = self.notes.clone();

        let id = NoteId::new(self.next_placeholder);
        self.next_placeholder -= 1;

        let now = OffsetDateTime::now_utc();
        let placeholder = NoteBuilder::new()
            .id(id)
            .title(title)
            .content(content)
            .created_at(now)
            .updated_at(now)
            .build();

        self.notes.push(placeholder);
        self.pending.insert(id, PendingOp::Create { snapshot });

        MutationTicket { id }
    }

    /// Settles a create.
    ///
    /// On success the placeholder is replaced in place by the
    /// store-confirmed note, looked up by the placeholder id from the
    /// ticket. If a concurrent refresh already dropped the placeholder,
    /// the confirmed note is appended unless its id is already present.
    /// On failure the entire list reverts to the pre-placeholder
    /// snapshot.
    pub fn settle_create(&mut self, ticket: MutationTicket, outcome: Result<Note, anyhow::Error>) {
        let Some(op) = self.pending.remove(&ticket.id) else {
            return;
        };
        let PendingOp::Create { snapshot } = op else {
            return;
        };

        match outcome {
            Ok(confirmed) => {
                if let Some(entry) = self.notes.iter_mut().find(|n| n.id() == ticket.id) {
                    *entry = confirmed;
                } else if self.notes.iter().all(|n| n.id() != confirmed.id()) {
                    self.notes.push(confirmed);
                }
            }
            Err(_) => {
                self.notes = snapshot;
            }
        }
    }

    /// Starts an optimistic edit.
    ///
    /// Captures a snapshot, then patches the matching entry's title and
    /// content in place, leaving id and timestamps untouched. Rejected if
    /// the id is unknown or already has an unsettled mutation.
    pub fn begin_edit(
        &mut self,
        id: NoteId,
        title: &str,
        content: &str,
    ) -> Result<MutationTicket, MutationRejected> {
        if self.pending.contains_key(&id) {
            return Err(MutationRejected::InFlight(id));
        }
        if !self.notes.iter().any(|n| n.id() == id) {
            return Err(MutationRejected::UnknownNote(id));
        }

        let snapshot = self.notes.clone();
        if let Some(entry) = self.notes.iter_mut().find(|n| n.id() == id) {
            entry.patch(title, content);
        }
        self.pending.insert(id, PendingOp::Edit { snapshot });

        Ok(MutationTicket { id })
    }

    /// Settles an edit.
    ///
    /// On success the patched state is left as-is (it already matches the
    /// store); the returned note is not merged, the next refresh
    /// reconciles timestamps. On failure the entire list reverts to the
    /// pre-mutation snapshot.
    pub fn settle_edit(&mut self, ticket: MutationTicket, outcome: Result<Note, anyhow::Error>) {
        let Some(op) = self.pending.remove(&ticket.id) else {
            return;
        };
        let PendingOp::Edit { snapshot } = op else {
            return;
        };

        if outcome.is_err() {
            self.notes = snapshot;
        }
    }

    /// Starts an optimistic delete.
    ///
    /// The entry is only marked pending-deletion, not removed: the result
    /// is not locally known until the store confirms. Rejected if the id
    /// is unknown or already has an unsettled mutation.
    pub fn begin_delete(&mut self, id: NoteId) -> Result<MutationTicket, MutationRejected> {
        if self.pending.contains_key(&id) {
            return Err(MutationRejected::InFlight(id));
        }
        if !self.notes.iter().any(|n| n.id() == id) {
            return Err(MutationRejected::UnknownNote(id));
        }

        self.pending.insert(id, PendingOp::Delete);
        Ok(MutationTicket { id })
    }

    /// Settles a delete.
    ///
    /// On success the entry is removed, the marker cleared, and a full
    /// refresh from the store requested. On failure the marker is cleared
    /// and the note left intact.
    pub fn settle_delete(&mut self, ticket: MutationTicket, outcome: Result<(), anyhow::Error>) {
        let Some(op) = self.pending.remove(&ticket.id) else {
            return;
        };
        if !matches!(op, PendingOp::Delete) {
            return;
        }

        if outcome.is_ok() {
            self.notes.retain(|n| n.id() != ticket.id);
            self.refresh_wanted = true;
        }
    }

    /// Returns the notes matching `query`, ordered by `sort`.
    ///
    /// The filter is a case-insensitive substring match over title or
    /// content; an empty query matches everything.
    pub fn visible(&self, query: &str, sort: SortBy) -> Vec<&Note> {
        let needle = query.to_lowercase();

        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|note| {
                needle.is_empty()
                    || note.title().to_lowercase().contains(&needle)
                    || note.content().to_lowercase().contains(&needle)
            })
            .collect();

        match sort {
            SortBy::Title => {
                notes.sort_by(|a, b| a.title().to_lowercase().cmp(&b.title().to_lowercase()));
            }
            SortBy::Date => {
                notes.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            }
        }

        notes
    }
}

impl Default for NoteCache {
    fn default() -> Self {
        Self::new()
    }
}
