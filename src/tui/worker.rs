//! Background worker for store and suggestion calls.
//!
//! The event loop must never block on the network or the database, so
//! all writes, refreshes, and suggestion requests run on a dedicated
//! thread owning its own `NoteService` and `ContentSuggester`. Requests
//! and outcomes flow over mpsc channels; the event loop polls outcomes
//! each tick and settles them into the cache.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::Database;
use crate::cache::MutationTicket;
use crate::models::{Note, NoteId};
use crate::ollama::OllamaClientBuilder;
use crate::service::NoteService;
use crate::suggest::ContentSuggester;

/// A unit of work for the worker thread.
#[derive(Debug)]
pub enum Request {
    /// Persist a new note; `ticket` refers to the optimistic placeholder.
    Create {
        ticket: MutationTicket,
        title: String,
        content: String,
    },
    /// Persist an edit to an existing note.
    Edit {
        ticket: MutationTicket,
        id: NoteId,
        title: String,
        content: String,
    },
    /// Delete an existing note.
    Delete { ticket: MutationTicket, id: NoteId },
    /// Fetch the full authoritative list.
    Refresh,
    /// Ask the generation service for a content suggestion.
    Suggest { title: String, content: String },
}

/// The settled result of a request, echoed back with its ticket so the
/// cache can reconcile the matching optimistic patch.
#[derive(Debug)]
pub enum Outcome {
    Create {
        ticket: MutationTicket,
        result: Result<Note>,
    },
    Edit {
        ticket: MutationTicket,
        result: Result<Note>,
    },
    Delete {
        ticket: MutationTicket,
        result: Result<()>,
    },
    Refresh {
        result: Result<Vec<Note>>,
    },
    Suggest {
        result: Result<Option<String>>,
    },
}

/// Handle to the worker thread.
///
/// Dropping the handle closes the request channel, which ends the worker
/// loop.
pub struct Worker {
    requests: Sender<Request>,
    outcomes: Receiver<Outcome>,
}

impl Worker {
    /// Spawns the worker thread over its own database connection.
    ///
    /// The suggestion client is built lazily from the environment
    /// (`OLLAMA_HOST`, `OLLAMA_MODEL`); a misconfigured client surfaces
    /// as an error outcome on the first suggestion request rather than
    /// preventing startup.
    pub fn spawn(db: Database) -> Self {
        let (request_tx, request_rx) = mpsc::channel();
        let (outcome_tx, outcome_rx) = mpsc::channel();

        thread::spawn(move || run(db, request_rx, outcome_tx));

        Self {
            requests: request_tx,
            outcomes: outcome_rx,
        }
    }

    /// Queues a request for the worker.
    ///
    /// # Errors
    ///
    /// Fails only if the worker thread has exited.
    pub fn send(&self, request: Request) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| anyhow!("worker thread has exited"))
    }

    /// Returns the next settled outcome without blocking, if any.
    pub fn try_recv(&self) -> Option<Outcome> {
        self.outcomes.try_recv().ok()
    }

    /// Waits up to `timeout` for the next settled outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Outcome> {
        self.outcomes.recv_timeout(timeout).ok()
    }
}

fn run(db: Database, requests: Receiver<Request>, outcomes: Sender<Outcome>) {
    let service = NoteService::new(db);
    let suggester = OllamaClientBuilder::new()
        .build()
        .map(|client| ContentSuggester::new(Arc::new(client)));

    for request in requests {
        let outcome = handle_request(&service, &suggester, request);
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}

fn handle_request(
    service: &NoteService,
    suggester: &Result<ContentSuggester, crate::ollama::OllamaError>,
    request: Request,
) -> Outcome {
    match request {
        Request::Create {
            ticket,
            title,
            content,
        } => Outcome::Create {
            ticket,
            result: service
                .create_note(&title, &content)
                .context("failed to create note"),
        },
        Request::Edit {
            ticket,
            id,
            title,
            content,
        } => Outcome::Edit {
            ticket,
            result: service
                .edit_note(id, &title, &content)
                .context("failed to edit note"),
        },
        Request::Delete { ticket, id } => Outcome::Delete {
            ticket,
            result: service.delete_note(id).context("failed to delete note"),
        },
        Request::Refresh => Outcome::Refresh {
            result: service.list_notes().context("failed to list notes"),
        },
        Request::Suggest { title, content } => Outcome::Suggest {
            result: match suggester {
                Ok(suggester) => suggester
                    .suggest(&title, &content)
                    .context("suggestion request failed"),
                Err(e) => Err(anyhow!("suggestion client unavailable: {e}")),
            },
        },
    }
}
