//! Terminal user interface for notetaker.
//!
//! Renders the note list with a search bar and detail view, plus the
//! create, edit-in-place, and suggestion-review forms, using ratatui for
//! rendering and crossterm for terminal management. All store and
//! generation calls run on the worker thread; the event loop applies
//! optimistic patches to the cache when a mutation starts and settles
//! them when the worker reports back.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

mod app;
pub mod event;
mod ui;
pub mod worker;

pub use app::{App, Focus, FormField, Mode, NoteForm};

use event::Action;
use worker::{Outcome, Request, Worker};

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// Disables raw mode and leaves the alternate screen. This should always
/// be called before exiting the TUI, even in error cases, to prevent
/// terminal corruption.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic handler.
///
/// Does not require a Terminal reference, making it safe to call from a
/// panic hook. Ignores errors since we're likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Initializes a panic hook that restores the terminal before panicking.
///
/// The original panic hook is preserved and called after restoration.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Entry point for the TUI application.
///
/// Opens the database, spawns the worker thread, requests the initial
/// list, and runs the event loop until the user quits.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, the terminal
/// cannot be initialized, or the worker thread dies.
pub fn run() -> Result<()> {
    init_panic_hook();

    let db_path = crate::utils::get_database_path().context("Failed to get database path")?;
    crate::utils::ensure_database_directory(&db_path)
        .context("Failed to ensure database directory")?;

    let db = crate::Database::open(&db_path).context("Failed to open database")?;
    let worker = Worker::spawn(db);

    let mut app = App::new();
    worker.send(Request::Refresh)?;

    run_event_loop(&mut app, &worker)
}

/// Runs the main event loop for the TUI.
///
/// Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, worker: &Worker) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, worker, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    worker: &Worker,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        // Settle everything the worker has finished since the last tick
        while let Some(outcome) = worker.try_recv() {
            apply_outcome(app, outcome);
        }

        // A settled delete asks for an authoritative re-list
        if app.cache_mut().take_refresh_request() {
            worker.send(Request::Refresh)?;
        }

        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && let Some(action) = event::handle_key_event(app, key)
        {
            if matches!(action, Action::Quit) {
                break;
            }
            dispatch(app, worker, action)?;
        }
    }

    Ok(())
}

/// Starts the optimistic patch for an action and hands the store call to
/// the worker.
fn dispatch(app: &mut App, worker: &Worker, action: Action) -> Result<()> {
    match action {
        Action::Quit => {}
        Action::SubmitCreate { title, content } => {
            app.clear_status();
            let ticket = app.cache_mut().begin_create(&title, &content);
            worker.send(Request::Create {
                ticket,
                title,
                content,
            })?;
        }
        Action::SubmitEdit { id, title, content } => {
            app.clear_status();
            match app.cache_mut().begin_edit(id, &title, &content) {
                Ok(ticket) => {
                    worker.send(Request::Edit {
                        ticket,
                        id,
                        title,
                        content,
                    })?;
                }
                Err(rejected) => {
                    app.set_edit_saving(false);
                    app.set_status(rejected.to_string());
                }
            }
        }
        Action::Delete { id } => {
            app.clear_status();
            match app.cache_mut().begin_delete(id) {
                Ok(ticket) => {
                    worker.send(Request::Delete { ticket, id })?;
                }
                Err(rejected) => {
                    app.set_status(rejected.to_string());
                }
            }
        }
        Action::RequestSuggestion { title, content } => {
            worker.send(Request::Suggest { title, content })?;
        }
        Action::Refresh => {
            worker.send(Request::Refresh)?;
        }
    }
    Ok(())
}

/// Settles a worker outcome into the cache and UI state.
fn apply_outcome(app: &mut App, outcome: Outcome) {
    match outcome {
        Outcome::Create { ticket, result } => {
            let failed = result.is_err();
            app.cache_mut().settle_create(ticket, result);
            if failed {
                app.set_status("could not save note");
            }
        }
        Outcome::Edit { ticket, result } => {
            let failed = result.is_err();
            app.cache_mut().settle_edit(ticket, result);
            if failed {
                app.set_edit_saving(false);
                app.set_status("could not save changes");
            } else {
                app.exit_edit_for(ticket.id());
            }
        }
        Outcome::Delete { ticket, result } => {
            let failed = result.is_err();
            app.cache_mut().settle_delete(ticket, result);
            if failed {
                app.set_status("could not delete note");
            }
        }
        Outcome::Refresh { result } => {
            if let Ok(notes) = result {
                app.cache_mut().refresh(notes);
            } else {
                app.set_status("could not load notes");
            }
        }
        Outcome::Suggest { result } => {
            app.set_suggestion_pending(false);
            match result {
                Ok(Some(suggestion)) => app.show_suggestion(suggestion),
                Ok(None) => app.set_status("no suggestion"),
                Err(_) => app.set_status("suggestion unavailable"),
            }
        }
    }
}
