//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Key
//! behavior depends on the active mode and, in browse mode, on which
//! panel has focus. Handlers only touch local UI state; anything that
//! needs the store or the generation service is returned as an `Action`
//! for the event loop to dispatch to the worker.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus, FormField, Mode};
use crate::models::NoteId;

/// Work the event loop must perform in response to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Exit the application.
    Quit,
    /// Start an optimistic create and persist it.
    SubmitCreate { title: String, content: String },
    /// Start an optimistic edit and persist it.
    SubmitEdit {
        id: NoteId,
        title: String,
        content: String,
    },
    /// Start an optimistic delete and persist it.
    Delete { id: NoteId },
    /// Ask the generation service for a content suggestion.
    RequestSuggestion { title: String, content: String },
    /// Fetch the authoritative list from the store.
    Refresh,
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// Returns the `Action` the event loop should dispatch, if any.
///
/// # Key map
///
/// Browse: `Tab` toggles focus, `Esc` returns to search, and with the
/// list focused `j`/`k` navigate, `n` opens the create form, `e` edits,
/// `d` deletes, `s` toggles sort, `r` refreshes, `q` quits.
/// Forms: `Tab` switches fields, `Ctrl+S` submits, `Esc` cancels, and in
/// the create form `Ctrl+G` requests a suggestion. Suggestion review:
/// `y`/`Enter` accepts, `n`/`Esc` rejects.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Action> {
    // Global quit, safe in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match app.mode() {
        Mode::Browse => handle_browse(app, key),
        Mode::Composing { .. } => handle_compose(app, key),
        Mode::ReviewingSuggestion { .. } => {
            handle_review(app, key);
            None
        }
        Mode::Editing { .. } => handle_edit(app, key),
    }
}

fn handle_browse(app: &mut App, key: KeyEvent) -> Option<Action> {
    // Focus handling mirrors the search/list split
    if key.code == KeyCode::Tab || key.code == KeyCode::BackTab {
        app.toggle_focus();
        return None;
    }
    if key.code == KeyCode::Esc {
        app.reset_focus();
        app.clear_selection();
        app.clear_status();
        return None;
    }

    match app.focus() {
        Focus::SearchInput => handle_search_input(app, key),
        Focus::NoteList => handle_note_list(app, key),
    }
}

/// Keyboard input while the search bar is focused: character input edits
/// the filter, Enter jumps to the result list.
fn handle_search_input(app: &mut App, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_search_char(c);
        }
        KeyCode::Backspace => {
            app.pop_search_char();
        }
        KeyCode::Enter => {
            app.toggle_focus();
        }
        _ => {}
    }
    None
}

/// Keyboard input while the note list is focused.
fn handle_note_list(app: &mut App, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') if key.modifiers.is_empty() => return Some(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('n') if key.modifiers.is_empty() => app.open_compose(),
        KeyCode::Char('e') if key.modifiers.is_empty() => app.open_edit(),
        KeyCode::Char('s') if key.modifiers.is_empty() => app.toggle_sort(),
        KeyCode::Char('r') if key.modifiers.is_empty() => return Some(Action::Refresh),
        KeyCode::Char('d') if key.modifiers.is_empty() => {
            if let Some(note) = app.selected_note() {
                if note.is_placeholder() {
                    app.set_status("note is still saving");
                } else {
                    return Some(Action::Delete { id: note.id() });
                }
            }
        }
        _ => {}
    }
    None
}

/// Keyboard input in the create form.
fn handle_compose(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Esc {
        app.close_form();
        return None;
    }

    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return submit_compose(app);
    }

    if key.code == KeyCode::Char('g') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return request_suggestion(app);
    }

    edit_form_buffers(app, key);
    None
}

/// Keyboard input in the edit-in-place form.
fn handle_edit(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Esc {
        app.close_form();
        return None;
    }

    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return submit_edit(app);
    }

    edit_form_buffers(app, key);
    None
}

/// Keyboard input while reviewing a suggestion.
fn handle_review(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => app.accept_suggestion(),
        KeyCode::Char('n') | KeyCode::Esc => app.reject_suggestion(),
        _ => {}
    }
}

/// Shared text editing for both forms: Tab switches fields, Enter moves
/// from title to content or inserts a newline into content.
fn edit_form_buffers(app: &mut App, key: KeyEvent) {
    let Some(form) = app.form_mut() else {
        return;
    };

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
        KeyCode::Enter => match form.field {
            FormField::Title => form.field = FormField::Content,
            FormField::Content => form.push_char('\n'),
        },
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            form.push_char(c);
        }
        _ => {}
    }
}

fn submit_compose(app: &mut App) -> Option<Action> {
    let Mode::Composing { form } = app.mode() else {
        return None;
    };

    if !form.is_submittable() {
        app.set_status("title and content are required");
        return None;
    }

    let action = Action::SubmitCreate {
        title: form.title.clone(),
        content: form.content.clone(),
    };
    // Close immediately: the optimistic placeholder appears in the list
    app.close_form();
    Some(action)
}

fn submit_edit(app: &mut App) -> Option<Action> {
    let Mode::Editing { id, form, saving } = app.mode() else {
        return None;
    };
    if *saving {
        return None;
    }

    if !form.is_submittable() {
        app.set_status("title and content are required");
        return None;
    }

    let action = Action::SubmitEdit {
        id: *id,
        title: form.title.clone(),
        content: form.content.clone(),
    };
    // The form stays open until the write succeeds
    app.set_edit_saving(true);
    Some(action)
}

fn request_suggestion(app: &mut App) -> Option<Action> {
    if app.suggestion_pending() {
        return None;
    }

    let Mode::Composing { form } = app.mode() else {
        return None;
    };
    if !form.is_submittable() {
        app.set_status("write a title and a draft first");
        return None;
    }

    let action = Action::RequestSuggestion {
        title: form.title.clone(),
        content: form.content.clone(),
    };
    app.set_suggestion_pending(true);
    Some(action)
}
