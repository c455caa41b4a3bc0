//! UI rendering functions for the TUI.
//!
//! Implements the note-list layout with search input, list panel, detail
//! view, and the create/edit/suggestion forms, using ratatui widgets and
//! layout management. Note content is rendered as markdown.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use time::format_description;

use super::app::{App, Focus, FormField, Mode, NoteForm};
use crate::cache::{PendingKind, SortBy};
use crate::models::Note;

/// Main rendering function for the TUI.
///
/// Draws the search bar, the note list, and either the detail view or
/// the active form, plus the shortcut/status bar at the bottom.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search input
            Constraint::Min(0),    // Content area
            Constraint::Length(1), // Shortcut / status bar
        ])
        .split(size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35), // Note list
            Constraint::Percentage(65), // Detail view or form
        ])
        .split(main_chunks[1]);

    render_search_input(frame, app, main_chunks[0]);
    render_note_list(frame, app, content_chunks[0]);

    match app.mode() {
        Mode::Browse => render_detail_view(frame, app, content_chunks[1]),
        Mode::Composing { form } => render_form(frame, form, "New note", content_chunks[1]),
        Mode::Editing { form, saving, .. } => {
            let title = if *saving { "Edit note (saving...)" } else { "Edit note" };
            render_form(frame, form, title, content_chunks[1]);
        }
        Mode::ReviewingSuggestion { suggestion, .. } => {
            render_suggestion_review(frame, suggestion, content_chunks[1]);
        }
    }

    render_bottom_bar(frame, app, main_chunks[2]);
}

/// Renders the search input panel at the top of the screen.
///
/// The panel title shows the active sort key; a cursor indicator is
/// appended when the search bar is focused.
fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused =
        matches!(app.mode(), Mode::Browse) && matches!(app.focus(), Focus::SearchInput);

    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let sort_label = match app.sort_by() {
        SortBy::Title => "title",
        SortBy::Date => "date",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Search (sort: {sort_label})"))
        .border_style(border_style);

    let mut content = app.search_input().to_string();
    if is_focused {
        content.push('\u{2588}'); // Cursor indicator
    }

    let paragraph = Paragraph::new(content).block(block);

    frame.render_widget(paragraph, area);
}

/// Renders the note list panel.
///
/// Each entry shows the title and creation date. Placeholders and
/// in-flight edits are annotated as saving; entries pending deletion are
/// dimmed.
fn render_note_list(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.mode(), Mode::Browse) && matches!(app.focus(), Focus::NoteList);

    let border_style = if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Notes")
        .border_style(border_style);

    let items: Vec<ListItem> = app
        .visible_notes()
        .into_iter()
        .map(|note| note_list_item(app, note))
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::REVERSED),
    );

    let mut list_state = ListState::default();
    list_state.select(app.selected_index());

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn note_list_item<'a>(app: &App, note: &'a Note) -> ListItem<'a> {
    let date_format = format_description::parse("[year]-[month]-[day]").expect("valid date format");
    let date_str = note
        .created_at()
        .format(&date_format)
        .unwrap_or_else(|_| "????-??-??".to_string());

    let pending = app.cache().pending_kind(note.id());
    let dimmed = matches!(pending, Some(PendingKind::Delete));

    let title_style = if dimmed {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(note.title(), title_style),
        Span::raw(" "),
        Span::styled(
            format!("[{date_str}]"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
    ];

    match pending {
        Some(PendingKind::Create) | Some(PendingKind::Edit) => {
            spans.push(Span::styled(
                " (saving...)",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ));
        }
        Some(PendingKind::Delete) => {
            spans.push(Span::styled(
                " (deleting...)",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ));
        }
        None => {}
    }

    ListItem::new(Line::from(spans))
}

/// Renders the detail view showing the selected note's full content as
/// markdown, with title and timestamps around it.
fn render_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Detail");

    let content = if let Some(note) = app.selected_note() {
        let mut text = Text::default();

        text.lines.push(Line::from(Span::styled(
            note.title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        text.lines.push(Line::from(""));

        let rendered = tui_markdown::from_str(note.content());
        for line in rendered.lines {
            text.lines.push(line);
        }

        let date_format =
            format_description::parse("[year]-[month]-[day] [hour]:[minute]").expect("valid date format");
        let created = note
            .created_at()
            .format(&date_format)
            .unwrap_or_else(|_| "unknown".to_string());
        let updated = note
            .updated_at()
            .format(&date_format)
            .unwrap_or_else(|_| "unknown".to_string());

        text.lines.push(Line::from(""));
        text.lines.push(Line::from(Span::styled(
            format!("created {created} | updated {updated}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));

        text
    } else {
        Text::from("No note selected")
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Renders the create or edit form: a one-line title input above a
/// multi-line content input, the active field highlighted.
fn render_form(frame: &mut Frame, form: &NoteForm, title: &str, area: Rect) {
    let outer = Block::default().borders(Borders::ALL).title(title.to_string());
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title input
            Constraint::Min(0),    // Content input
        ])
        .split(inner);

    let active_style = Style::default().fg(Color::Cyan);

    let mut title_text = form.title.clone();
    if form.field == FormField::Title {
        title_text.push('\u{2588}');
    }
    let title_block = Block::default().borders(Borders::ALL).title("Title");
    let title_input = Paragraph::new(title_text).block(if form.field == FormField::Title {
        title_block.border_style(active_style)
    } else {
        title_block
    });
    frame.render_widget(title_input, chunks[0]);

    let mut content_text = form.content.clone();
    if form.field == FormField::Content {
        content_text.push('\u{2588}');
    }
    let content_block = Block::default().borders(Borders::ALL).title("Content");
    let content_input = Paragraph::new(content_text)
        .block(if form.field == FormField::Content {
            content_block.border_style(active_style)
        } else {
            content_block
        })
        .wrap(Wrap { trim: false });
    frame.render_widget(content_input, chunks[1]);
}

/// Renders the suggestion review pane: the generated content as
/// markdown with the accept/reject keys underneath.
fn render_suggestion_review(frame: &mut Frame, suggestion: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Suggested content");

    let mut text = Text::default();
    let rendered = tui_markdown::from_str(suggestion);
    for line in rendered.lines {
        text.lines.push(line);
    }
    text.lines.push(Line::from(""));
    text.lines.push(Line::from(Span::styled(
        "y: accept into draft | n: keep my draft",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Renders the bottom bar: a transient status message when present,
/// otherwise the shortcuts for the active mode.
fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(status) = app.status() {
        Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        let shortcuts = match app.mode() {
            Mode::Browse => {
                if app.suggestion_pending() {
                    "thinking... | Tab: focus | j/k: move | n: new | e: edit | d: delete | s: sort | q: quit"
                } else {
                    "Tab: focus | j/k: move | n: new | e: edit | d: delete | s: sort | r: refresh | q: quit"
                }
            }
            Mode::Composing { .. } => {
                if app.suggestion_pending() {
                    "thinking... | Tab: field | Ctrl+S: save | Esc: cancel"
                } else {
                    "Tab: field | Ctrl+S: save | Ctrl+G: suggest | Esc: cancel"
                }
            }
            Mode::ReviewingSuggestion { .. } => "y: accept | n: reject",
            Mode::Editing { .. } => "Tab: field | Ctrl+S: save | Esc: cancel",
        };
        Line::from(Span::styled(
            shortcuts,
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}
