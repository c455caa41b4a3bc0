use crate::cache::{NoteCache, SortBy};
use crate::models::{Note, NoteId};

/// Panel focus state for keyboard navigation in browse mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Search input bar is focused (typing updates the filter).
    SearchInput,
    /// Note list panel is focused (j/k navigation, mutation keys).
    NoteList,
}

/// Which input of a note form currently receives characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Content,
}

/// Edit buffers for the create and edit-in-place forms.
#[derive(Debug, Clone, Default)]
pub struct NoteForm {
    pub title: String,
    pub content: String,
    pub field: FormField,
}

impl NoteForm {
    /// Prefills the form from an existing note.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title().to_string(),
            content: note.content().to_string(),
            field: FormField::Title,
        }
    }

    /// Returns true when both fields are non-empty after trimming, the
    /// precondition for submitting.
    pub fn is_submittable(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    /// Appends a character to the active field.
    pub fn push_char(&mut self, c: char) {
        match self.field {
            FormField::Title => self.title.push(c),
            FormField::Content => self.content.push(c),
        }
    }

    /// Removes the last character from the active field.
    pub fn pop_char(&mut self) {
        match self.field {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Content => {
                self.content.pop();
            }
        }
    }

    /// Switches the active field.
    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Content,
            FormField::Content => FormField::Title,
        };
    }
}

/// UI state machine for the note screens.
///
/// `Composing` and `ReviewingSuggestion` form the suggestion-acceptance
/// flow: generate moves Composing to ReviewingSuggestion; accept and
/// cancel both return to Composing (accept with the suggestion as the
/// new content draft).
#[derive(Debug, Clone)]
pub enum Mode {
    /// Navigating the note list.
    Browse,
    /// Filling the create form.
    Composing { form: NoteForm },
    /// Deciding whether to take the AI suggestion into the create form.
    ReviewingSuggestion { form: NoteForm, suggestion: String },
    /// Editing an existing note in place. `saving` is set while the
    /// write is in flight; the form stays open until it succeeds.
    Editing {
        id: NoteId,
        form: NoteForm,
        saving: bool,
    },
}

/// Application state for the TUI.
///
/// Owns the optimistic note cache and derives everything the renderer
/// needs: the filtered and sorted visible list, selection, focus, the
/// active form mode, and the transient status line.
pub struct App {
    cache: NoteCache,
    mode: Mode,
    focus: Focus,
    search_input: String,
    sort_by: SortBy,
    selected_index: Option<usize>,
    status: Option<String>,
    suggestion_pending: bool,
}

impl App {
    /// Creates a new App with default state: empty cache, browse mode,
    /// search focused, sorted by title.
    pub fn new() -> Self {
        Self {
            cache: NoteCache::new(),
            mode: Mode::Browse,
            focus: Focus::SearchInput,
            search_input: String::new(),
            sort_by: SortBy::Title,
            selected_index: None,
            status: None,
            suggestion_pending: false,
        }
    }

    /// Returns the optimistic cache.
    pub fn cache(&self) -> &NoteCache {
        &self.cache
    }

    /// Returns the optimistic cache mutably, for begin/settle calls.
    pub fn cache_mut(&mut self) -> &mut NoteCache {
        &mut self.cache
    }

    /// Returns the current UI mode.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Returns the current focus state.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Returns the search filter buffer.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Returns the active sort key.
    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    /// Returns the transient status line, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Sets the transient status line.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// Clears the transient status line.
    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Returns true while a suggestion request is in flight.
    pub fn suggestion_pending(&self) -> bool {
        self.suggestion_pending
    }

    /// Marks whether a suggestion request is in flight.
    pub fn set_suggestion_pending(&mut self, pending: bool) {
        self.suggestion_pending = pending;
    }

    /// Returns the notes to display: filtered by the search input and
    /// ordered by the active sort key.
    pub fn visible_notes(&self) -> Vec<&Note> {
        self.cache.visible(&self.search_input, self.sort_by)
    }

    /// Returns the currently selected note, if the selection is still
    /// within the visible list.
    pub fn selected_note(&self) -> Option<&Note> {
        let visible = self.visible_notes();
        self.selected_index.and_then(|i| visible.get(i).copied())
    }

    /// Returns the selected index into the visible list.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    /// Moves selection down, wrapping at the end of the visible list.
    pub fn select_next(&mut self) {
        let len = self.visible_notes().len();
        if len == 0 {
            self.selected_index = None;
            return;
        }

        self.selected_index = Some(match self.selected_index {
            None => 0,
            Some(i) => {
                if i + 1 >= len {
                    0
                } else {
                    i + 1
                }
            }
        });
    }

    /// Moves selection up, wrapping at the start of the visible list.
    pub fn select_previous(&mut self) {
        let len = self.visible_notes().len();
        if len == 0 {
            self.selected_index = None;
            return;
        }

        self.selected_index = Some(match self.selected_index {
            None => len - 1,
            Some(0) => len - 1,
            Some(i) => i - 1,
        });
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selected_index = None;
    }

    /// Toggles focus between the search bar and the note list.
    ///
    /// Entering the note list with no selection auto-selects the first
    /// visible note.
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::SearchInput => Focus::NoteList,
            Focus::NoteList => Focus::SearchInput,
        };
        if self.focus == Focus::NoteList
            && self.selected_index.is_none()
            && !self.visible_notes().is_empty()
        {
            self.selected_index = Some(0);
        }
    }

    /// Returns focus to the search input.
    pub fn reset_focus(&mut self) {
        self.focus = Focus::SearchInput;
    }

    /// Adds a character to the search filter; selection resets because
    /// the visible list changes.
    pub fn push_search_char(&mut self, c: char) {
        self.search_input.push(c);
        self.selected_index = None;
    }

    /// Removes the last character from the search filter.
    pub fn pop_search_char(&mut self) {
        self.search_input.pop();
        self.selected_index = None;
    }

    /// Flips between title and date ordering.
    pub fn toggle_sort(&mut self) {
        self.sort_by = match self.sort_by {
            SortBy::Title => SortBy::Date,
            SortBy::Date => SortBy::Title,
        };
        self.selected_index = None;
    }

    /// Opens the create form.
    pub fn open_compose(&mut self) {
        self.mode = Mode::Composing {
            form: NoteForm::default(),
        };
        self.status = None;
    }

    /// Opens the edit-in-place form for the selected note. No-op when
    /// nothing is selected or the selection is still an unconfirmed
    /// placeholder.
    pub fn open_edit(&mut self) {
        let Some(note) = self.selected_note() else {
            return;
        };
        if note.is_placeholder() {
            self.set_status("note is still saving");
            return;
        }
        self.mode = Mode::Editing {
            id: note.id(),
            form: NoteForm::from_note(note),
            saving: false,
        };
        self.status = None;
    }

    /// Abandons the active form and returns to browse mode.
    pub fn close_form(&mut self) {
        self.mode = Mode::Browse;
        self.suggestion_pending = false;
    }

    /// Returns the active form buffers, if a form is open.
    pub fn form_mut(&mut self) -> Option<&mut NoteForm> {
        match &mut self.mode {
            Mode::Composing { form } | Mode::Editing { form, .. } => Some(form),
            Mode::Browse | Mode::ReviewingSuggestion { .. } => None,
        }
    }

    /// Moves Composing to ReviewingSuggestion with the generated text.
    /// Ignored unless the create form is still open.
    pub fn show_suggestion(&mut self, suggestion: String) {
        if let Mode::Composing { form } = &self.mode {
            self.mode = Mode::ReviewingSuggestion {
                form: form.clone(),
                suggestion,
            };
        }
    }

    /// Accepts the reviewed suggestion as the new content draft and
    /// returns to the create form.
    pub fn accept_suggestion(&mut self) {
        if let Mode::ReviewingSuggestion { form, suggestion } = &self.mode {
            let mut form = form.clone();
            form.content = suggestion.clone();
            form.field = FormField::Content;
            self.mode = Mode::Composing { form };
        }
    }

    /// Discards the reviewed suggestion and returns to the create form
    /// unchanged.
    pub fn reject_suggestion(&mut self) {
        if let Mode::ReviewingSuggestion { form, .. } = &self.mode {
            self.mode = Mode::Composing { form: form.clone() };
        }
    }

    /// Marks the open edit form as saving (write in flight).
    pub fn set_edit_saving(&mut self, value: bool) {
        if let Mode::Editing { saving, .. } = &mut self.mode {
            *saving = value;
        }
    }

    /// Leaves edit mode if the settled edit was for the note being
    /// edited. Called when an edit outcome arrives successfully.
    pub fn exit_edit_for(&mut self, id: NoteId) {
        if matches!(&self.mode, Mode::Editing { id: editing, .. } if *editing == id) {
            self.mode = Mode::Browse;
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteBuilder;

    fn note(id: i64, title: &str, content: &str) -> Note {
        NoteBuilder::new()
            .id(NoteId::new(id))
            .title(title)
            .content(content)
            .build()
    }

    fn app_with_notes(notes: Vec<Note>) -> App {
        let mut app = App::new();
        app.cache_mut().refresh(notes);
        app
    }

    #[test]
    fn app_initializes_with_default_state() {
        let app = App::new();
        assert!(app.visible_notes().is_empty());
        assert_eq!(app.selected_index(), None);
        assert_eq!(app.search_input(), "");
        assert_eq!(app.focus(), Focus::SearchInput);
        assert!(matches!(app.mode(), Mode::Browse));
        assert_eq!(app.sort_by(), SortBy::Title);
    }

    #[test]
    fn select_next_wraps_through_visible_list() {
        let mut app = app_with_notes(vec![note(1, "A", "a"), note(2, "B", "b")]);

        app.select_next();
        assert_eq!(app.selected_index(), Some(0));
        app.select_next();
        assert_eq!(app.selected_index(), Some(1));
        app.select_next();
        assert_eq!(app.selected_index(), Some(0));
    }

    #[test]
    fn select_previous_wraps_backwards() {
        let mut app = app_with_notes(vec![note(1, "A", "a"), note(2, "B", "b")]);

        app.select_previous();
        assert_eq!(app.selected_index(), Some(1));
        app.select_previous();
        assert_eq!(app.selected_index(), Some(0));
        app.select_previous();
        assert_eq!(app.selected_index(), Some(1));
    }

    #[test]
    fn navigation_with_empty_list_does_nothing() {
        let mut app = App::new();
        app.select_next();
        assert_eq!(app.selected_index(), None);
        app.select_previous();
        assert_eq!(app.selected_index(), None);
    }

    #[test]
    fn toggle_focus_auto_selects_first_note() {
        let mut app = app_with_notes(vec![note(1, "A", "a")]);
        assert_eq!(app.focus(), Focus::SearchInput);

        app.toggle_focus();
        assert_eq!(app.focus(), Focus::NoteList);
        assert_eq!(app.selected_index(), Some(0));

        app.toggle_focus();
        assert_eq!(app.focus(), Focus::SearchInput);
    }

    #[test]
    fn search_input_narrows_visible_notes_and_resets_selection() {
        let mut app = app_with_notes(vec![
            note(1, "Groceries", "milk"),
            note(2, "Budget", "rent"),
        ]);
        app.select_next();
        assert_eq!(app.selected_index(), Some(0));

        for c in "bud".chars() {
            app.push_search_char(c);
        }

        assert_eq!(app.selected_index(), None);
        let visible = app.visible_notes();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title(), "Budget");
    }

    #[test]
    fn toggle_sort_flips_between_title_and_date() {
        let mut app = App::new();
        assert_eq!(app.sort_by(), SortBy::Title);
        app.toggle_sort();
        assert_eq!(app.sort_by(), SortBy::Date);
        app.toggle_sort();
        assert_eq!(app.sort_by(), SortBy::Title);
    }

    #[test]
    fn selected_note_is_stable_against_shrinking_list() {
        let mut app = app_with_notes(vec![note(1, "A", "a"), note(2, "B", "b")]);
        app.select_next();
        app.select_next();
        assert_eq!(app.selected_index(), Some(1));

        // List shrinks under the selection
        app.cache_mut().refresh(vec![note(1, "A", "a")]);
        assert!(app.selected_note().is_none(), "stale index yields None");
    }

    // --- form state machine ---

    #[test]
    fn open_compose_enters_composing_mode() {
        let mut app = App::new();
        app.open_compose();

        match app.mode() {
            Mode::Composing { form } => {
                assert!(form.title.is_empty());
                assert!(form.content.is_empty());
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn open_edit_prefills_form_from_selected_note() {
        let mut app = app_with_notes(vec![note(3, "Groceries", "milk")]);
        app.toggle_focus();
        app.open_edit();

        match app.mode() {
            Mode::Editing { id, form, saving } => {
                assert_eq!(*id, NoteId::new(3));
                assert_eq!(form.title, "Groceries");
                assert_eq!(form.content, "milk");
                assert!(!saving);
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn open_edit_refuses_placeholder_notes() {
        let mut app = App::new();
        app.cache_mut().begin_create("Pending", "pending");
        app.toggle_focus();

        app.open_edit();

        assert!(matches!(app.mode(), Mode::Browse));
        assert_eq!(app.status(), Some("note is still saving"));
    }

    #[test]
    fn generate_moves_composing_to_reviewing() {
        let mut app = App::new();
        app.open_compose();
        app.form_mut().unwrap().title.push_str("Groceries");
        app.form_mut().unwrap().content.push_str("milk");

        app.show_suggestion("milk, eggs, bread".to_string());

        match app.mode() {
            Mode::ReviewingSuggestion { form, suggestion } => {
                assert_eq!(form.title, "Groceries");
                assert_eq!(suggestion, "milk, eggs, bread");
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn accept_suggestion_replaces_content_draft() {
        let mut app = App::new();
        app.open_compose();
        app.form_mut().unwrap().title.push_str("Groceries");
        app.form_mut().unwrap().content.push_str("milk");
        app.show_suggestion("milk, eggs, bread".to_string());

        app.accept_suggestion();

        match app.mode() {
            Mode::Composing { form } => {
                assert_eq!(form.title, "Groceries");
                assert_eq!(form.content, "milk, eggs, bread");
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn reject_suggestion_keeps_original_draft() {
        let mut app = App::new();
        app.open_compose();
        app.form_mut().unwrap().title.push_str("Groceries");
        app.form_mut().unwrap().content.push_str("milk");
        app.show_suggestion("milk, eggs, bread".to_string());

        app.reject_suggestion();

        match app.mode() {
            Mode::Composing { form } => {
                assert_eq!(form.content, "milk");
            }
            other => panic!("unexpected mode: {other:?}"),
        }
    }

    #[test]
    fn show_suggestion_is_ignored_outside_composing() {
        let mut app = App::new();
        app.show_suggestion("late arrival".to_string());
        assert!(matches!(app.mode(), Mode::Browse));
    }

    #[test]
    fn exit_edit_for_only_leaves_matching_edit() {
        let mut app = app_with_notes(vec![note(1, "A", "a"), note(2, "B", "b")]);
        app.toggle_focus();
        app.open_edit();

        // An unrelated edit settling must not close the open form
        app.exit_edit_for(NoteId::new(2));
        assert!(matches!(app.mode(), Mode::Editing { .. }));

        app.exit_edit_for(NoteId::new(1));
        assert!(matches!(app.mode(), Mode::Browse));
    }

    #[test]
    fn form_is_submittable_only_with_both_fields() {
        let mut form = NoteForm::default();
        assert!(!form.is_submittable());

        form.title.push_str("Groceries");
        assert!(!form.is_submittable());

        form.content.push_str("milk");
        assert!(form.is_submittable());

        form.content = "   ".to_string();
        assert!(!form.is_submittable());
    }

    #[test]
    fn form_char_editing_targets_active_field() {
        let mut form = NoteForm::default();
        form.push_char('a');
        form.toggle_field();
        form.push_char('b');

        assert_eq!(form.title, "a");
        assert_eq!(form.content, "b");

        form.pop_char();
        assert_eq!(form.content, "");
        assert_eq!(form.title, "a");
    }
}
