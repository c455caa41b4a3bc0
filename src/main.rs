use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use time::format_description;

use notetaker::{Database, NoteCache, NoteId, NoteService, ServiceError, SortBy};

/// notetaker - create, edit, search, and sort short text notes
#[derive(Parser)]
#[command(name = "notetaker")]
#[command(about = "A small note-taking tool with AI-assisted drafting")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Add a new note
    Add(AddCommand),
    /// List notes, optionally filtered and sorted
    List(ListCommand),
    /// Replace a note's title and content
    Edit(EditCommand),
    /// Delete a note
    Delete(DeleteCommand),
    /// Open the interactive terminal UI
    Tui,
}

/// Add a new note
#[derive(Parser)]
struct AddCommand {
    /// The title of the note
    #[arg(value_name = "TITLE")]
    title: String,

    /// The content of the note
    #[arg(value_name = "CONTENT")]
    content: String,
}

/// List notes
#[derive(Parser)]
struct ListCommand {
    /// Case-insensitive filter over title and content
    #[arg(short, long, value_name = "QUERY")]
    search: Option<String>,

    /// Sort key for the listing
    #[arg(long, value_enum, default_value = "title")]
    sort: SortArg,
}

/// Edit an existing note
#[derive(Parser)]
struct EditCommand {
    /// The id of the note to edit
    #[arg(value_name = "ID")]
    id: i64,

    /// The new title
    #[arg(value_name = "TITLE")]
    title: String,

    /// The new content
    #[arg(value_name = "CONTENT")]
    content: String,
}

/// Delete an existing note
#[derive(Parser)]
struct DeleteCommand {
    /// The id of the note to delete
    #[arg(value_name = "ID")]
    id: i64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Title,
    Date,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Title => SortBy::Title,
            SortArg::Date => SortBy::Date,
        }
    }
}

fn main() {
    // Pick up OLLAMA_HOST / OLLAMA_MODEL from a local .env, if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Add(cmd) => with_database(|db| execute_add(cmd, db)),
        Commands::List(cmd) => with_database(|db| execute_list(cmd, db)),
        Commands::Edit(cmd) => with_database(|db| execute_edit(cmd, db)),
        Commands::Delete(cmd) => with_database(|db| execute_delete(cmd, db)),
        Commands::Tui => notetaker::tui::run(),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors (empty fields, unknown ids) exit with code 1; database
/// and I/O failures exit with code 2.
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ServiceError>()
        .is_some_and(ServiceError::is_user_error)
}

/// Opens the on-disk database and runs a command against it.
fn with_database<F>(f: F) -> Result<()>
where
    F: FnOnce(Database) -> Result<()>,
{
    let db_path = notetaker::utils::get_database_path()?;
    notetaker::utils::ensure_database_directory(&db_path)?;
    let db = Database::open(&db_path).context("Failed to open database")?;
    f(db)
}

/// Executes the add command logic with a provided database.
///
/// Separated from the dispatch above to allow testing with in-memory
/// databases.
fn execute_add(cmd: &AddCommand, db: Database) -> Result<()> {
    let service = NoteService::new(db);
    let note = service.create_note(&cmd.title, &cmd.content)?;

    println!("Note created (id: {})", note.id());
    Ok(())
}

/// Executes the list command logic with a provided database.
///
/// Filtering and ordering go through the same client-side cache the TUI
/// uses, so both surfaces agree on semantics.
fn execute_list(cmd: &ListCommand, db: Database) -> Result<()> {
    let service = NoteService::new(db);
    let notes = service.list_notes()?;

    let mut cache = NoteCache::new();
    cache.refresh(notes);

    let query = cmd.search.as_deref().unwrap_or("");
    let visible = cache.visible(query, cmd.sort.into());

    if visible.is_empty() {
        println!("No notes found");
        return Ok(());
    }

    let date_format = format_description::parse("[year]-[month]-[day]")?;
    for note in visible {
        let date = note
            .created_at()
            .format(&date_format)
            .unwrap_or_else(|_| "????-??-??".to_string());
        println!("{:>5}  {}  {}", note.id().get(), date, note.title());
    }

    Ok(())
}

/// Executes the edit command logic with a provided database.
fn execute_edit(cmd: &EditCommand, db: Database) -> Result<()> {
    let service = NoteService::new(db);
    let note = service.edit_note(NoteId::new(cmd.id), &cmd.title, &cmd.content)?;

    println!("Note {} updated", note.id());
    Ok(())
}

/// Executes the delete command logic with a provided database.
fn execute_delete(cmd: &DeleteCommand, db: Database) -> Result<()> {
    let service = NoteService::new(db);
    service.delete_note(NoteId::new(cmd.id))?;

    println!("Note {} deleted", cmd.id);
    Ok(())
}
