pub mod cache;
pub mod db;
pub mod models;
pub mod ollama;
pub mod service;
pub mod suggest;
pub mod tui;
pub mod utils;

pub use cache::{MutationRejected, MutationTicket, NoteCache, PendingKind, SortBy};
pub use db::Database;
pub use models::{Note, NoteBuilder, NoteId};
pub use service::{NoteService, ServiceError};
