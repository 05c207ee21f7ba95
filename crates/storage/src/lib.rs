#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AttemptRepository, AttemptRow, AttemptRowId, InMemoryRepository, NewQuizRecord,
    QuizRepository, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
