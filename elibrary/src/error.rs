use crate::book::BookId;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the record store itself.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid book document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },
}

/// Why a string could not be read as a book identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdParseError {
    #[error("expected 24 hex characters, got {0}")]
    Length(usize),

    #[error("identifier contains non-hex characters")]
    NonHex,
}

/// A book whose status disagrees with its borrow history.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMismatch {
    #[error("status borrowed but no borrow history")]
    BorrowedWithoutHistory,

    #[error("status available but borrow history is not empty")]
    AvailableWithHistory,
}

/// Why a seed dataset could not be turned into books.
#[derive(Error, Debug)]
pub enum SeedDataError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset contains no books")]
    Empty,

    #[error("entry {index} ('{title}'): {mismatch}")]
    Inconsistent {
        index: usize,
        title: String,
        mismatch: StatusMismatch,
    },
}

#[derive(Error, Debug)]
pub enum BorrowError {
    #[error("Invalid ID format: {input}")]
    InvalidIdentifier {
        input: String,
        #[source]
        source: IdParseError,
    },

    #[error("Book with ID '{0}' not found.")]
    NotFound(BookId),

    #[error("Book '{title}' is already borrowed.")]
    AlreadyBorrowed { title: String },

    #[error("Failed to update the book {0}.")]
    UpdateFailed(BookId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BorrowError {
    /// Only store failures should end the process; the rest are user outcomes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BorrowError::Store(_))
    }
}

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Seed data not found at {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Seed data at {} is empty or invalid: {source}", path.display())]
    SourceInvalid {
        path: PathBuf,
        #[source]
        source: SeedDataError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SeedError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SeedError::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
