use crate::book::{check_status_history, NewBook};
use crate::error::{SeedDataError, SeedError};
use crate::store::RecordStore;
use std::path::Path;

/// What a call to [`seed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store was empty and this many books were inserted.
    Seeded { inserted: usize },
    /// The store already held books; nothing was read or written.
    AlreadySeeded { existing: u64 },
}

impl SeedOutcome {
    pub fn inserted(&self) -> usize {
        match self {
            SeedOutcome::Seeded { inserted } => *inserted,
            SeedOutcome::AlreadySeeded { .. } => 0,
        }
    }
}

/// Load the dataset at `source` into an empty store.
///
/// Seeding only runs against an empty store; a store holding any book is
/// left untouched, which makes repeated calls safe.
pub fn seed<S: RecordStore>(store: &S, source: &Path) -> Result<SeedOutcome, SeedError> {
    let existing = store.count()?;
    if existing > 0 {
        log::warn!("Database already seeded ({existing} books found), skipping");
        return Ok(SeedOutcome::AlreadySeeded { existing });
    }

    if !source.exists() {
        return Err(SeedError::SourceMissing {
            path: source.to_path_buf(),
        });
    }

    let books = std::fs::read_to_string(source)
        .map_err(SeedDataError::from)
        .and_then(|content| parse_seed_data(&content))
        .map_err(|source_err| SeedError::SourceInvalid {
            path: source.to_path_buf(),
            source: source_err,
        })?;

    let ids = store.insert_many(&books)?;
    log::info!("Seeded {} books from {}", ids.len(), source.display());
    Ok(SeedOutcome::Seeded {
        inserted: ids.len(),
    })
}

/// Parse a seed dataset: a non-empty JSON array of book objects whose
/// status agrees with their borrow history.
pub fn parse_seed_data(content: &str) -> Result<Vec<NewBook>, SeedDataError> {
    let books: Vec<NewBook> = serde_json::from_str(content)?;
    if books.is_empty() {
        return Err(SeedDataError::Empty);
    }
    for (index, book) in books.iter().enumerate() {
        check_status_history(book.status, &book.borrow_history).map_err(|mismatch| {
            SeedDataError::Inconsistent {
                index,
                title: book.title.clone(),
                mismatch,
            }
        })?;
    }
    Ok(books)
}
