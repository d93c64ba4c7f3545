// Record store contract consumed by the catalog workflows

mod sqlite;

pub use sqlite::SqliteStore;

use crate::book::{Book, BookId, BookStatus, BorrowEvent, NewBook};
use crate::error::Result;

/// Book fields that can be matched with [`RecordStore::find_by_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Category,
    Status,
}

impl BookField {
    /// Document key as it appears in stored JSON.
    pub fn key(&self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Category => "category",
            BookField::Status => "status",
        }
    }
}

/// The narrow document-store interface the workflows depend on.
///
/// Implementations must apply [`conditional_update`](Self::conditional_update)
/// atomically: the status guard and the write happen as one operation, so two
/// callers racing on the same book cannot both see a modified count of 1.
pub trait RecordStore {
    fn find_by_id(&self, id: &BookId) -> Result<Option<Book>>;

    /// Set `status = new` and append `entry` to the borrow history, but only
    /// if the book currently has status `expected`. Returns the number of
    /// modified records (0 or 1).
    fn conditional_update(
        &self,
        id: &BookId,
        expected: BookStatus,
        new: BookStatus,
        entry: &BorrowEvent,
    ) -> Result<u64>;

    /// Insert all books or none. Returns the assigned ids in input order.
    fn insert_many(&self, books: &[NewBook]) -> Result<Vec<BookId>>;

    /// Books whose `field` equals `value`, in insertion order.
    fn find_by_field(&self, field: BookField, value: &str) -> Result<Vec<Book>>;

    fn count(&self) -> Result<u64>;
}
