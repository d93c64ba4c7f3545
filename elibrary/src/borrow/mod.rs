//! Borrow workflow: the guarded `available -> borrowed` transition.
//!
//! The status check is folded into the store's conditional update, so two
//! callers racing on the same book can never both succeed. The up-front read
//! only exists to report `NotFound` and `AlreadyBorrowed` without writing.

use crate::book::{BookId, BookStatus, BorrowEvent};
use crate::error::BorrowError;
use crate::store::RecordStore;
use chrono::{DateTime, Utc};

/// Successful borrow, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub id: BookId,
    pub title: String,
    pub borrower: String,
    pub borrowed_at: DateTime<Utc>,
}

/// Borrow the book identified by `book_id` for `borrower`, stamped with the
/// current time.
pub fn borrow<S: RecordStore>(
    store: &S,
    book_id: &str,
    borrower: &str,
) -> Result<Confirmation, BorrowError> {
    borrow_at(store, book_id, borrower, Utc::now())
}

/// Same as [`borrow`] with an explicit borrow timestamp.
pub fn borrow_at<S: RecordStore>(
    store: &S,
    book_id: &str,
    borrower: &str,
    at: DateTime<Utc>,
) -> Result<Confirmation, BorrowError> {
    let id = BookId::parse(book_id).map_err(|source| BorrowError::InvalidIdentifier {
        input: book_id.to_string(),
        source,
    })?;

    let book = store.find_by_id(&id)?.ok_or(BorrowError::NotFound(id))?;
    if book.is_borrowed() {
        log::warn!("Rejected borrow of {id}: already borrowed");
        return Err(BorrowError::AlreadyBorrowed { title: book.title });
    }

    let entry = BorrowEvent::new(borrower, at);
    let modified =
        store.conditional_update(&id, BookStatus::Available, BookStatus::Borrowed, &entry)?;

    if modified == 0 {
        // Lost the guard between the read and the write. A concurrent borrow
        // is the expected cause; anything else is a store inconsistency.
        return match store.find_by_id(&id)? {
            Some(current) if current.is_borrowed() => {
                log::warn!("Rejected borrow of {id}: borrowed concurrently");
                Err(BorrowError::AlreadyBorrowed {
                    title: current.title,
                })
            }
            _ => {
                log::warn!("Borrow of {id} modified no records");
                Err(BorrowError::UpdateFailed(id))
            }
        };
    }

    log::info!("Book {id} borrowed by {borrower}");
    Ok(Confirmation {
        id,
        title: book.title,
        borrower: entry.borrower,
        borrowed_at: entry.borrow_date,
    })
}
