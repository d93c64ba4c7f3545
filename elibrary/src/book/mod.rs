// Book records as they live in the store

mod id;

pub use id::BookId;

use crate::error::StatusMismatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lending state of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a book's borrow history. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowEvent {
    pub borrower: String,
    pub borrow_date: DateTime<Utc>,
}

impl BorrowEvent {
    pub fn new(borrower: impl Into<String>, borrow_date: DateTime<Utc>) -> Self {
        BorrowEvent {
            borrower: borrower.into(),
            borrow_date,
        }
    }
}

/// A stored book with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub category: String,
    pub status: BookStatus,
    pub borrow_history: Vec<BorrowEvent>,
}

impl Book {
    pub fn is_borrowed(&self) -> bool {
        self.status == BookStatus::Borrowed
    }
}

/// A book about to be inserted. The store assigns the id.
///
/// Seed entries may leave out `status` and `borrowHistory`; they default to
/// an available book with no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub borrow_history: Vec<BorrowEvent>,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        NewBook {
            title: title.into(),
            author: author.into(),
            category: category.into(),
            status: BookStatus::Available,
            borrow_history: Vec::new(),
        }
    }
}

/// A book is borrowed exactly when it has borrow history, since no return
/// operation exists.
pub(crate) fn check_status_history(
    status: BookStatus,
    history: &[BorrowEvent],
) -> Result<(), StatusMismatch> {
    match (status, history.is_empty()) {
        (BookStatus::Borrowed, true) => Err(StatusMismatch::BorrowedWithoutHistory),
        (BookStatus::Available, false) => Err(StatusMismatch::AvailableWithHistory),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_book_defaults() {
        let book: NewBook = serde_json::from_str(
            r#"{"title": "Dune", "author": "Frank Herbert", "category": "Fiction"}"#,
        )
        .unwrap();
        assert_eq!(book, NewBook::new("Dune", "Frank Herbert", "Fiction"));
    }

    #[test]
    fn test_document_field_names() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut book = NewBook::new("SICP", "Abelson", "Engineering");
        book.status = BookStatus::Borrowed;
        book.borrow_history.push(BorrowEvent::new("Alice", at));

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["status"], "borrowed");
        assert_eq!(json["borrowHistory"][0]["borrower"], "Alice");
        assert_eq!(json["borrowHistory"][0]["borrowDate"], "2024-03-01T10:00:00Z");
    }

    #[test]
    fn test_check_status_history() {
        let event = BorrowEvent::new("Alice", Utc::now());

        assert_eq!(check_status_history(BookStatus::Available, &[]), Ok(()));
        assert_eq!(
            check_status_history(BookStatus::Borrowed, std::slice::from_ref(&event)),
            Ok(())
        );
        assert_eq!(
            check_status_history(BookStatus::Borrowed, &[]),
            Err(StatusMismatch::BorrowedWithoutHistory)
        );
        assert_eq!(
            check_status_history(BookStatus::Available, &[event]),
            Err(StatusMismatch::AvailableWithHistory)
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result: Result<NewBook, _> = serde_json::from_str(
            r#"{"title": "T", "author": "A", "category": "C", "status": "lost"}"#,
        );
        assert!(result.is_err());
    }
}
