use elibrary::{
    borrow, list_by_category, seed, BookId, BookStatus, BorrowError, NewBook, RecordStore,
    SeedOutcome, SqliteStore,
};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn bundled_dataset() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../data/seed_data.json")
}

fn store_with(books: &[NewBook]) -> (SqliteStore, Vec<BookId>) {
    let store = SqliteStore::open_in_memory().unwrap();
    let ids = store.insert_many(books).unwrap();
    (store, ids)
}

#[test]
fn seeding_twice_inserts_once() {
    let store = SqliteStore::open_in_memory().unwrap();

    let first = seed(&store, &bundled_dataset()).unwrap();
    assert!(first.inserted() > 0);
    let count = store.count().unwrap();
    assert_eq!(count, first.inserted() as u64);

    let second = seed(&store, &bundled_dataset()).unwrap();
    assert_eq!(second, SeedOutcome::AlreadySeeded { existing: count });
    assert_eq!(second.inserted(), 0);
    assert_eq!(store.count().unwrap(), count);
}

#[test]
fn bundled_dataset_has_engineering_books() {
    let store = SqliteStore::open_in_memory().unwrap();
    seed(&store, &bundled_dataset()).unwrap();

    let engineering = list_by_category(&store, "Engineering").fetch().unwrap();
    assert!(!engineering.is_empty());
    assert!(engineering.iter().all(|b| b.status == BookStatus::Available));
}

#[test]
fn borrow_available_book() {
    let (store, ids) = store_with(&[NewBook::new("Unit Test Book", "Test Author", "Engineering")]);

    let confirmation = borrow(&store, &ids[0].to_string(), "Alice").unwrap();
    assert_eq!(confirmation.title, "Unit Test Book");
    assert_eq!(confirmation.borrower, "Alice");

    let book = store.find_by_id(&ids[0]).unwrap().unwrap();
    assert_eq!(book.status, BookStatus::Borrowed);
    assert_eq!(book.borrow_history.len(), 1);
    assert_eq!(book.borrow_history[0].borrower, "Alice");
    assert_eq!(book.borrow_history[0].borrow_date, confirmation.borrowed_at);
}

#[test]
fn second_borrow_is_rejected() {
    let (store, ids) = store_with(&[NewBook::new("Unit Test Book", "Test Author", "Engineering")]);
    let id = ids[0].to_string();

    borrow(&store, &id, "Alice").unwrap();
    let err = borrow(&store, &id, "Bob").unwrap_err();
    assert!(matches!(err, BorrowError::AlreadyBorrowed { ref title } if title == "Unit Test Book"));

    let book = store.find_by_id(&ids[0]).unwrap().unwrap();
    assert_eq!(book.borrow_history.len(), 1);
    assert_eq!(book.borrow_history[0].borrower, "Alice");
}

#[test]
fn unknown_identifier_is_not_found() {
    let (store, _) = store_with(&[NewBook::new("Some Book", "Someone", "Fiction")]);

    let err = borrow(&store, "000000000000000000000000", "Alice").unwrap_err();
    assert!(matches!(
        err,
        BorrowError::NotFound(id) if id.to_string() == "000000000000000000000000"
    ));
}

#[test]
fn malformed_identifier_touches_nothing() {
    let (store, ids) = store_with(&[NewBook::new("Some Book", "Someone", "Fiction")]);

    let err = borrow(&store, "not-an-id", "Alice").unwrap_err();
    assert!(matches!(
        err,
        BorrowError::InvalidIdentifier { ref input, .. } if input == "not-an-id"
    ));

    assert_eq!(store.count().unwrap(), 1);
    let book = store.find_by_id(&ids[0]).unwrap().unwrap();
    assert_eq!(book.status, BookStatus::Available);
    assert!(book.borrow_history.is_empty());
}

#[test]
fn category_filter_excludes_other_categories() {
    let (store, ids) = store_with(&[
        NewBook::new("Eng Book", "Ada", "Engineering"),
        NewBook::new("Fic Book", "Bard", "Fiction"),
    ]);

    let listed: Vec<BookId> = list_by_category(&store, "Engineering")
        .fetch()
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(listed, vec![ids[0]]);
}

#[test]
fn concurrent_borrows_have_one_winner() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("library.db");
    let id = SqliteStore::open(&path)
        .unwrap()
        .insert_many(&[NewBook::new("Contested", "Author", "Engineering")])
        .unwrap()[0];

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["Alice", "Bob"]
        .into_iter()
        .map(|name| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            thread::spawn(move || {
                let store = SqliteStore::open(&path).unwrap();
                barrier.wait();
                borrow(&store, &id.to_string(), name)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(err, BorrowError::AlreadyBorrowed { .. }),
                "unexpected loser outcome: {err:?}"
            );
        }
    }

    let book = SqliteStore::open(&path).unwrap().find_by_id(&id).unwrap().unwrap();
    assert_eq!(book.borrow_history.len(), 1);
}

/// Known limitation: there is no return workflow, so a borrowed book stays
/// borrowed for good and can never be lent again.
#[test]
fn borrowed_book_never_becomes_available_again() {
    let (store, ids) = store_with(&[NewBook::new("One Way", "Author", "Engineering")]);
    borrow(&store, &ids[0].to_string(), "Alice").unwrap();

    let listed = list_by_category(&store, "Engineering").fetch().unwrap();
    assert_eq!(listed[0].status, BookStatus::Borrowed);
    assert!(store
        .find_by_field(elibrary::BookField::Status, "available")
        .unwrap()
        .is_empty());
    assert!(matches!(
        borrow(&store, &ids[0].to_string(), "Bob"),
        Err(BorrowError::AlreadyBorrowed { .. })
    ));
}
