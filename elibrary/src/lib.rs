pub mod book;
pub mod borrow;
pub mod catalog;
pub mod error;
pub mod seed;
pub mod store;

pub use book::{Book, BookId, BookStatus, BorrowEvent, NewBook};
pub use borrow::{borrow, borrow_at, Confirmation};
pub use catalog::{format_book_line, list_by_category, CategoryListing};
pub use error::{
    BorrowError, IdParseError, Result, SeedDataError, SeedError, StatusMismatch, StoreError,
};
pub use seed::{parse_seed_data, seed, SeedOutcome};
pub use store::{BookField, RecordStore, SqliteStore};
