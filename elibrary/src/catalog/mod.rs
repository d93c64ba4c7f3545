// Read-only catalog queries

use crate::book::Book;
use crate::error::Result;
use crate::store::{BookField, RecordStore};

/// A category query that can be run any number of times.
///
/// Nothing touches the store until [`fetch`](Self::fetch) is called or the
/// listing is iterated; every run re-queries, so later runs see later writes.
pub struct CategoryListing<'a, S: RecordStore> {
    store: &'a S,
    category: String,
}

impl<'a, S: RecordStore> CategoryListing<'a, S> {
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Run the query, returning matching books in insertion order.
    pub fn fetch(&self) -> Result<Vec<Book>> {
        self.store.find_by_field(BookField::Category, &self.category)
    }
}

impl<'a, 'b, S: RecordStore> IntoIterator for &'b CategoryListing<'a, S> {
    type Item = Result<Book>;
    type IntoIter = std::vec::IntoIter<Result<Book>>;

    fn into_iter(self) -> Self::IntoIter {
        match self.fetch() {
            Ok(books) => books.into_iter().map(Ok).collect::<Vec<_>>().into_iter(),
            Err(e) => vec![Err(e)].into_iter(),
        }
    }
}

/// Books in `category`, matched exactly (case-sensitive).
pub fn list_by_category<'a, S: RecordStore>(
    store: &'a S,
    category: impl Into<String>,
) -> CategoryListing<'a, S> {
    CategoryListing {
        store,
        category: category.into(),
    }
}

/// One console line for a listed book.
pub fn format_book_line(book: &Book) -> String {
    format!(
        "ID: {} | Title: {} | Author: {} | Status: {}",
        book.id, book.title, book.author, book.status
    )
}
