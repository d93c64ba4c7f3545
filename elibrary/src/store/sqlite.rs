use super::{BookField, RecordStore};
use crate::book::{check_status_history, Book, BookId, BookStatus, BorrowEvent, NewBook};
use crate::error::{Result, StoreError};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const BOOKS: &str = "books";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Document store backed by SQLite. Each book is one JSON document in the
/// `documents` table; the JSON1 functions query and patch documents in place.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Opening book store at {}", path.display());
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Concurrent writers wait on the lock instead of failing with SQLITE_BUSY.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = SqliteStore { conn };
        store.initialize_tables()?;
        Ok(store)
    }

    fn initialize_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                data_json TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            ",
        )?;
        Ok(())
    }

    /// Remove every book document.
    pub fn clear(&self) -> Result<u64> {
        let removed = self
            .conn
            .execute("DELETE FROM documents WHERE collection = ?1", params![BOOKS])?;
        Ok(removed as u64)
    }

    fn query_books(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Book>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(DocumentRow {
                id: row.get(0)?,
                data_json: row.get(1)?,
            })
        })?;

        let mut books = Vec::new();
        for row in rows {
            books.push(row?.decode()?);
        }
        Ok(books)
    }
}

impl RecordStore for SqliteStore {
    fn find_by_id(&self, id: &BookId) -> Result<Option<Book>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, data_json FROM documents WHERE collection = ?1 AND id = ?2",
                params![BOOKS, id.to_string()],
                |row| {
                    Ok(DocumentRow {
                        id: row.get(0)?,
                        data_json: row.get(1)?,
                    })
                },
            )
            .optional()?;

        row.map(|r| r.decode()).transpose()
    }

    fn conditional_update(
        &self,
        id: &BookId,
        expected: BookStatus,
        new: BookStatus,
        entry: &BorrowEvent,
    ) -> Result<u64> {
        let entry_json = serde_json::to_string(entry)?;
        // Guard and write in one statement: the row only matches while the
        // stored status is still `expected`.
        let modified = self.conn.execute(
            "UPDATE documents
             SET data_json = json_insert(
                 json_set(data_json, '$.status', ?4),
                 '$.borrowHistory[#]',
                 json(?5)
             )
             WHERE collection = ?1
               AND id = ?2
               AND json_extract(data_json, '$.status') = ?3",
            params![
                BOOKS,
                id.to_string(),
                expected.as_str(),
                new.as_str(),
                entry_json
            ],
        )?;
        log::debug!("Conditional update on {id} modified {modified} record(s)");
        Ok(modified as u64)
    }

    fn insert_many(&self, books: &[NewBook]) -> Result<Vec<BookId>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(books.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (id, collection, data_json) VALUES (?1, ?2, ?3)",
            )?;
            for book in books {
                let id = BookId::generate();
                let data_json = serde_json::to_string(book)?;
                stmt.execute(params![id.to_string(), BOOKS, data_json])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn find_by_field(&self, field: BookField, value: &str) -> Result<Vec<Book>> {
        let path = format!("$.{}", field.key());
        log::debug!("Querying books where {} = {value:?}", field.key());
        self.query_books(
            "SELECT id, data_json FROM documents
             WHERE collection = ?1 AND json_extract(data_json, ?2) = ?3
             ORDER BY rowid",
            params![BOOKS, path, value],
        )
    }

    fn count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![BOOKS],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// A raw row from the documents table.
struct DocumentRow {
    id: String,
    data_json: String,
}

/// Stored document shape. Every field is required here, unlike seed input.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBook {
    title: String,
    author: String,
    category: String,
    status: BookStatus,
    borrow_history: Vec<BorrowEvent>,
}

impl DocumentRow {
    fn decode(self) -> Result<Book> {
        let id = BookId::parse(&self.id).map_err(|e| StoreError::InvalidDocument {
            id: self.id.clone(),
            reason: e.to_string(),
        })?;
        let stored: StoredBook =
            serde_json::from_str(&self.data_json).map_err(|e| StoreError::InvalidDocument {
                id: self.id.clone(),
                reason: e.to_string(),
            })?;
        check_status_history(stored.status, &stored.borrow_history).map_err(|mismatch| {
            StoreError::InvalidDocument {
                id: self.id.clone(),
                reason: mismatch.to_string(),
            }
        })?;

        Ok(Book {
            id,
            title: stored.title,
            author: stored.author,
            category: stored.category,
            status: stored.status,
            borrow_history: stored.borrow_history,
        })
    }
}
