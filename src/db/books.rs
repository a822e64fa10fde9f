use rusqlite::{params, Connection, Error as SqlError, OptionalExtension, Row};

use super::contains_pattern;
use super::error::{violation, DataAccessError, Result, SqlContext, Violation};
use crate::models::{Book, BookDraft};

const BOOK_COLUMNS: &str = "id, title, author, isbn, publisher, page_count, publication_date,
     total_copies, available_copies";

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        publisher: row.get(4)?,
        page_count: row.get(5)?,
        publication_date: row.get(6)?,
        total_copies: row.get(7)?,
        available_copies: row.get(8)?,
    })
}

/// Every book, ordered case-insensitively by title so the list reads like a
/// catalogue.
pub fn fetch_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY title COLLATE NOCASE, id"
        ))
        .during("failed to prepare book query")?;

    let books = stmt
        .query_map([], book_from_row)
        .during("failed to load books")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .during("failed to collect books")?;

    Ok(books)
}

/// Books whose title, author, or ISBN contain `keyword`.
pub fn search_books(conn: &Connection, keyword: &str) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {BOOK_COLUMNS} FROM books
             WHERE title LIKE ?1 ESCAPE '\\'
                OR author LIKE ?1 ESCAPE '\\'
                OR isbn LIKE ?1 ESCAPE '\\'
             ORDER BY title COLLATE NOCASE, id"
        ))
        .during("failed to prepare book search")?;

    let books = stmt
        .query_map([contains_pattern(keyword)], book_from_row)
        .during("failed to search books")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .during("failed to collect book search results")?;

    Ok(books)
}

pub fn find_book(conn: &Connection, id: i64) -> Result<Option<Book>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
        [id],
        book_from_row,
    )
    .optional()
    .during("failed to load book")
}

/// Insert a new book with every copy on the shelf, returning the hydrated
/// struct.
pub fn create_book(conn: &Connection, draft: &BookDraft) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (title, author, isbn, publisher, page_count, publication_date,
                            total_copies, available_copies)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            draft.title,
            draft.author,
            draft.isbn,
            draft.publisher,
            draft.page_count,
            draft.publication_date,
            draft.total_copies,
        ],
    )
    .map_err(|err| map_book_constraint(err, draft, "failed to insert book"))?;

    let id = conn.last_insert_rowid();
    Ok(Book {
        id,
        title: draft.title.clone(),
        author: draft.author.clone(),
        isbn: draft.isbn.clone(),
        publisher: draft.publisher.clone(),
        page_count: draft.page_count,
        publication_date: draft.publication_date,
        total_copies: draft.total_copies,
        available_copies: draft.total_copies,
    })
}

/// Update the editable fields. Changing `total_copies` shifts
/// `available_copies` by the same amount; the CHECK constraint rejects a total
/// lower than the number of copies currently on loan.
pub fn update_book(conn: &Connection, id: i64, draft: &BookDraft) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE books
             SET title = ?1, author = ?2, isbn = ?3, publisher = ?4, page_count = ?5,
                 publication_date = ?6,
                 available_copies = available_copies + (?7 - total_copies),
                 total_copies = ?7
             WHERE id = ?8",
            params![
                draft.title,
                draft.author,
                draft.isbn,
                draft.publisher,
                draft.page_count,
                draft.publication_date,
                draft.total_copies,
                id,
            ],
        )
        .map_err(|err| map_book_constraint(err, draft, "failed to update book"))?;

    if updated == 0 {
        Err(DataAccessError::NotFound { entity: "Book", id })
    } else {
        Ok(())
    }
}

/// Remove a book. Books with loan history are protected by the foreign key on
/// `borrow_records`.
pub fn delete_book(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM books WHERE id = ?1", params![id])
        .map_err(|err| match violation(&err) {
            Some(Violation::ForeignKey) => DataAccessError::Constraint(
                "This book has borrow records and cannot be deleted.".to_string(),
            ),
            _ => DataAccessError::Sqlite {
                action: "failed to delete book",
                source: err,
            },
        })?;

    if deleted == 0 {
        Err(DataAccessError::NotFound { entity: "Book", id })
    } else {
        Ok(())
    }
}

pub fn count_books(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
        .during("failed to count books")
}

/// Turn constraint failures into messages a librarian can act on.
fn map_book_constraint(err: SqlError, draft: &BookDraft, action: &'static str) -> DataAccessError {
    match violation(&err) {
        Some(Violation::Unique) => {
            DataAccessError::Constraint(format!("A book with ISBN {} already exists.", draft.isbn))
        }
        Some(Violation::Check) => DataAccessError::Constraint(format!(
            "Total copies ({}) cannot be lower than the copies on loan.",
            draft.total_copies
        )),
        _ => DataAccessError::Sqlite {
            action,
            source: err,
        },
    }
}
