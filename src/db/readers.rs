use rusqlite::{params, Connection, OptionalExtension, Row};

use super::contains_pattern;
use super::error::{violation, DataAccessError, Result, SqlContext, Violation};
use crate::models::{Reader, ReaderDraft};

fn reader_from_row(row: &Row<'_>) -> rusqlite::Result<Reader> {
    Ok(Reader {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
    })
}

pub fn fetch_readers(conn: &Connection) -> Result<Vec<Reader>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, full_name, email, phone, address
             FROM readers
             ORDER BY full_name COLLATE NOCASE, id",
        )
        .during("failed to prepare reader query")?;

    let readers = stmt
        .query_map([], reader_from_row)
        .during("failed to load readers")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .during("failed to collect readers")?;

    Ok(readers)
}

/// Readers whose name, email, or phone contain `keyword`.
pub fn search_readers(conn: &Connection, keyword: &str) -> Result<Vec<Reader>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, full_name, email, phone, address
             FROM readers
             WHERE full_name LIKE ?1 ESCAPE '\\'
                OR email LIKE ?1 ESCAPE '\\'
                OR phone LIKE ?1 ESCAPE '\\'
             ORDER BY full_name COLLATE NOCASE, id",
        )
        .during("failed to prepare reader search")?;

    let readers = stmt
        .query_map([contains_pattern(keyword)], reader_from_row)
        .during("failed to search readers")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .during("failed to collect reader search results")?;

    Ok(readers)
}

pub fn find_reader(conn: &Connection, id: i64) -> Result<Option<Reader>> {
    conn.query_row(
        "SELECT id, full_name, email, phone, address FROM readers WHERE id = ?1",
        [id],
        reader_from_row,
    )
    .optional()
    .during("failed to load reader")
}

pub fn create_reader(conn: &Connection, draft: &ReaderDraft) -> Result<Reader> {
    conn.execute(
        "INSERT INTO readers (full_name, email, phone, address) VALUES (?1, ?2, ?3, ?4)",
        params![draft.full_name, draft.email, draft.phone, draft.address],
    )
    .during("failed to insert reader")?;

    let id = conn.last_insert_rowid();
    Ok(Reader {
        id,
        full_name: draft.full_name.clone(),
        email: draft.email.clone(),
        phone: draft.phone.clone(),
        address: draft.address.clone(),
    })
}

pub fn update_reader(conn: &Connection, id: i64, draft: &ReaderDraft) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE readers SET full_name = ?1, email = ?2, phone = ?3, address = ?4
             WHERE id = ?5",
            params![draft.full_name, draft.email, draft.phone, draft.address, id],
        )
        .during("failed to update reader")?;

    if updated == 0 {
        Err(DataAccessError::NotFound {
            entity: "Reader",
            id,
        })
    } else {
        Ok(())
    }
}

/// Remove a reader. Like books, readers with loan history stay put.
pub fn delete_reader(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM readers WHERE id = ?1", params![id])
        .map_err(|err| match violation(&err) {
            Some(Violation::ForeignKey) => DataAccessError::Constraint(
                "This reader has borrow records and cannot be deleted.".to_string(),
            ),
            _ => DataAccessError::Sqlite {
                action: "failed to delete reader",
                source: err,
            },
        })?;

    if deleted == 0 {
        Err(DataAccessError::NotFound {
            entity: "Reader",
            id,
        })
    } else {
        Ok(())
    }
}

pub fn count_readers(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM readers", [], |row| row.get(0))
        .during("failed to count readers")
}
