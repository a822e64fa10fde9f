use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::contains_pattern;
use super::error::{DataAccessError, Result, SqlContext};
use crate::models::{BorrowDraft, BorrowRecord, RankedEntry};

const RECORD_SELECT: &str = "SELECT r.id, r.book_id, r.reader_id, b.title, d.full_name,
            r.borrow_date, r.due_date, r.return_date
     FROM borrow_records r
     INNER JOIN books b ON b.id = r.book_id
     INNER JOIN readers d ON d.id = r.reader_id";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BorrowRecord> {
    Ok(BorrowRecord {
        id: row.get(0)?,
        book_id: row.get(1)?,
        reader_id: row.get(2)?,
        book_title: row.get(3)?,
        reader_name: row.get(4)?,
        borrow_date: row.get(5)?,
        due_date: row.get(6)?,
        return_date: row.get(7)?,
    })
}

/// Every loan, open ones first, newest first within each group.
pub fn fetch_borrow_records(conn: &Connection) -> Result<Vec<BorrowRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "{RECORD_SELECT}
             ORDER BY r.return_date IS NOT NULL, r.borrow_date DESC, r.id DESC"
        ))
        .during("failed to prepare borrow record query")?;

    let records = stmt
        .query_map([], record_from_row)
        .during("failed to load borrow records")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .during("failed to collect borrow records")?;

    Ok(records)
}

/// Loans whose book title or reader name contain `keyword`.
pub fn search_borrow_records(conn: &Connection, keyword: &str) -> Result<Vec<BorrowRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "{RECORD_SELECT}
             WHERE b.title LIKE ?1 ESCAPE '\\' OR d.full_name LIKE ?1 ESCAPE '\\'
             ORDER BY r.return_date IS NOT NULL, r.borrow_date DESC, r.id DESC"
        ))
        .during("failed to prepare borrow record search")?;

    let records = stmt
        .query_map([contains_pattern(keyword)], record_from_row)
        .during("failed to search borrow records")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .during("failed to collect borrow record search results")?;

    Ok(records)
}

pub fn find_borrow_record(conn: &Connection, id: i64) -> Result<Option<BorrowRecord>> {
    conn.query_row(
        &format!("{RECORD_SELECT} WHERE r.id = ?1"),
        [id],
        record_from_row,
    )
    .optional()
    .during("failed to load borrow record")
}

/// Lend one copy: insert the record and take the copy off the shelf in a
/// single transaction.
pub fn create_borrow_record(conn: &Connection, draft: &BorrowDraft) -> Result<BorrowRecord> {
    validate_dates(draft.borrow_date, draft.due_date)?;
    let tx = conn
        .unchecked_transaction()
        .during("failed to start borrow transaction")?;

    ensure_reader_exists(&tx, draft.reader_id)?;
    take_copy(&tx, draft.book_id)?;

    tx.execute(
        "INSERT INTO borrow_records (book_id, reader_id, borrow_date, due_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            draft.book_id,
            draft.reader_id,
            draft.borrow_date,
            draft.due_date
        ],
    )
    .during("failed to insert borrow record")?;
    let id = tx.last_insert_rowid();

    let record = find_borrow_record(&tx, id)?.ok_or(DataAccessError::NotFound {
        entity: "Borrow record",
        id,
    })?;
    tx.commit().during("failed to commit borrow")?;
    Ok(record)
}

/// Edit a loan. Moving an open loan to another book returns the copy of the
/// old book and takes one of the new book.
pub fn update_borrow_record(conn: &Connection, id: i64, draft: &BorrowDraft) -> Result<()> {
    validate_dates(draft.borrow_date, draft.due_date)?;
    let tx = conn
        .unchecked_transaction()
        .during("failed to start borrow update")?;

    let existing = find_borrow_record(&tx, id)?.ok_or(DataAccessError::NotFound {
        entity: "Borrow record",
        id,
    })?;
    if existing
        .return_date
        .is_some_and(|returned_on| draft.borrow_date > returned_on)
    {
        return Err(DataAccessError::Invalid(
            "Return date cannot be before the borrow date.".to_string(),
        ));
    }
    ensure_reader_exists(&tx, draft.reader_id)?;

    if existing.book_id != draft.book_id && existing.return_date.is_none() {
        take_copy(&tx, draft.book_id)?;
        put_back_copy(&tx, existing.book_id)?;
    }

    tx.execute(
        "UPDATE borrow_records
         SET book_id = ?1, reader_id = ?2, borrow_date = ?3, due_date = ?4
         WHERE id = ?5",
        params![
            draft.book_id,
            draft.reader_id,
            draft.borrow_date,
            draft.due_date,
            id
        ],
    )
    .during("failed to update borrow record")?;

    tx.commit().during("failed to commit borrow update")
}

/// Close a loan and put the copy back on the shelf.
pub fn return_book(conn: &Connection, id: i64, returned_on: NaiveDate) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .during("failed to start return transaction")?;

    let record = find_borrow_record(&tx, id)?.ok_or(DataAccessError::NotFound {
        entity: "Borrow record",
        id,
    })?;
    if record.return_date.is_some() {
        return Err(DataAccessError::Invalid(format!(
            "\"{}\" was already returned.",
            record.book_title
        )));
    }
    if returned_on < record.borrow_date {
        return Err(DataAccessError::Invalid(
            "Return date cannot be before the borrow date.".to_string(),
        ));
    }

    tx.execute(
        "UPDATE borrow_records SET return_date = ?1 WHERE id = ?2",
        params![returned_on, id],
    )
    .during("failed to record return")?;
    put_back_copy(&tx, record.book_id)?;

    tx.commit().during("failed to commit return")
}

/// Delete a loan. An unreturned loan gives its copy back first so the
/// availability count stays honest.
pub fn delete_borrow_record(conn: &Connection, id: i64) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .during("failed to start delete transaction")?;

    let record = find_borrow_record(&tx, id)?.ok_or(DataAccessError::NotFound {
        entity: "Borrow record",
        id,
    })?;
    if record.return_date.is_none() {
        put_back_copy(&tx, record.book_id)?;
    }
    tx.execute("DELETE FROM borrow_records WHERE id = ?1", [id])
        .during("failed to delete borrow record")?;

    tx.commit().during("failed to commit delete")
}

pub fn count_borrow_records(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM borrow_records", [], |row| row.get(0))
        .during("failed to count borrow records")
}

/// Loans not yet returned.
pub fn count_borrowing(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM borrow_records WHERE return_date IS NULL",
        [],
        |row| row.get(0),
    )
    .during("failed to count open loans")
}

/// Most borrowed titles, ties broken alphabetically.
pub fn top_books(conn: &Connection, limit: usize) -> Result<Vec<RankedEntry>> {
    ranked(
        conn,
        "SELECT b.title, COUNT(*) AS loans
         FROM borrow_records r
         INNER JOIN books b ON b.id = r.book_id
         GROUP BY b.id
         ORDER BY loans DESC, b.title COLLATE NOCASE
         LIMIT ?1",
        limit,
        "failed to rank books",
    )
}

/// Readers with the most loans, ties broken alphabetically.
pub fn top_readers(conn: &Connection, limit: usize) -> Result<Vec<RankedEntry>> {
    ranked(
        conn,
        "SELECT d.full_name, COUNT(*) AS loans
         FROM borrow_records r
         INNER JOIN readers d ON d.id = r.reader_id
         GROUP BY d.id
         ORDER BY loans DESC, d.full_name COLLATE NOCASE
         LIMIT ?1",
        limit,
        "failed to rank readers",
    )
}

fn ranked(
    conn: &Connection,
    sql: &str,
    limit: usize,
    action: &'static str,
) -> Result<Vec<RankedEntry>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(sql).during(action)?;
    let entries = stmt
        .query_map([limit], |row| {
            Ok(RankedEntry {
                name: row.get(0)?,
                count: row.get(1)?,
            })
        })
        .during(action)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .during(action)?;
    Ok(entries)
}

fn validate_dates(borrow_date: NaiveDate, due_date: NaiveDate) -> Result<()> {
    if due_date < borrow_date {
        Err(DataAccessError::Invalid(
            "Due date cannot be before the borrow date.".to_string(),
        ))
    } else {
        Ok(())
    }
}

fn ensure_reader_exists(conn: &Connection, reader_id: i64) -> Result<()> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM readers WHERE id = ?1)",
            [reader_id],
            |row| row.get(0),
        )
        .during("failed to look up reader")?;
    if exists {
        Ok(())
    } else {
        Err(DataAccessError::NotFound {
            entity: "Reader",
            id: reader_id,
        })
    }
}

fn take_copy(conn: &Connection, book_id: i64) -> Result<()> {
    let (title, available): (String, i64) = conn
        .query_row(
            "SELECT title, available_copies FROM books WHERE id = ?1",
            [book_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .during("failed to look up book")?
        .ok_or(DataAccessError::NotFound {
            entity: "Book",
            id: book_id,
        })?;

    if available <= 0 {
        return Err(DataAccessError::Unavailable { title });
    }

    conn.execute(
        "UPDATE books SET available_copies = available_copies - 1 WHERE id = ?1",
        [book_id],
    )
    .during("failed to take copy off the shelf")?;
    Ok(())
}

fn put_back_copy(conn: &Connection, book_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE books SET available_copies = MIN(available_copies + 1, total_copies)
         WHERE id = ?1",
        [book_id],
    )
    .during("failed to put copy back on the shelf")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{create_book, create_reader, delete_book, find_book, Database};
    use crate::models::{BookDraft, ReaderDraft};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn seed(conn: &Connection, title: &str, isbn: &str, copies: i64) -> i64 {
        create_book(
            conn,
            &BookDraft {
                title: title.to_string(),
                author: String::new(),
                isbn: isbn.to_string(),
                publisher: String::new(),
                page_count: 100,
                publication_date: None,
                total_copies: copies,
            },
        )
        .unwrap()
        .id
    }

    fn member(conn: &Connection, name: &str) -> i64 {
        create_reader(
            conn,
            &ReaderDraft {
                full_name: name.to_string(),
                email: String::new(),
                phone: String::new(),
                address: String::new(),
            },
        )
        .unwrap()
        .id
    }

    fn loan(book_id: i64, reader_id: i64) -> BorrowDraft {
        BorrowDraft {
            book_id,
            reader_id,
            borrow_date: day(1),
            due_date: day(15),
        }
    }

    fn available(conn: &Connection, book_id: i64) -> i64 {
        find_book(conn, book_id).unwrap().unwrap().available_copies
    }

    #[test]
    fn borrow_and_return_move_availability() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let book = seed(&conn, "Dune", "1", 2);
        let reader = member(&conn, "Ana");

        let record = create_borrow_record(&conn, &loan(book, reader)).unwrap();
        assert_eq!(record.book_title, "Dune");
        assert_eq!(record.reader_name, "Ana");
        assert_eq!(available(&conn, book), 1);
        assert_eq!(count_borrowing(&conn).unwrap(), 1);

        return_book(&conn, record.id, day(10)).unwrap();
        assert_eq!(available(&conn, book), 2);
        assert_eq!(count_borrowing(&conn).unwrap(), 0);
        assert_eq!(count_borrow_records(&conn).unwrap(), 1);

        let err = return_book(&conn, record.id, day(11)).unwrap_err();
        assert!(matches!(err, DataAccessError::Invalid(_)), "{err:?}");
        assert_eq!(available(&conn, book), 2);
    }

    #[test]
    fn borrowing_last_copy_then_one_more_fails_without_side_effects() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let book = seed(&conn, "Dune", "1", 1);
        let reader = member(&conn, "Ana");

        create_borrow_record(&conn, &loan(book, reader)).unwrap();
        let err = create_borrow_record(&conn, &loan(book, reader)).unwrap_err();

        assert!(matches!(err, DataAccessError::Unavailable { .. }), "{err:?}");
        assert_eq!(count_borrow_records(&conn).unwrap(), 1);
        assert_eq!(available(&conn, book), 0);
    }

    #[test]
    fn unknown_reader_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let book = seed(&conn, "Dune", "1", 1);

        let err = create_borrow_record(&conn, &loan(book, 99)).unwrap_err();
        assert!(matches!(err, DataAccessError::NotFound { id: 99, .. }), "{err:?}");
        assert_eq!(available(&conn, book), 1);
    }

    #[test]
    fn due_date_before_borrow_date_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let book = seed(&conn, "Dune", "1", 1);
        let reader = member(&conn, "Ana");
        let mut draft = loan(book, reader);
        draft.due_date = day(1).pred_opt().unwrap();

        assert!(matches!(
            create_borrow_record(&conn, &draft),
            Err(DataAccessError::Invalid(_))
        ));
    }

    #[test]
    fn deleting_open_loan_restores_copy_and_book_with_history_is_protected() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let book = seed(&conn, "Dune", "1", 1);
        let reader = member(&conn, "Ana");
        let record = create_borrow_record(&conn, &loan(book, reader)).unwrap();

        let err = delete_book(&conn, book).unwrap_err();
        assert!(matches!(err, DataAccessError::Constraint(_)), "{err:?}");

        delete_borrow_record(&conn, record.id).unwrap();
        assert_eq!(available(&conn, book), 1);
        delete_book(&conn, book).unwrap();
    }

    #[test]
    fn moving_open_loan_to_another_book() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let first = seed(&conn, "Dune", "1", 1);
        let second = seed(&conn, "Emma", "2", 1);
        let reader = member(&conn, "Ana");
        let record = create_borrow_record(&conn, &loan(first, reader)).unwrap();

        update_borrow_record(&conn, record.id, &loan(second, reader)).unwrap();

        assert_eq!(available(&conn, first), 1);
        assert_eq!(available(&conn, second), 0);
        let moved = find_borrow_record(&conn, record.id).unwrap().unwrap();
        assert_eq!(moved.book_title, "Emma");
    }

    #[test]
    fn returned_loan_cannot_start_after_its_return() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let book = seed(&conn, "Dune", "1", 1);
        let reader = member(&conn, "Ana");
        let record = create_borrow_record(&conn, &loan(book, reader)).unwrap();
        return_book(&conn, record.id, day(5)).unwrap();

        let late_start = BorrowDraft {
            borrow_date: day(10),
            due_date: day(20),
            ..loan(book, reader)
        };
        let err = update_borrow_record(&conn, record.id, &late_start).unwrap_err();
        assert!(matches!(err, DataAccessError::Invalid(_)), "{err:?}");

        let unchanged = find_borrow_record(&conn, record.id).unwrap().unwrap();
        assert_eq!(unchanged.borrow_date, day(1));
        assert_eq!(unchanged.return_date, Some(day(5)));

        let same_day = BorrowDraft {
            borrow_date: day(5),
            ..loan(book, reader)
        };
        update_borrow_record(&conn, record.id, &same_day).unwrap();
        assert_eq!(available(&conn, book), 1);
    }

    #[test]
    fn rankings_order_by_count_then_name() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let dune = seed(&conn, "Dune", "1", 5);
        let emma = seed(&conn, "Emma", "2", 5);
        let beowulf = seed(&conn, "Beowulf", "3", 5);
        let ana = member(&conn, "Ana");
        let bo = member(&conn, "Bo");

        for (book, reader) in [(dune, ana), (dune, bo), (emma, ana), (beowulf, ana)] {
            create_borrow_record(&conn, &loan(book, reader)).unwrap();
        }

        let books = top_books(&conn, 2).unwrap();
        assert_eq!(
            books,
            vec![
                RankedEntry { name: "Dune".into(), count: 2 },
                RankedEntry { name: "Beowulf".into(), count: 1 },
            ]
        );
        let readers = top_readers(&conn, 5).unwrap();
        assert_eq!(
            readers,
            vec![
                RankedEntry { name: "Ana".into(), count: 3 },
                RankedEntry { name: "Bo".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn search_by_title_or_reader() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn();
        let dune = seed(&conn, "Dune", "1", 5);
        let emma = seed(&conn, "Emma", "2", 5);
        let ana = member(&conn, "Ana");
        let bo = member(&conn, "Bo");
        create_borrow_record(&conn, &loan(dune, ana)).unwrap();
        create_borrow_record(&conn, &loan(emma, bo)).unwrap();

        assert_eq!(search_borrow_records(&conn, "dun").unwrap().len(), 1);
        assert_eq!(search_borrow_records(&conn, "bo").unwrap().len(), 1);
        assert_eq!(fetch_borrow_records(&conn).unwrap().len(), 2);
    }
}
