//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders so the persistence layer
//! and the views can focus on queries and presentation.

use std::fmt;

use chrono::NaiveDate;

/// Anything stored in its own table with an integer primary key.
pub trait Record {
    fn id(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A catalogued title and the number of physical copies the library owns.
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub page_count: i64,
    pub publication_date: Option<NaiveDate>,
    /// Copies owned by the library.
    pub total_copies: i64,
    /// Copies currently on the shelf. Never exceeds `total_copies`; borrowing
    /// and returning move this counter inside the same transaction as the
    /// borrow record itself.
    pub available_copies: i64,
}

impl Record for Book {
    fn id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.author.trim().is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} - {}", self.title, self.author)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A library member allowed to borrow books.
pub struct Reader {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl Record for Reader {
    fn id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowStatus {
    Borrowing,
    Returned,
}

impl BorrowStatus {
    pub fn label(self) -> &'static str {
        match self {
            BorrowStatus::Borrowing => "Borrowing",
            BorrowStatus::Returned => "Returned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One loan of one copy. The book title and reader name are joined in at
/// query time so list views do not have to resolve ids themselves.
pub struct BorrowRecord {
    pub id: i64,
    pub book_id: i64,
    pub reader_id: i64,
    pub book_title: String,
    pub reader_name: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl BorrowRecord {
    pub fn status(&self) -> BorrowStatus {
        if self.return_date.is_some() {
            BorrowStatus::Returned
        } else {
            BorrowStatus::Borrowing
        }
    }

    /// True when the loan is still open past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.return_date.is_none() && self.due_date < today
    }
}

impl Record for BorrowRecord {
    fn id(&self) -> i64 {
        self.id
    }
}

/// A single line of a "top N" report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub name: String,
    pub count: i64,
}

/// Validated field set used to insert or update a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub page_count: i64,
    pub publication_date: Option<NaiveDate>,
    pub total_copies: i64,
}

impl BookDraft {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            publisher: book.publisher.clone(),
            page_count: book.page_count,
            publication_date: book.publication_date,
            total_copies: book.total_copies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderDraft {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ReaderDraft {
    pub fn from_reader(reader: &Reader) -> Self {
        Self {
            full_name: reader.full_name.clone(),
            email: reader.email.clone(),
            phone: reader.phone.clone(),
            address: reader.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowDraft {
    pub book_id: i64,
    pub reader_id: i64,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl BorrowDraft {
    pub fn from_record(record: &BorrowRecord) -> Self {
        Self {
            book_id: record.book_id,
            reader_id: record.reader_id,
            borrow_date: record.borrow_date,
            due_date: record.due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(return_date: Option<NaiveDate>) -> BorrowRecord {
        BorrowRecord {
            id: 1,
            book_id: 1,
            reader_id: 1,
            book_title: "Dune".into(),
            reader_name: "Ana".into(),
            borrow_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            return_date,
        }
    }

    #[test]
    fn open_loan_past_due_date_is_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let open = record(None);
        assert_eq!(open.status(), BorrowStatus::Borrowing);
        assert!(open.is_overdue(today));

        let returned = record(Some(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()));
        assert_eq!(returned.status(), BorrowStatus::Returned);
        assert!(!returned.is_overdue(today));
    }

    #[test]
    fn book_display_omits_blank_author() {
        let mut book = Book {
            id: 1,
            title: "Anonymous Tales".into(),
            author: "  ".into(),
            isbn: String::new(),
            publisher: String::new(),
            page_count: 0,
            publication_date: None,
            total_copies: 1,
            available_copies: 1,
        };
        assert_eq!(book.to_string(), "Anonymous Tales");
        book.author = "Someone".into();
        assert_eq!(book.to_string(), "Anonymous Tales - Someone");
    }
}
