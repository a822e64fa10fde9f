//! Persistence module split across logical submodules. Every function takes
//! a plain `&Connection` and wraps exactly one query or one transaction; the
//! façades in [`crate::facade`] own the locking.

mod books;
mod borrows;
mod connection;
mod error;
mod readers;

pub use books::{
    count_books, create_book, delete_book, fetch_books, find_book, search_books, update_book,
};
pub use borrows::{
    count_borrow_records, count_borrowing, create_borrow_record, delete_borrow_record,
    fetch_borrow_records, find_borrow_record, return_book, search_borrow_records, top_books,
    top_readers, update_borrow_record,
};
pub use connection::{ensure_schema, Database};
pub use error::DataAccessError;
pub use readers::{
    count_readers, create_reader, delete_reader, fetch_readers, find_reader, search_readers,
    update_reader,
};

/// `LIKE` pattern matching `keyword` anywhere, with `%`, `_` and the escape
/// character itself taken literally. Queries pair it with `ESCAPE '\'`.
pub(crate) fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
