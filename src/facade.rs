//! The data-access boundary the views talk to.
//!
//! A [`Facade`] is the CRUD surface for one entity type. The views never touch
//! SQL; they hold an `Arc<impl Facade>` so a refresh handler registered on the
//! event bus can re-query the store on its own. The SQLite implementations
//! below lock the shared [`Database`] for exactly one call each.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::{self, DataAccessError, Database};
use crate::events::AppEvent;
use crate::models::{
    Book, BookDraft, BorrowDraft, BorrowRecord, RankedEntry, Reader, ReaderDraft, Record,
};

pub type Result<T, E = DataAccessError> = std::result::Result<T, E>;

pub trait Facade: Send + Sync + 'static {
    type Entity: Record + Clone + Send + 'static;
    type Draft;

    /// Singular noun used in notices ("book", "reader").
    const ENTITY: &'static str;
    /// Published after every successful mutation through this façade.
    const CHANGED: AppEvent;
    /// Events after which a list of this entity must be re-queried.
    const WATCHES: &'static [AppEvent];

    fn find_all(&self) -> Result<Vec<Self::Entity>>;
    fn search(&self, keyword: &str) -> Result<Vec<Self::Entity>>;
    fn find_by_id(&self, id: i64) -> Result<Option<Self::Entity>>;
    fn create(&self, draft: &Self::Draft) -> Result<Self::Entity>;
    fn update(&self, id: i64, draft: &Self::Draft) -> Result<()>;
    fn delete(&self, id: i64) -> Result<()>;
    fn count(&self) -> Result<i64>;
}

/// Read-only loan aggregates used by the dashboard and the reports page.
pub trait LoanStats: Send + Sync + 'static {
    fn count_borrowing(&self) -> Result<i64>;
    fn top_books(&self, limit: usize) -> Result<Vec<RankedEntry>>;
    fn top_readers(&self, limit: usize) -> Result<Vec<RankedEntry>>;
}

pub struct BookFacade {
    db: Arc<Database>,
}

impl BookFacade {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl Facade for BookFacade {
    type Entity = Book;
    type Draft = BookDraft;

    const ENTITY: &'static str = "book";
    const CHANGED: AppEvent = AppEvent::BookChanged;
    // Loans move `available_copies`, so the book list follows them too.
    const WATCHES: &'static [AppEvent] = &[AppEvent::BookChanged, AppEvent::BorrowRecordChanged];

    fn find_all(&self) -> Result<Vec<Book>> {
        db::fetch_books(&self.db.conn())
    }

    fn search(&self, keyword: &str) -> Result<Vec<Book>> {
        db::search_books(&self.db.conn(), keyword)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Book>> {
        db::find_book(&self.db.conn(), id)
    }

    fn create(&self, draft: &BookDraft) -> Result<Book> {
        db::create_book(&self.db.conn(), draft)
    }

    fn update(&self, id: i64, draft: &BookDraft) -> Result<()> {
        db::update_book(&self.db.conn(), id, draft)
    }

    fn delete(&self, id: i64) -> Result<()> {
        db::delete_book(&self.db.conn(), id)
    }

    fn count(&self) -> Result<i64> {
        db::count_books(&self.db.conn())
    }
}

pub struct ReaderFacade {
    db: Arc<Database>,
}

impl ReaderFacade {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl Facade for ReaderFacade {
    type Entity = Reader;
    type Draft = ReaderDraft;

    const ENTITY: &'static str = "reader";
    const CHANGED: AppEvent = AppEvent::ReaderChanged;
    const WATCHES: &'static [AppEvent] = &[AppEvent::ReaderChanged];

    fn find_all(&self) -> Result<Vec<Reader>> {
        db::fetch_readers(&self.db.conn())
    }

    fn search(&self, keyword: &str) -> Result<Vec<Reader>> {
        db::search_readers(&self.db.conn(), keyword)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Reader>> {
        db::find_reader(&self.db.conn(), id)
    }

    fn create(&self, draft: &ReaderDraft) -> Result<Reader> {
        db::create_reader(&self.db.conn(), draft)
    }

    fn update(&self, id: i64, draft: &ReaderDraft) -> Result<()> {
        db::update_reader(&self.db.conn(), id, draft)
    }

    fn delete(&self, id: i64) -> Result<()> {
        db::delete_reader(&self.db.conn(), id)
    }

    fn count(&self) -> Result<i64> {
        db::count_readers(&self.db.conn())
    }
}

/// Loans. Besides CRUD it can close a loan and answer the ranking queries.
pub struct BorrowLedger {
    db: Arc<Database>,
}

impl BorrowLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn return_book(&self, id: i64, returned_on: NaiveDate) -> Result<()> {
        db::return_book(&self.db.conn(), id, returned_on)
    }
}

impl Facade for BorrowLedger {
    type Entity = BorrowRecord;
    type Draft = BorrowDraft;

    const ENTITY: &'static str = "loan";
    const CHANGED: AppEvent = AppEvent::BorrowRecordChanged;
    // Rows show the joined book title and reader name.
    const WATCHES: &'static [AppEvent] = &AppEvent::ALL;

    fn find_all(&self) -> Result<Vec<BorrowRecord>> {
        db::fetch_borrow_records(&self.db.conn())
    }

    fn search(&self, keyword: &str) -> Result<Vec<BorrowRecord>> {
        db::search_borrow_records(&self.db.conn(), keyword)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<BorrowRecord>> {
        db::find_borrow_record(&self.db.conn(), id)
    }

    fn create(&self, draft: &BorrowDraft) -> Result<BorrowRecord> {
        db::create_borrow_record(&self.db.conn(), draft)
    }

    fn update(&self, id: i64, draft: &BorrowDraft) -> Result<()> {
        db::update_borrow_record(&self.db.conn(), id, draft)
    }

    fn delete(&self, id: i64) -> Result<()> {
        db::delete_borrow_record(&self.db.conn(), id)
    }

    fn count(&self) -> Result<i64> {
        db::count_borrow_records(&self.db.conn())
    }
}

impl LoanStats for BorrowLedger {
    fn count_borrowing(&self) -> Result<i64> {
        db::count_borrowing(&self.db.conn())
    }

    fn top_books(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        db::top_books(&self.db.conn(), limit)
    }

    fn top_readers(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        db::top_readers(&self.db.conn(), limit)
    }
}
