//! In-memory façades for exercising the views without SQLite.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::db::DataAccessError;
use crate::events::{AppEvent, EventBus, Subscription};
use crate::facade::{Facade, LoanStats, Result};
use crate::models::{Book, BookDraft, RankedEntry};

pub(crate) fn book_draft(title: &str) -> BookDraft {
    BookDraft {
        title: title.to_string(),
        author: String::new(),
        isbn: format!("isbn-{title}"),
        publisher: String::new(),
        page_count: 1,
        publication_date: None,
        total_copies: 1,
    }
}

/// Records every event published on `bus` until the subscription drops.
pub(crate) fn count_events(bus: &EventBus) -> (Arc<Mutex<Vec<AppEvent>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = bus.subscribe(move |event| {
        sink.lock().unwrap().push(*event);
        Ok(())
    });
    (seen, subscription)
}

fn offline() -> DataAccessError {
    DataAccessError::Invalid("store offline".to_string())
}

#[derive(Default)]
pub(crate) struct StubBooks {
    books: Mutex<Vec<Book>>,
    next_id: AtomicI64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl StubBooks {
    pub(crate) fn with_titles(titles: &[&str]) -> Arc<Self> {
        let stub = Self::default();
        for title in titles {
            stub.insert(&book_draft(title));
        }
        Arc::new(stub)
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn len(&self) -> usize {
        self.books.lock().unwrap().len()
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn insert(&self, draft: &BookDraft) -> Book {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let book = Book {
            id,
            title: draft.title.clone(),
            author: draft.author.clone(),
            isbn: draft.isbn.clone(),
            publisher: draft.publisher.clone(),
            page_count: draft.page_count,
            publication_date: draft.publication_date,
            total_copies: draft.total_copies,
            available_copies: draft.total_copies,
        };
        self.books.lock().unwrap().push(book.clone());
        book
    }

    fn read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(offline())
        } else {
            Ok(())
        }
    }

    fn write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Facade for StubBooks {
    type Entity = Book;
    type Draft = BookDraft;

    const ENTITY: &'static str = "book";
    const CHANGED: AppEvent = AppEvent::BookChanged;
    const WATCHES: &'static [AppEvent] = &[AppEvent::BookChanged, AppEvent::BorrowRecordChanged];

    fn find_all(&self) -> Result<Vec<Book>> {
        self.read()?;
        Ok(self.books.lock().unwrap().clone())
    }

    fn search(&self, keyword: &str) -> Result<Vec<Book>> {
        self.read()?;
        let needle = keyword.to_lowercase();
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Book>> {
        self.read()?;
        Ok(self.books.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    fn create(&self, draft: &BookDraft) -> Result<Book> {
        self.write()?;
        Ok(self.insert(draft))
    }

    fn update(&self, id: i64, draft: &BookDraft) -> Result<()> {
        self.write()?;
        let mut books = self.books.lock().unwrap();
        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(DataAccessError::NotFound { entity: "Book", id })?;
        book.title = draft.title.clone();
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.write()?;
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|b| b.id != id);
        if books.len() == before {
            Err(DataAccessError::NotFound { entity: "Book", id })
        } else {
            Ok(())
        }
    }

    fn count(&self) -> Result<i64> {
        self.read()?;
        Ok(self.books.lock().unwrap().len() as i64)
    }
}

/// Fixed loan numbers for the derived views.
#[derive(Default)]
pub(crate) struct StubLoans {
    pub(crate) borrowing: AtomicI64,
    pub(crate) top_books: Mutex<Vec<RankedEntry>>,
    pub(crate) top_readers: Mutex<Vec<RankedEntry>>,
}

impl LoanStats for StubLoans {
    fn count_borrowing(&self) -> Result<i64> {
        Ok(self.borrowing.load(Ordering::SeqCst))
    }

    fn top_books(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        Ok(self.top_books.lock().unwrap().iter().take(limit).cloned().collect())
    }

    fn top_readers(&self, limit: usize) -> Result<Vec<RankedEntry>> {
        Ok(self.top_readers.lock().unwrap().iter().take(limit).cloned().collect())
    }
}
