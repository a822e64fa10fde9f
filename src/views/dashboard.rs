use std::sync::Arc;

use crate::db::DataAccessError;
use crate::events::{AppEvent, EventBus};
use crate::facade::{Facade, LoanStats};

use super::derived::DerivedView;

/// The three headline numbers on the home page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStats {
    pub books: i64,
    pub readers: i64,
    pub borrowing: i64,
}

/// Home page counters. Any change to books, readers, or loans triggers a
/// full recount while the dashboard is showing.
pub struct Dashboard {
    view: DerivedView<LibraryStats>,
}

impl Dashboard {
    pub fn new<B, R, L>(bus: &EventBus, books: Arc<B>, readers: Arc<R>, loans: Arc<L>) -> Self
    where
        B: Facade,
        R: Facade,
        L: LoanStats,
    {
        let view = DerivedView::new(bus, &AppEvent::ALL, move || {
            Ok(LibraryStats {
                books: books.count()?,
                readers: readers.count()?,
                borrowing: loans.count_borrowing()?,
            })
        });
        Self { view }
    }

    pub fn stats(&self) -> LibraryStats {
        self.view.value()
    }

    pub fn activate(&self) -> Result<(), DataAccessError> {
        self.view.activate()
    }

    pub fn deactivate(&self) {
        self.view.deactivate();
    }

    pub fn is_active(&self) -> bool {
        self.view.is_active()
    }

    pub fn last_error(&self) -> Option<String> {
        self.view.last_error()
    }
}
