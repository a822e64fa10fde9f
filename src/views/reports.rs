use std::sync::Arc;

use crate::db::DataAccessError;
use crate::events::{AppEvent, EventBus};
use crate::facade::LoanStats;
use crate::models::RankedEntry;

use super::derived::DerivedView;

/// Number of rows in each ranking unless configured otherwise.
pub const DEFAULT_REPORT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryReport {
    pub top_books: Vec<RankedEntry>,
    pub top_readers: Vec<RankedEntry>,
}

impl LibraryReport {
    /// Plain-text rendering, one ranked entry per line under two headings.
    pub fn lines(&self, limit: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.top_books.len() + self.top_readers.len() + 5);
        lines.push(format!("Top {limit} most borrowed books:"));
        push_ranked(&mut lines, &self.top_books);
        lines.push(String::new());
        lines.push(format!("Top {limit} most active readers:"));
        push_ranked(&mut lines, &self.top_readers);
        lines
    }
}

fn push_ranked(lines: &mut Vec<String>, entries: &[RankedEntry]) {
    if entries.is_empty() {
        lines.push(" • (no loans yet)".to_string());
        return;
    }
    for entry in entries {
        let unit = if entry.count == 1 { "loan" } else { "loans" };
        lines.push(format!(" • {:<50} {} {unit}", entry.name, entry.count));
    }
}

/// Ranking page. Recomputed when shown, on an explicit refresh, and on any
/// change while it is showing.
pub struct Reports {
    view: DerivedView<LibraryReport>,
    limit: usize,
}

impl Reports {
    pub fn new<L: LoanStats>(bus: &EventBus, loans: Arc<L>, limit: usize) -> Self {
        let view = DerivedView::new(bus, &AppEvent::ALL, move || {
            Ok(LibraryReport {
                top_books: loans.top_books(limit)?,
                top_readers: loans.top_readers(limit)?,
            })
        });
        Self { view, limit }
    }

    pub fn report(&self) -> LibraryReport {
        self.view.value()
    }

    pub fn lines(&self) -> Vec<String> {
        self.report().lines(self.limit)
    }

    pub fn refresh(&self) -> Result<(), DataAccessError> {
        self.view.refresh()
    }

    pub fn activate(&self) -> Result<(), DataAccessError> {
        self.view.activate()
    }

    pub fn deactivate(&self) {
        self.view.deactivate();
    }

    pub fn last_error(&self) -> Option<String> {
        self.view.last_error()
    }
}
