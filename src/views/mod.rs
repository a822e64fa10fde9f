//! Store-backed views: entity lists that stay in step with the store through
//! the event bus, and the derived pages computed from aggregate queries.

mod dashboard;
mod derived;
mod reports;
mod status;
mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use dashboard::{Dashboard, LibraryStats};
pub use derived::DerivedView;
pub use reports::{LibraryReport, Reports, DEFAULT_REPORT_LIMIT};
pub use status::{StatusKind, StatusMessage};
pub use table::{PanelSnapshot, TablePanel};
