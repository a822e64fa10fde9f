//! Library manager: a terminal front end over a SQLite catalogue of books,
//! readers, and loans.
//!
//! Every mutation goes through a [`facade::Facade`] held by a
//! [`views::TablePanel`]; a successful one publishes a single [`AppEvent`] on
//! the [`EventBus`], and each view that depends on that kind of data re-queries
//! the store. The binary wires the pieces together; tests and other tools can
//! reuse them without a terminal.
pub mod config;
pub mod db;
pub mod events;
pub mod facade;
pub mod logging;
pub mod models;
pub mod ui;
pub mod views;

pub use config::AppConfig;
pub use db::{DataAccessError, Database};
pub use events::{AppEvent, DeliveryReport, EventBus, Subscription, SubscriptionId};
pub use facade::{BookFacade, BorrowLedger, Facade, LoanStats, ReaderFacade};
pub use models::{Book, BorrowRecord, Reader};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
