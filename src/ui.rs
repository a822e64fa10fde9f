//! Terminal front end: page shell, forms, and the crossterm event loop.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::{App, Page};
pub use terminal::run_app;
