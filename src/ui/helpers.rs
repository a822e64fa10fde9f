use chrono::NaiveDate;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};

use crate::models::{Book, BorrowRecord, BorrowStatus, Reader};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How an entity is laid out as a table row.
pub(crate) trait TableRow {
    const HEADERS: &'static [&'static str];

    fn widths() -> Vec<Constraint>;
    fn cells(&self) -> Vec<String>;
    /// Short description used in confirmation prompts.
    fn label(&self) -> String;

    /// Row tint; loans past their due date stand out.
    fn style(&self, _today: NaiveDate) -> Style {
        Style::default()
    }
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl TableRow for Book {
    const HEADERS: &'static [&'static str] =
        &["ID", "Title", "Author", "ISBN", "Publisher", "Published", "Available"];

    fn widths() -> Vec<Constraint> {
        vec![
            Constraint::Length(5),
            Constraint::Percentage(28),
            Constraint::Percentage(18),
            Constraint::Length(15),
            Constraint::Percentage(16),
            Constraint::Length(11),
            Constraint::Length(10),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.author.clone(),
            self.isbn.clone(),
            self.publisher.clone(),
            date_cell(self.publication_date),
            format!("{}/{}", self.available_copies, self.total_copies),
        ]
    }

    fn label(&self) -> String {
        format!("book \"{self}\"")
    }

    fn style(&self, _today: NaiveDate) -> Style {
        if self.available_copies == 0 {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        }
    }
}

impl TableRow for Reader {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Email", "Phone", "Address"];

    fn widths() -> Vec<Constraint> {
        vec![
            Constraint::Length(5),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Length(14),
            Constraint::Percentage(35),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.full_name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.address.clone(),
        ]
    }

    fn label(&self) -> String {
        format!("reader \"{}\"", self.full_name)
    }
}

impl TableRow for BorrowRecord {
    const HEADERS: &'static [&'static str] =
        &["ID", "Book", "Reader", "Borrowed", "Due", "Returned", "Status"];

    fn widths() -> Vec<Constraint> {
        vec![
            Constraint::Length(5),
            Constraint::Percentage(30),
            Constraint::Percentage(22),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(10),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.book_title.clone(),
            self.reader_name.clone(),
            date_cell(Some(self.borrow_date)),
            date_cell(Some(self.due_date)),
            date_cell(self.return_date),
            self.status().label().to_string(),
        ]
    }

    fn label(&self) -> String {
        format!("loan of \"{}\" to {}", self.book_title, self.reader_name)
    }

    fn style(&self, today: NaiveDate) -> Style {
        if self.is_overdue(today) {
            Style::default().fg(Color::Red)
        } else if self.status() == BorrowStatus::Returned {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        }
    }
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}
