use anyhow::{anyhow, Context, Result};
use chrono::{Days, NaiveDate};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, BookDraft, BorrowDraft, BorrowRecord, Reader, ReaderDraft};

/// Default loan period offered when lending a book.
pub(crate) const LOAN_PERIOD_DAYS: u64 = 14;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// What a field accepts while typing.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum FieldKind {
    Text,
    Digits,
    Date,
}

#[derive(Clone, Debug)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    pub(crate) kind: FieldKind,
    pub(crate) required: bool,
}

impl FormField {
    fn new(label: &'static str, kind: FieldKind, required: bool, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            kind,
            required,
        }
    }

    fn accepts(&self, ch: char) -> bool {
        match self.kind {
            FieldKind::Text => !ch.is_control(),
            FieldKind::Digits => ch.is_ascii_digit(),
            FieldKind::Date => ch.is_ascii_digit() || ch == '-',
        }
    }
}

/// A modal form: a column of fields with one focused at a time.
#[derive(Clone, Debug)]
pub(crate) struct Form {
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl Form {
    fn new(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            active: 0,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + 1) % self.fields.len();
        }
    }

    pub(crate) fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Append a character to the focused field, rejecting characters the
    /// field does not accept.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.fields.get_mut(self.active) {
            Some(field) if field.accepts(ch) => {
                field.value.push(ch);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.pop();
        }
    }

    fn text(&self, index: usize) -> Result<String> {
        let field = &self.fields[index];
        let value = field.value.trim();
        if field.required && value.is_empty() {
            return Err(anyhow!("{} is required.", field.label));
        }
        Ok(value.to_string())
    }

    fn number(&self, index: usize) -> Result<i64> {
        let label = self.fields[index].label;
        let raw = self.text(index)?;
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse::<i64>()
            .with_context(|| format!("{label} must be a whole number."))
    }

    fn date(&self, index: usize) -> Result<Option<NaiveDate>> {
        let label = self.fields[index].label;
        let raw = self.text(index)?;
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Some)
            .with_context(|| format!("{label} must look like YYYY-MM-DD."))
    }

    fn required_date(&self, index: usize) -> Result<NaiveDate> {
        let label = self.fields[index].label;
        self.date(index)?
            .ok_or_else(|| anyhow!("{label} is required."))
    }

    /// Render one field line, highlighting the focused one.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let Some(field) = self.fields.get(index) else {
            return Line::from("");
        };
        let is_active = index == self.active;

        let display = if field.value.is_empty() {
            if field.required {
                "<required>".to_string()
            } else {
                "<optional>".to_string()
            }
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{:>16}: ", field.label)),
            Span::styled(display, style),
        ])
    }

    /// Cursor column offset inside the focused line.
    pub(crate) fn cursor_offset(&self) -> usize {
        let value_len = self
            .fields
            .get(self.active)
            .map(|field| field.value.chars().count())
            .unwrap_or(0);
        16 + 2 + value_len
    }
}

fn date_text(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

const BOOK_TITLE: usize = 0;
const BOOK_AUTHOR: usize = 1;
const BOOK_ISBN: usize = 2;
const BOOK_PUBLISHER: usize = 3;
const BOOK_PAGES: usize = 4;
const BOOK_PUBLISHED: usize = 5;
const BOOK_COPIES: usize = 6;

pub(crate) fn book_form(book: Option<&Book>) -> Form {
    let draft = book.map(BookDraft::from_book);
    let text = |pick: fn(&BookDraft) -> String| draft.as_ref().map(pick).unwrap_or_default();
    Form::new(vec![
        FormField::new("Title", FieldKind::Text, true, text(|d| d.title.clone())),
        FormField::new("Author", FieldKind::Text, false, text(|d| d.author.clone())),
        FormField::new("ISBN", FieldKind::Text, true, text(|d| d.isbn.clone())),
        FormField::new("Publisher", FieldKind::Text, false, text(|d| d.publisher.clone())),
        FormField::new("Pages", FieldKind::Digits, false, text(|d| d.page_count.to_string())),
        FormField::new(
            "Published",
            FieldKind::Date,
            false,
            text(|d| date_text(d.publication_date)),
        ),
        FormField::new(
            "Copies",
            FieldKind::Digits,
            true,
            draft
                .as_ref()
                .map(|d| d.total_copies.to_string())
                .unwrap_or_else(|| "1".to_string()),
        ),
    ])
}

pub(crate) fn parse_book(form: &Form) -> Result<BookDraft> {
    let total_copies = form.number(BOOK_COPIES)?;
    if total_copies < 1 {
        return Err(anyhow!("Copies must be at least 1."));
    }
    Ok(BookDraft {
        title: form.text(BOOK_TITLE)?,
        author: form.text(BOOK_AUTHOR)?,
        isbn: form.text(BOOK_ISBN)?,
        publisher: form.text(BOOK_PUBLISHER)?,
        page_count: form.number(BOOK_PAGES)?,
        publication_date: form.date(BOOK_PUBLISHED)?,
        total_copies,
    })
}

const READER_NAME: usize = 0;
const READER_EMAIL: usize = 1;
const READER_PHONE: usize = 2;
const READER_ADDRESS: usize = 3;

pub(crate) fn reader_form(reader: Option<&Reader>) -> Form {
    let draft = reader.map(ReaderDraft::from_reader);
    let text = |pick: fn(&ReaderDraft) -> String| draft.as_ref().map(pick).unwrap_or_default();
    Form::new(vec![
        FormField::new("Full name", FieldKind::Text, true, text(|d| d.full_name.clone())),
        FormField::new("Email", FieldKind::Text, false, text(|d| d.email.clone())),
        FormField::new("Phone", FieldKind::Text, false, text(|d| d.phone.clone())),
        FormField::new("Address", FieldKind::Text, false, text(|d| d.address.clone())),
    ])
}

pub(crate) fn parse_reader(form: &Form) -> Result<ReaderDraft> {
    let email = form.text(READER_EMAIL)?;
    if !email.is_empty() && !email.contains('@') {
        return Err(anyhow!("Email must contain '@'."));
    }
    Ok(ReaderDraft {
        full_name: form.text(READER_NAME)?,
        email,
        phone: form.text(READER_PHONE)?,
        address: form.text(READER_ADDRESS)?,
    })
}

const LOAN_BOOK: usize = 0;
const LOAN_READER: usize = 1;
const LOAN_FROM: usize = 2;
const LOAN_DUE: usize = 3;

/// Loan form. A new loan starts today and is due after the default period.
pub(crate) fn loan_form(record: Option<&BorrowRecord>, today: NaiveDate) -> Form {
    let draft = record.map(BorrowDraft::from_record).unwrap_or(BorrowDraft {
        book_id: 0,
        reader_id: 0,
        borrow_date: today,
        due_date: today
            .checked_add_days(Days::new(LOAN_PERIOD_DAYS))
            .unwrap_or(today),
    });
    let id_text = |id: i64| if id > 0 { id.to_string() } else { String::new() };
    Form::new(vec![
        FormField::new("Book ID", FieldKind::Digits, true, id_text(draft.book_id)),
        FormField::new("Reader ID", FieldKind::Digits, true, id_text(draft.reader_id)),
        FormField::new(
            "Borrowed on",
            FieldKind::Date,
            true,
            date_text(Some(draft.borrow_date)),
        ),
        FormField::new("Due on", FieldKind::Date, true, date_text(Some(draft.due_date))),
    ])
}

pub(crate) fn parse_loan(form: &Form) -> Result<BorrowDraft> {
    Ok(BorrowDraft {
        book_id: form.number(LOAN_BOOK)?,
        reader_id: form.number(LOAN_READER)?,
        borrow_date: form.required_date(LOAN_FROM)?,
        due_date: form.required_date(LOAN_DUE)?,
    })
}

/// Pending deletion awaiting a yes/no answer.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) id: i64,
    pub(crate) label: String,
}
