use std::mem;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
    Wrap,
};
use ratatui::Frame;

use crate::db::Database;
use crate::events::EventBus;
use crate::facade::{BookFacade, BorrowLedger, Facade, ReaderFacade};
use crate::models::Record;
use crate::views::{Dashboard, Reports, StatusKind, StatusMessage, TablePanel};

use super::forms::{self, ConfirmDelete, Form};
use super::helpers::{centered_rect, TableRow};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const SIDEBAR_WIDTH: u16 = 18;
/// Rows skipped by PageUp / PageDown.
const PAGE_STEP: isize = 10;

/// Pages reachable from the sidebar, in sidebar order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Page {
    Dashboard,
    Books,
    Readers,
    Borrowing,
    Reports,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Books,
        Page::Readers,
        Page::Borrowing,
        Page::Reports,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Books => "Books",
            Page::Readers => "Readers",
            Page::Borrowing => "Borrowing",
            Page::Reports => "Reports",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|page| *page == self).unwrap_or(0)
    }

    fn next(self) -> Page {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Page {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// `'1'` through `'5'` jump straight to a page.
    fn from_key(ch: char) -> Option<Page> {
        let digit = ch.to_digit(10)? as usize;
        Self::ALL.get(digit.checked_sub(1)?).copied()
    }
}

/// Which record a form creates or edits.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum FormTarget {
    Book(Option<i64>),
    Reader(Option<i64>),
    Loan(Option<i64>),
}

impl FormTarget {
    fn title(self) -> &'static str {
        match self {
            FormTarget::Book(None) => "Add Book",
            FormTarget::Book(Some(_)) => "Edit Book",
            FormTarget::Reader(None) => "Add Reader",
            FormTarget::Reader(Some(_)) => "Edit Reader",
            FormTarget::Loan(None) => "Lend Book",
            FormTarget::Loan(Some(_)) => "Edit Loan",
        }
    }
}

/// Fine-grained modes scoped to the current page.
enum Mode {
    Normal,
    Searching { query: String },
    Editing { target: FormTarget, form: Form },
    ConfirmDelete(ConfirmDelete),
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// What the shell needs from a table page, whatever entity it lists.
trait ListPage {
    fn move_selection(&self, offset: isize);
    fn select_first(&self);
    fn select_last(&self);
    fn filter(&self) -> String;
    /// Re-query with a new filter; a failure comes back as a notice.
    fn apply_filter(&self, text: &str) -> Option<StatusMessage>;
    fn confirm_delete(&self) -> Result<ConfirmDelete, StatusMessage>;
    fn delete(&self, id: i64) -> StatusMessage;
    fn draw(&self, frame: &mut Frame, area: Rect, title: &str, today: NaiveDate);
}

impl<F> ListPage for TablePanel<F>
where
    F: Facade,
    F::Entity: TableRow,
{
    fn move_selection(&self, offset: isize) {
        TablePanel::move_selection(self, offset);
    }

    fn select_first(&self) {
        TablePanel::select_first(self);
    }

    fn select_last(&self) {
        TablePanel::select_last(self);
    }

    fn filter(&self) -> String {
        TablePanel::filter(self)
    }

    fn apply_filter(&self, text: &str) -> Option<StatusMessage> {
        self.set_filter(text)
            .err()
            .map(|err| StatusMessage::error(format!("Search failed: {err}")))
    }

    fn confirm_delete(&self) -> Result<ConfirmDelete, StatusMessage> {
        let row = self
            .selected()
            .ok_or_else(|| StatusMessage::warning(format!("Select a {} to delete.", F::ENTITY)))?;
        Ok(ConfirmDelete {
            id: row.id(),
            label: row.label(),
        })
    }

    fn delete(&self, id: i64) -> StatusMessage {
        TablePanel::delete(self, id)
    }

    fn draw(&self, frame: &mut Frame, area: Rect, title: &str, today: NaiveDate) {
        let snapshot = self.snapshot();

        let mut heading = format!("{title} ({})", snapshot.rows.len());
        if !snapshot.filter.is_empty() {
            heading.push_str(&format!(" | filter: {}", snapshot.filter));
        }
        let mut block = Block::default().borders(Borders::ALL).title(heading);
        if let Some(error) = &snapshot.last_error {
            block = block.title_bottom(Line::from(Span::styled(
                format!(" {error} "),
                Style::default().fg(Color::Red),
            )));
        }

        let header = Row::new(F::Entity::HEADERS.iter().map(|label| Cell::from(*label))).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let rows = snapshot
            .rows
            .iter()
            .map(|row| Row::new(row.cells()).style(row.style(today)));

        let table = Table::new(rows, F::Entity::widths())
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(snapshot.selected);
        frame.render_stateful_widget(table, area, &mut state);
    }
}

/// Central application state shared across the TUI.
pub struct App {
    books: TablePanel<BookFacade>,
    readers: TablePanel<ReaderFacade>,
    loans: TablePanel<BorrowLedger>,
    dashboard: Dashboard,
    reports: Reports,
    page: Page,
    mode: Mode,
    status: Option<StatusMessage>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl App {
    /// Wire every view to `bus` over the shared store and open the dashboard.
    pub fn new(db: Arc<Database>, bus: &EventBus, report_limit: usize) -> Self {
        let book_facade = Arc::new(BookFacade::new(Arc::clone(&db)));
        let reader_facade = Arc::new(ReaderFacade::new(Arc::clone(&db)));
        let ledger = Arc::new(BorrowLedger::new(db));

        let dashboard = Dashboard::new(
            bus,
            Arc::clone(&book_facade),
            Arc::clone(&reader_facade),
            Arc::clone(&ledger),
        );
        let reports = Reports::new(bus, Arc::clone(&ledger), report_limit);

        let mut app = Self {
            books: TablePanel::new(book_facade, bus.clone()),
            readers: TablePanel::new(reader_facade, bus.clone()),
            loans: TablePanel::new(ledger, bus.clone()),
            dashboard,
            reports,
            page: Page::Dashboard,
            mode: Mode::Normal,
            status: None,
        };
        app.show_page(Page::Dashboard);
        app
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Switch pages. Leaving the dashboard or reports stops their live
    /// recomputation; showing one recomputes it before the next frame.
    pub fn show_page(&mut self, page: Page) {
        match self.page {
            Page::Dashboard => self.dashboard.deactivate(),
            Page::Reports => self.reports.deactivate(),
            _ => {}
        }
        self.page = page;

        let refreshed = match page {
            Page::Dashboard => self.dashboard.activate(),
            Page::Reports => self.reports.activate(),
            _ => Ok(()),
        };
        if let Err(err) = refreshed {
            self.set_status(StatusMessage::error(format!(
                "Failed to refresh {}: {err}",
                page.title()
            )));
        }
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching { query } => self.handle_search(code, query),
            Mode::Editing { target, form } => self.handle_form(code, target, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };
        exit
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        if let KeyCode::Char(ch) = code {
            if let Some(page) = Page::from_key(ch) {
                self.show_page(page);
                return Mode::Normal;
            }
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Tab => self.show_page(self.page.next()),
            KeyCode::BackTab => self.show_page(self.page.previous()),
            KeyCode::Char('r') if self.page == Page::Reports => self.refresh_reports(),
            KeyCode::Char('r') if self.page == Page::Borrowing => self.return_selected(),
            _ => return self.handle_list_key(code),
        }
        Mode::Normal
    }

    fn handle_list_key(&mut self, code: KeyCode) -> Mode {
        let Some(list) = self.active_list() else {
            return Mode::Normal;
        };

        let outcome = match code {
            KeyCode::Up => {
                list.move_selection(-1);
                Ok(Mode::Normal)
            }
            KeyCode::Down => {
                list.move_selection(1);
                Ok(Mode::Normal)
            }
            KeyCode::PageUp => {
                list.move_selection(-PAGE_STEP);
                Ok(Mode::Normal)
            }
            KeyCode::PageDown => {
                list.move_selection(PAGE_STEP);
                Ok(Mode::Normal)
            }
            KeyCode::Home => {
                list.select_first();
                Ok(Mode::Normal)
            }
            KeyCode::End => {
                list.select_last();
                Ok(Mode::Normal)
            }
            KeyCode::Char('f') | KeyCode::Char('/') => Ok(Mode::Searching {
                query: list.filter(),
            }),
            KeyCode::Char('-') => list.confirm_delete().map(Mode::ConfirmDelete),
            KeyCode::Char('+') => Ok(self.new_form()),
            KeyCode::Char('e') => self.edit_form(),
            _ => Ok(Mode::Normal),
        };

        match outcome {
            Ok(mode) => mode,
            Err(message) => {
                self.set_status(message);
                Mode::Normal
            }
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut query: String) -> Mode {
        match code {
            KeyCode::Esc => {
                query.clear();
                self.apply_filter(&query);
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => self.move_list(-1),
            KeyCode::Down => self.move_list(1),
            KeyCode::Backspace => {
                query.pop();
                self.apply_filter(&query);
            }
            KeyCode::Char(ch) => {
                query.push(ch);
                self.apply_filter(&query);
            }
            _ => {}
        }
        Mode::Searching { query }
    }

    fn handle_form(&mut self, code: KeyCode, target: FormTarget, mut form: Form) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status(StatusMessage::info(format!("{} cancelled.", target.title())));
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.submit(target, &form) {
                Ok(message) if message.is_error() => {
                    form.error = Some(message.text.clone());
                    self.set_status(message);
                }
                Ok(message) => {
                    self.set_status(message);
                    return Mode::Normal;
                }
                Err(err) => {
                    let message = err.to_string();
                    form.error = Some(message.clone());
                    self.set_status(StatusMessage::warning(message));
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::Editing { target, form }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(message) = self.active_list().map(|list| list.delete(confirm.id)) {
                    self.set_status(message);
                }
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status(StatusMessage::info("Delete cancelled."));
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    /// Validation problems come back as `Err`; store outcomes as a notice.
    fn submit(&self, target: FormTarget, form: &Form) -> anyhow::Result<StatusMessage> {
        let message = match target {
            FormTarget::Book(None) => self.books.create(&forms::parse_book(form)?),
            FormTarget::Book(Some(id)) => self.books.update(id, &forms::parse_book(form)?),
            FormTarget::Reader(None) => self.readers.create(&forms::parse_reader(form)?),
            FormTarget::Reader(Some(id)) => self.readers.update(id, &forms::parse_reader(form)?),
            FormTarget::Loan(None) => self.loans.create(&forms::parse_loan(form)?),
            FormTarget::Loan(Some(id)) => self.loans.update(id, &forms::parse_loan(form)?),
        };
        Ok(message)
    }

    fn new_form(&self) -> Mode {
        let (target, form) = match self.page {
            Page::Books => (FormTarget::Book(None), forms::book_form(None)),
            Page::Readers => (FormTarget::Reader(None), forms::reader_form(None)),
            Page::Borrowing => (FormTarget::Loan(None), forms::loan_form(None, today())),
            Page::Dashboard | Page::Reports => return Mode::Normal,
        };
        Mode::Editing { target, form }
    }

    fn edit_form(&self) -> Result<Mode, StatusMessage> {
        let (target, form) = match self.page {
            Page::Books => {
                let book = self.books.selected_for_edit()?;
                (FormTarget::Book(Some(book.id)), forms::book_form(Some(&book)))
            }
            Page::Readers => {
                let reader = self.readers.selected_for_edit()?;
                (
                    FormTarget::Reader(Some(reader.id)),
                    forms::reader_form(Some(&reader)),
                )
            }
            Page::Borrowing => {
                let record = self.loans.selected_for_edit()?;
                (
                    FormTarget::Loan(Some(record.id)),
                    forms::loan_form(Some(&record), today()),
                )
            }
            Page::Dashboard | Page::Reports => return Ok(Mode::Normal),
        };
        Ok(Mode::Editing { target, form })
    }

    fn return_selected(&mut self) {
        let message = match self.loans.selected() {
            None => StatusMessage::warning("Select a loan to return."),
            Some(record) if record.return_date.is_some() => {
                StatusMessage::warning(format!("Loan #{} was already returned.", record.id))
            }
            Some(record) => {
                let returned = self
                    .loans
                    .mutate("return loan", |ledger| ledger.return_book(record.id, today()));
                match returned {
                    Ok(()) => StatusMessage::info(format!("Returned \"{}\".", record.book_title)),
                    Err(message) => message,
                }
            }
        };
        self.set_status(message);
    }

    fn refresh_reports(&mut self) {
        let message = match self.reports.refresh() {
            Ok(()) => StatusMessage::info("Report refreshed."),
            Err(err) => StatusMessage::error(format!("Failed to refresh report: {err}")),
        };
        self.set_status(message);
    }

    fn active_list(&self) -> Option<&dyn ListPage> {
        match self.page {
            Page::Books => Some(&self.books),
            Page::Readers => Some(&self.readers),
            Page::Borrowing => Some(&self.loans),
            Page::Dashboard | Page::Reports => None,
        }
    }

    fn move_list(&self, offset: isize) {
        if let Some(list) = self.active_list() {
            list.move_selection(offset);
        }
    }

    fn apply_filter(&mut self, query: &str) {
        if let Some(message) = self.active_list().and_then(|list| list.apply_filter(query)) {
            self.set_status(message);
        }
    }

    fn set_status(&mut self, message: StatusMessage) {
        self.status = Some(message);
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(content_area);
        let main_area = columns[1];

        self.draw_sidebar(frame, columns[0]);
        match self.page {
            Page::Dashboard => self.draw_dashboard(frame, main_area),
            Page::Reports => self.draw_reports(frame, main_area),
            page => {
                if let Some(list) = self.active_list() {
                    list.draw(frame, main_area, page.title(), today());
                }
            }
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Editing { target, form } => self.draw_form(frame, area, *target, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching { query } => self.draw_search_bar(frame, main_area, query),
            Mode::Normal => {}
        }
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = Page::ALL
            .iter()
            .enumerate()
            .map(|(idx, page)| ListItem::new(format!("{} {}", idx + 1, page.title())))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Library"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.page.index()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(area);
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(rows[0]);

        let stats = self.dashboard.stats();
        let metrics = [
            ("Books", stats.books),
            ("Readers", stats.readers),
            ("On loan", stats.borrowing),
        ];
        for ((title, value), card) in metrics.into_iter().zip(cards.iter()) {
            let paragraph = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    value.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
            ])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(paragraph, *card);
        }

        if let Some(error) = self.dashboard.last_error() {
            let paragraph = Paragraph::new(Span::styled(error, StatusKind::Error.style()))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, rows[1]);
        }
    }

    fn draw_reports(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = self.reports.lines().into_iter().map(Line::from).collect();
        if let Some(error) = self.reports.last_error() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(error, StatusKind::Error.style())));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Reports"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut keys: Vec<(&str, &str)> = match (&self.mode, self.page) {
            (Mode::Searching { .. }, _) => vec![("[Enter]", "Keep filter"), ("[Esc]", "Clear")],
            (Mode::Editing { .. }, _) => vec![
                ("[Tab]", "Next field"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (Mode::ConfirmDelete(_), _) => vec![("[Y]", "Delete"), ("[N]", "Cancel")],
            (Mode::Normal, Page::Dashboard) => vec![],
            (Mode::Normal, Page::Reports) => vec![("[r]", "Refresh")],
            (Mode::Normal, page) => {
                let mut keys = vec![
                    ("[↑↓]", "Select"),
                    ("[f]", "Search"),
                    ("[+]", "Add"),
                    ("[e]", "Edit"),
                    ("[-]", "Delete"),
                ];
                if page == Page::Borrowing {
                    keys.push(("[r]", "Return"));
                }
                keys
            }
        };
        if matches!(self.mode, Mode::Normal) {
            keys.push(("[1-5]", "Pages"));
            keys.push(("[q]", "Quit"));
        }

        let spans = keys
            .into_iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(format!(" {label}   ")),
                ]
            })
            .collect::<Vec<_>>();
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, query: &str) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {query}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, target: FormTarget, form: &Form) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(target.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|idx| form.build_line(idx))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch field • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        let cursor_x = inner.x + form.cursor_offset() as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![Line::from(format!("Delete {}?", confirm.label))];
        if self.page != Page::Borrowing {
            lines.push(Line::from("Records with loan history cannot be deleted."));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}
